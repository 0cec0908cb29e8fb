pub mod image;
pub mod user;

pub use image::*;
pub use user::*;
