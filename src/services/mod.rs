pub mod auth_service;
pub mod credentials_service;
pub mod image_service;
pub mod upload_service;

pub use auth_service::*;
pub use credentials_service::*;
pub use image_service::*;
pub use upload_service::*;
