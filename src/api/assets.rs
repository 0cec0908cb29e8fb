use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::web;
use std::path::{Path, PathBuf};

use crate::services::UPLOADS_URL_PREFIX;

/// Serves uploaded images and the single-page app.
///
/// Must be registered after every other service: the SPA mount at `/`
/// answers any unmatched GET with `index.html`.
pub fn configure(cfg: &mut web::ServiceConfig, static_dir: &Path, upload_dir: &Path) {
    let index: PathBuf = static_dir.join("index.html");

    cfg.service(Files::new(UPLOADS_URL_PREFIX, upload_dir))
        .service(
            Files::new("/", static_dir)
                .index_file("index.html")
                .default_handler(fn_service(move |req: ServiceRequest| {
                    let index = index.clone();
                    async move {
                        let (req, _) = req.into_parts();
                        let file = NamedFile::open_async(&index).await?;
                        let res = file.into_response(&req);
                        Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
                    }
                })),
        );
}
