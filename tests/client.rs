use actix_web::{web, App, HttpResponse, HttpServer};
use std::path::PathBuf;
use std::sync::Arc;

use gallery_service::client::{ClientError, GalleryClient, HttpGalleryApi, ImageFile};
use gallery_service::database::MemoryStore;
use gallery_service::services::{AuthTokens, CredentialsService, ImageService, UploadSettings};
use gallery_service::AppServices;

/// Binds an ephemeral port and runs the server in the background.
macro_rules! serve {
    ($factory:expr) => {{
        let server = HttpServer::new($factory)
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}", addr), handle)
    }};
}

struct UploadDir(PathBuf);

impl UploadDir {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("gallery-client-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }
}

impl Drop for UploadDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn services(upload_dir: &UploadDir) -> AppServices {
    let store = Arc::new(MemoryStore::new());
    AppServices::new(
        CredentialsService::with_cost(store.clone(), 4),
        ImageService::new(store.clone(), store),
        AuthTokens::new("client-test-secret"),
        UploadSettings::new(upload_dir.0.clone()),
    )
}

fn image_file(file_name: &str, content_type: &str) -> ImageFile {
    ImageFile {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        bytes: b"\x89PNG\r\n\x1a\nfake-image-data".to_vec(),
    }
}

fn rejected(status: u16, message: &str) -> ClientError {
    ClientError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[actix_web::test]
async fn test_client_against_live_server() {
    let upload_dir = UploadDir::new();
    let services = services(&upload_dir);
    let (base_url, handle) = serve!(move || {
        let services = services.clone();
        App::new().configure(move |cfg| services.configure(cfg))
    });

    let alice = GalleryClient::new(HttpGalleryApi::new(base_url.clone()));
    let bob = GalleryClient::new(HttpGalleryApi::new(base_url.clone()));
    let intruder = GalleryClient::new(HttpGalleryApi::new(base_url.clone()));

    alice.register("alice", "secret1").await.unwrap();
    assert!(alice.is_authenticated());
    assert_eq!(
        intruder.register("alice", "other").await.unwrap_err(),
        rejected(409, "Username already taken")
    );
    assert_eq!(
        intruder.login("alice", "wrong").await.unwrap_err(),
        rejected(401, "Incorrect username or password")
    );

    // Multipart upload through reqwest
    let created = alice
        .upload(Some(image_file("sunset.png", "image/png")), "Sunset")
        .await
        .unwrap();
    assert_eq!(created.name, "Sunset");
    assert_eq!(created.author.username, "alice");
    assert!(created.src.starts_with("/uploads/"));

    assert_eq!(
        alice
            .upload(Some(image_file("anim.gif", "image/gif")), "Anim")
            .await
            .unwrap_err(),
        rejected(400, "Unsupported image type")
    );

    bob.register("bob", "secret1").await.unwrap();
    assert!(bob.search(Some("sun")).await);
    assert_eq!(bob.gallery().images, vec![created.clone()]);

    let err = bob.rename_image(&created.id, "Mine now").await.unwrap_err();
    assert_eq!(err, rejected(403, "You can only edit your own images"));
    assert_eq!(bob.gallery().images[0].name, "Sunset");

    assert!(alice.refresh().await);
    alice.rename_image(&created.id, "Sunset over bay").await.unwrap();
    assert_eq!(alice.gallery().images[0].name, "Sunset over bay");

    assert!(bob.refresh().await);
    assert_eq!(bob.gallery().images[0].name, "Sunset over bay");

    // Without a token the list is refused and the state degrades to an error
    assert!(intruder.refresh().await);
    assert_eq!(intruder.gallery().error.as_deref(), Some("Missing authorization token"));

    handle.stop(true).await;
}

async fn plain_text_failure() -> HttpResponse {
    HttpResponse::InternalServerError().body("upstream exploded")
}

#[actix_web::test]
async fn test_non_json_errors_use_fallback_messages() {
    let (base_url, handle) = serve!(|| {
        App::new()
            .route("/auth/login", web::post().to(plain_text_failure))
            .route("/api/images", web::get().to(plain_text_failure))
            .route("/api/images", web::post().to(plain_text_failure))
            .route("/api/images/{id}", web::patch().to(plain_text_failure))
    });

    let client = GalleryClient::new(HttpGalleryApi::new(base_url));

    assert_eq!(
        client.login("alice", "secret1").await.unwrap_err(),
        rejected(500, "Authentication failed")
    );

    assert!(client.refresh().await);
    assert_eq!(client.gallery().error.as_deref(), Some("Failed to load images."));

    assert_eq!(
        client.rename_image("abc", "New").await.unwrap_err(),
        rejected(500, "Failed to update name.")
    );

    assert_eq!(
        client
            .upload(Some(image_file("a.png", "image/png")), "A")
            .await
            .unwrap_err(),
        rejected(500, "Upload failed")
    );

    handle.stop(true).await;
}
