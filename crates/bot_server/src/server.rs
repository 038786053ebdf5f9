use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::io;
use std::path::PathBuf;

use crate::handlers;
use crate::state::{AppState, StorageBackend};

pub async fn run_server(
    port: u16,
    backend: StorageBackend,
    data_dir: Option<PathBuf>,
) -> io::Result<()> {
    let state = AppState::new(backend, data_dir)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .service(
                web::scope("/api/v1")
                    .route("/event", web::post().to(handlers::event::handler))
                    .route("/users/{id}", web::get().to(handlers::user::handler))
                    .route("/health", web::get().to(handlers::health::handler)),
            )
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
