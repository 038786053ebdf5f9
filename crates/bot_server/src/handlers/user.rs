use actix_web::{web, HttpResponse, Responder};

use bot_core::StoreError;

use crate::state::AppState;

pub async fn handler(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();
    match state.store.get_user(id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(StoreError::UserNotFound(_)) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("user {} not found", id),
        })),
        Err(err) => {
            log::error!("lookup for user {} failed: {}", id, err);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "storage failure",
            }))
        }
    }
}
