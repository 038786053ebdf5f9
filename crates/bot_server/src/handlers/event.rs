use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use bot_core::{StoreError, UserEvent};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub user_id: i64,
    pub username: Option<String>,
    /// Command or callback name, e.g. "/start" or "revoke_confirm".
    pub event: String,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub accepted: bool,
    pub state: String,
    pub reply: String,
    pub private_mode: bool,
    pub shuffle_mode: bool,
}

pub async fn handler(state: web::Data<AppState>, req: web::Json<EventRequest>) -> impl Responder {
    let event: UserEvent = match req.event.parse() {
        Ok(event) => event,
        Err(err) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": err.to_string(),
            }));
        }
    };

    let username = req.username.as_deref().unwrap_or("");
    let outcome = match state.dispatcher.dispatch(req.user_id, username, event).await {
        Ok(outcome) => outcome,
        Err(StoreError::UserNotFound(id)) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("user {} not found", id),
            }));
        }
        Err(err) => {
            log::error!("event {} for user {} failed: {}", event, req.user_id, err);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "storage failure",
            }));
        }
    };

    let reply = if outcome.accepted {
        outcome.status.clone()
    } else {
        "That action is not available right now".to_string()
    };

    HttpResponse::Ok().json(EventResponse {
        accepted: outcome.accepted,
        state: outcome.state,
        reply,
        private_mode: outcome.private_mode,
        shuffle_mode: outcome.shuffle_mode,
    })
}
