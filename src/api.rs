use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    clients::{rbmq, store::MessageStore},
    config::Config,
    models::{
        notification::NotificationRequest,
        response::{ErrorResponse, StatusResponse, UserMessagesResponse},
    },
};

pub struct AppState {
    pub config: Config,
    pub store: MessageStore,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/notify", post(submit_notification))
        .route("/notifications/{user_id}", get(list_notifications))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: Config) -> Result<(), Error> {
    let store = MessageStore::connect(&config.database_url).await?;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = Arc::new(AppState { config, store });
    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Validates a submission and enqueues it for the worker. Invalid requests
/// are answered in-band and never enqueued; the caller is not told whether
/// delivery ultimately succeeds.
async fn submit_notification(
    State(state): State<Arc<AppState>>,
    Json(notification): Json<NotificationRequest>,
) -> Response {
    if let Err(e) = notification.validate() {
        return Json(ErrorResponse::new(e.to_string())).into_response();
    }

    match rbmq::publish(&state.config, &notification).await {
        Ok(()) => Json(StatusResponse::new("Notification queued.")).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to enqueue notification");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to queue notification.")),
            )
                .into_response()
        }
    }
}

/// Read endpoint over the store. A failed read yields an empty list rather
/// than an error.
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<UserMessagesResponse> {
    let messages = match state.store.list_by_user(&user_id).await {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "Store read failed, returning no messages");
            Vec::new()
        }
    };

    Json(UserMessagesResponse { user_id, messages })
}

/// Liveness probe: static, no dependency checks.
async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}
