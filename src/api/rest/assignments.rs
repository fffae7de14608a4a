use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::dispatch;
use crate::error::AppError;
use crate::models::assignment::{Assignment, AssignmentStatus, ChatSender};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assignments/:id", get(get_assignment))
        .route("/assignments/:id/accept", post(accept))
        .route("/assignments/:id/cancel", post(cancel))
        .route("/assignments/:id/status", patch(update_status))
        .route("/assignments/:id/messages", post(post_message))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AssignmentStatus,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub sender: ChatSender,
    pub text: String,
}

async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(dispatch::get(&state, id)?))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(dispatch::accept(&state, id).await?))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(dispatch::cancel(&state, id)?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(dispatch::update_status(&state, id, payload.status)?))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(dispatch::post_message(
        &state,
        id,
        payload.sender,
        &payload.text,
    )?))
}
