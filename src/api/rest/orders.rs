use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::engine::dispatch;
use crate::error::AppError;
use crate::models::assignment::Assignment;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:order_id/dispatch", post(dispatch_order))
        .route("/orders/:order_id/assignments", get(order_assignments))
}

async fn dispatch_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    Ok(Json(dispatch::assign(&state, order_id).await?))
}

async fn order_assignments(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Json<Vec<Assignment>> {
    Json(dispatch::for_order(&state, order_id))
}
