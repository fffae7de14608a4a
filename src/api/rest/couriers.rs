use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::dispatch::{self, Tracking};
use crate::error::AppError;
use crate::geo::Coordinate;
use crate::models::assignment::{Assignment, AssignmentStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers/:id/location", patch(update_courier_location))
        .route("/couriers/:id/assignments", get(courier_assignments))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: Coordinate,
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
}

async fn update_courier_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Tracking>, AppError> {
    let tracking =
        dispatch::update_courier_position_and_track(&state, id, payload.location, payload.status)
            .await?;
    Ok(Json(tracking))
}

async fn courier_assignments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Assignment>> {
    Json(dispatch::for_courier(&state, id))
}
