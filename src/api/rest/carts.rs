use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::cart::{self, LineRequest};
use crate::error::AppError;
use crate::models::cart::Cart;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/carts/:customer_id", get(get_cart).delete(delete_cart))
        .route("/carts/:customer_id/lines", post(add_lines))
        .route("/carts/:customer_id/lines/:item_id", delete(remove_line))
        .route("/admin/carts", get(list_carts))
        .route("/admin/carts/:cart_id", delete(delete_cart_by_id))
}

#[derive(Deserialize)]
pub struct AddLinesRequest {
    #[serde(default)]
    pub lines: Vec<LineRequest>,
    #[serde(default)]
    pub coupon_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct RemoveLineQuery {
    pub option_id: Option<Uuid>,
}

async fn add_lines(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AddLinesRequest>,
) -> Result<Json<Cart>, AppError> {
    if payload.lines.is_empty() && payload.coupon_id.is_none() {
        return Err(AppError::InvalidInput(
            "provide at least one line or a coupon".to_string(),
        ));
    }

    let cart =
        cart::add_or_update_lines(&state, customer_id, payload.lines, payload.coupon_id).await?;
    Ok(Json(cart))
}

async fn remove_line(
    State(state): State<Arc<AppState>>,
    Path((customer_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<RemoveLineQuery>,
) -> Result<Json<Cart>, AppError> {
    let cart = cart::remove_line(&state, customer_id, item_id, query.option_id).await?;
    Ok(Json(cart))
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(cart::get(&state, customer_id)?))
}

async fn delete_cart(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(cart::delete_by_customer(&state, customer_id).await?))
}

async fn list_carts(State(state): State<Arc<AppState>>) -> Json<Vec<Cart>> {
    Json(cart::list_all(&state))
}

async fn delete_cart_by_id(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(cart::delete_by_id(&state, cart_id).await?))
}
