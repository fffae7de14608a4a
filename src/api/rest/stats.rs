use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::stats::{self, DailyStats};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats/daily", get(daily))
}

#[derive(Deserialize)]
pub struct DailyQuery {
    pub day: Option<NaiveDate>,
}

async fn daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Json<DailyStats> {
    let stats = match query.day {
        Some(day) => stats::daily_stats(&state, day),
        None => stats::today(&state),
    };
    Json(stats)
}
