use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use stockforge_core::MovementId;
use stockforge_ledger::{MovementFilter, MovementUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(query_movements).post(record_movement))
        .route(
            "/:id",
            get(get_movement).patch(amend_movement).delete(retract_movement),
        )
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    let movement = body.into_movement(Utc::now());
    match services.run(move |wh| wh.record_movement(movement)).await {
        Ok(movement) => (StatusCode::CREATED, Json(movement)).into_response(),
        Err(resp) => resp,
    }
}

/// Movements matching the query string, in recording order.
pub async fn query_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<MovementFilter>,
) -> axum::response::Response {
    match services.run(move |wh| wh.movements(&filter)).await {
        Ok(movements) => Json(movements).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<MovementId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.movement(id)).await {
        Ok(movement) => Json(movement).into_response(),
        Err(resp) => resp,
    }
}

pub async fn amend_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(update): Json<MovementUpdate>,
) -> axum::response::Response {
    let id = match errors::parse_id::<MovementId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.amend_movement(id, update)).await {
        Ok(movement) => Json(movement).into_response(),
        Err(resp) => resp,
    }
}

pub async fn retract_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<MovementId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.retract_movement(id)).await {
        Ok(movement) => Json(movement).into_response(),
        Err(resp) => resp,
    }
}
