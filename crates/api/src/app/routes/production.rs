use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stockforge_core::{DomainResult, ProductionOrderId};
use stockforge_production::{OrderFilter, ProductionOrderDraft};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(submit_order))
        .route("/:id", get(get_order))
        .route("/:id/advance", post(advance_order))
        .route("/:id/cancel", post(cancel_order))
}

/// Explode the composition server-side, apply the client's selections and submit.
pub async fn submit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitOrderRequest>,
) -> axum::response::Response {
    let occurred_at = body.occurred_at.unwrap_or_else(Utc::now);
    let result = services
        .run(move |wh| {
            let draft = wh.read(|s| -> DomainResult<ProductionOrderDraft> {
                let composition = s.compositions.require(&body.composition_id)?;
                ProductionOrderDraft::for_composition(
                    &s.products,
                    composition,
                    body.multiplier,
                    body.exit_type,
                    body.project_code.as_str(),
                    body.collaborator.as_str(),
                    occurred_at,
                )
            })??;
            wh.submit_order(body.apply(draft))
        })
        .await;

    match result {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<OrderFilter>,
) -> axum::response::Response {
    match services.run(move |wh| wh.orders(&filter)).await {
        Ok(orders) => Json(orders).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductionOrderId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.order(id)).await {
        Ok(order) => Json(order).into_response(),
        Err(resp) => resp,
    }
}

pub async fn advance_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdvanceOrderRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductionOrderId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let at = body.occurred_at.unwrap_or_else(Utc::now);
    match services
        .run(move |wh| wh.advance_order(id, body.status, at))
        .await
    {
        Ok(order) => Json(order).into_response(),
        Err(resp) => resp,
    }
}

/// Return every processed component to stock. Cancelling twice answers the same order.
pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CancelOrderRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductionOrderId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let at = body.occurred_at.unwrap_or_else(Utc::now);
    match services
        .run(move |wh| wh.cancel_order(id, &body.collaborator, at))
        .await
    {
        Ok(order) => Json(order).into_response(),
        Err(resp) => resp,
    }
}

/// Project the demand of several compositions against current stock. Nothing is written.
pub async fn simulate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SimulationRequest>,
) -> axum::response::Response {
    match services.run(move |wh| wh.simulate(&body.demands)).await {
        Ok(lines) => Json(lines).into_response(),
        Err(resp) => resp,
    }
}
