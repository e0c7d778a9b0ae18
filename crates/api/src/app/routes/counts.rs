use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stockforge_core::InventoryCountId;
use stockforge_counting::InventoryCount;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_counts).post(create_count))
        .route("/suggestions", get(suggest_counts))
        .route("/:id", get(get_count))
        .route("/:id/start", post(start_count))
        .route("/:id/items", post(record_count))
        .route("/:id/finalize", post(finalize_count))
        .route("/:id/annotations", post(annotate_count))
        .route("/:id/adjustments", post(apply_adjustments))
        .route("/:id/cancel", post(cancel_count))
}

fn respond(status: StatusCode, count: &InventoryCount) -> axum::response::Response {
    match dto::count_view(count) {
        Ok(view) => (status, Json(view)).into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialize_error",
            e.to_string(),
        ),
    }
}

pub async fn create_count(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCountRequest>,
) -> axum::response::Response {
    let draft = body.into_draft(Utc::now());
    match services.run(move |wh| wh.create_count(draft)).await {
        Ok(count) => respond(StatusCode::CREATED, &count),
        Err(resp) => resp,
    }
}

pub async fn list_counts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CountListQuery>,
) -> axum::response::Response {
    let counts = match services.run(move |wh| wh.counts(query.status)).await {
        Ok(counts) => counts,
        Err(resp) => return resp,
    };
    let views: Result<Vec<_>, _> = counts.iter().map(dto::count_view).collect();
    match views {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialize_error",
            e.to_string(),
        ),
    }
}

pub async fn get_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.count(id)).await {
        Ok(count) => respond(StatusCode::OK, &count),
        Err(resp) => resp,
    }
}

pub async fn start_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.start_count(id, Utc::now())).await {
        Ok(count) => respond(StatusCode::OK, &count),
        Err(resp) => resp,
    }
}

pub async fn record_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordCountRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let product_id = body.product_id;
    let entry = body.into_entry(Utc::now());
    let result = services
        .run(move |wh| {
            let item = wh.record_count(id, product_id, entry)?;
            let hide = wh.count(id)?.hides_expected();
            Ok((item, hide))
        })
        .await;

    match result {
        Ok((item, hide)) => match dto::item_view(&item, hide) {
            Ok(view) => Json(view).into_response(),
            Err(e) => errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialize_error",
                e.to_string(),
            ),
        },
        Err(resp) => resp,
    }
}

pub async fn finalize_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.finalize_count(id, Utc::now())).await {
        Ok(count) => respond(StatusCode::OK, &count),
        Err(resp) => resp,
    }
}

pub async fn annotate_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AnnotateRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .run(move |wh| wh.annotate_count(id, body.product_id, body.cause))
        .await
    {
        Ok(item) => Json(item).into_response(),
        Err(resp) => resp,
    }
}

/// Post one adjustment movement per divergent item and close the count.
pub async fn apply_adjustments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.apply_adjustments(id, Utc::now())).await {
        Ok(count) => respond(StatusCode::OK, &count),
        Err(resp) => resp,
    }
}

pub async fn cancel_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<InventoryCountId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.cancel_count(id, Utc::now())).await {
        Ok(count) => respond(StatusCode::OK, &count),
        Err(resp) => resp,
    }
}

pub async fn suggest_counts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SuggestionQuery>,
) -> axum::response::Response {
    match services
        .run(move |wh| wh.suggest_counts(query.limit, Utc::now()))
        .await
    {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(resp) => resp,
    }
}
