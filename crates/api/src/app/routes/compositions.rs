use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockforge_core::CompositionId;
use stockforge_production::NewComposition;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_compositions).post(create_composition))
        .route("/import", post(import_compositions))
        .route(
            "/:id",
            get(get_composition)
                .put(update_composition)
                .delete(delete_composition),
        )
        .route("/:id/explode", get(explode_composition))
}

pub async fn create_composition(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewComposition>,
) -> axum::response::Response {
    match services.run(move |wh| wh.create_composition(body)).await {
        Ok(composition) => (StatusCode::CREATED, Json(composition)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_compositions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.run(|wh| wh.compositions()).await {
        Ok(compositions) => Json(compositions).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_composition(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CompositionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.composition(id)).await {
        Ok(composition) => Json(composition).into_response(),
        Err(resp) => resp,
    }
}

/// Replace the composition's definition; its version is bumped.
pub async fn update_composition(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NewComposition>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CompositionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.update_composition(id, body)).await {
        Ok(composition) => Json(composition).into_response(),
        Err(resp) => resp,
    }
}

pub async fn delete_composition(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CompositionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.delete_composition(id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}

pub async fn import_compositions(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ImportCompositionsRequest>,
) -> axum::response::Response {
    match services
        .run(move |wh| wh.import_compositions(body.compositions, body.update_existing))
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(resp) => resp,
    }
}

pub async fn explode_composition(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::ExplodeQuery>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CompositionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.explode(id, query.multiplier)).await {
        Ok(items) => Json(items).into_response(),
        Err(resp) => resp,
    }
}
