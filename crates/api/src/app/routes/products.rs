use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockforge_core::ProductId;
use stockforge_ledger::MovementFilter;
use stockforge_products::{NewProduct, ProductPatch};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(remove_product),
        )
        .route("/:id/movements", get(product_movements))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    match services.run(move |wh| wh.create_product(body)).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.run(|wh| wh.products()).await {
        Ok(products) => Json(products).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.product(id)).await {
        Ok(product) => Json(product).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.update_product(id, patch)).await {
        Ok(product) => Json(product).into_response(),
        Err(resp) => resp,
    }
}

pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.run(move |wh| wh.remove_product(id)).await {
        Ok(product) => Json(product).into_response(),
        Err(resp) => resp,
    }
}

pub async fn product_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ProductId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .run(move |wh| {
            wh.product(id)?;
            wh.movements(&MovementFilter::for_product(id))
        })
        .await
    {
        Ok(movements) => Json(movements).into_response(),
        Err(resp) => resp,
    }
}
