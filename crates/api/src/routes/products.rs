//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::Product;
use serde::{Deserialize, Serialize};

use super::Page;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::validation;
use crate::{AppState, Store};

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price_cents: product.price.cents(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(req) = payload?;
    let name = validation::product_name(&req.name)?;
    let price = validation::price(req.price_cents)?;

    let product = state.products.create_product(name, price).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let Query(params) = params?;
    let (page, page_size) = validation::pagination(params.page, params.page_size)?;

    let products = state.products.list_products().await?;
    Ok(Json(Page::from_items(
        products,
        page,
        page_size,
        ProductResponse::from,
    )))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = validation::parse_id(&id, "product id")?;
    let product = state
        .products
        .get_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}

/// PUT /products/{id}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = validation::parse_id(&id, "product id")?;
    let Json(req) = payload?;
    let name = validation::product_name(&req.name)?;
    let price = validation::price(req.price_cents)?;

    let product = state
        .products
        .update_product(product_id, name, price)
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /products/{id}: soft-delete.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product_id: ProductId = validation::parse_id(&id, "product id")?;
    if state.products.delete_product(product_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Product {id} not found")))
    }
}
