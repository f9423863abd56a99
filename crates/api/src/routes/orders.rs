//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::{OrderId, OrderItemId, ProductId};
use domain::{Money, Order, OrderFilter, OrderStatus};
use serde::{Deserialize, Serialize};

use super::Page;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::validation;
use crate::{AppState, Store};

// -- Request types --

#[derive(Deserialize)]
pub struct AddProductRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    /// Creation day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub min_total_cents: Option<i64>,
    pub max_total_cents: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items()
            .map(|item| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                price_cents: item.price.cents(),
                quantity: item.quantity,
            })
            .collect();

        Self {
            id: order.id(),
            status: order.status().to_string(),
            items,
            total_cents: order.total().cents(),
            created_at: order.created_at(),
            closed_at: order.closed_at(),
        }
    }
}

// -- Handlers --

/// POST /orders/start: open a new, empty order.
#[tracing::instrument(skip(state))]
pub async fn start<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.orders.start_order().await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// POST /orders/{id}/products: add a product, merging with an existing line.
#[tracing::instrument(skip(state, payload))]
pub async fn add_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = validation::parse_id(&id, "order id")?;
    let Json(req) = payload?;
    let product_id: ProductId = validation::parse_id(&req.product_id, "product id")?;
    let quantity = validation::quantity(req.quantity)?;

    let order = state
        .orders
        .add_product(order_id, product_id, quantity)
        .await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/{id}/products/{product_id}: soft-delete a line.
#[tracing::instrument(skip(state))]
pub async fn remove_product<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = validation::parse_id(&id, "order id")?;
    let product_id: ProductId = validation::parse_id(&product_id, "product id")?;

    let order = state.orders.remove_product(order_id, product_id).await?;
    Ok(Json(order.into()))
}

/// PATCH /orders/{id}/close: close an order with at least one line.
#[tracing::instrument(skip(state))]
pub async fn close<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = validation::parse_id(&id, "order id")?;
    let order = state.orders.close_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /orders/{id}: load an order with its derived total.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = validation::parse_id(&id, "order id")?;
    let order = state
        .orders
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// GET /orders: list orders, filtered and paginated.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let Query(params) = params?;
    let (page, page_size) = validation::pagination(params.page, params.page_size)?;
    let filter = build_filter(&params)?;

    let orders = if filter.created_on.is_none()
        && filter.min_total.is_none()
        && filter.max_total.is_none()
    {
        state.orders.list_orders(filter.status).await?
    } else {
        state.orders.query_orders(filter).await?
    };

    Ok(Json(Page::from_items(
        orders,
        page,
        page_size,
        OrderResponse::from,
    )))
}

fn build_filter(params: &ListOrdersParams) -> Result<OrderFilter, ApiError> {
    let mut filter = OrderFilter::new();

    if let Some(status) = &params.status {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: domain::UnknownOrderStatus| ApiError::BadRequest(e.to_string()))?;
        filter = filter.status(status);
    }
    if let Some(date) = &params.date {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("Invalid date: {date}")))?;
        filter = filter.created_on(day);
    }
    if let (Some(min), Some(max)) = (params.min_total_cents, params.max_total_cents)
        && min > max
    {
        return Err(ApiError::BadRequest(
            "min_total_cents must not exceed max_total_cents".to_string(),
        ));
    }
    if let Some(min) = params.min_total_cents {
        filter = filter.min_total(Money::from_cents(min));
    }
    if let Some(max) = params.max_total_cents {
        filter = filter.max_total(Money::from_cents(max));
    }

    Ok(filter)
}
