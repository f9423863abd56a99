//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use auth::{JwtSettings, TokenService};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::InMemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let state = AppState::new(
        InMemoryStore::new(),
        TokenService::new(JwtSettings::default()),
    );
    api::create_app(Arc::new(state), get_metrics_handle())
}

/// Sends a request and returns the status with the JSON body (`Null` if empty).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "cpf": "529.982.247-25", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_product(app: &Router, token: &str, name: &str, price_cents: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/products",
        Some(token),
        Some(json!({ "name": name, "price_cents": price_cents })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn start_order(app: &Router, token: &str) -> String {
    let (status, body) = send(app, "POST", "/orders/start", Some(token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn add_product(
    app: &Router,
    token: &str,
    order_id: &str,
    product_id: &str,
    quantity: i64,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/orders/{order_id}/products"),
        Some(token),
        Some(json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

mod auth_endpoints {
    use super::*;

    #[tokio::test]
    async fn test_register_and_login() {
        let app = setup();
        register(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "cpf": "52998224725", "password": "secret1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["cpf"], "52998224725");
        assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);
        assert!(body["expiration"].is_string());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let app = setup();

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "cpf": "123.456.789-00", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "cpf": "52998224725", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let app = setup();
        register(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "cpf": "52998224725", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = setup();
        register(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "cpf": "52998224725", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let app = setup();
        let (_, first) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "cpf": "111.444.777-35", "password": "secret1" })),
        )
        .await;

        let (status, second) = send(
            &app,
            "POST",
            "/auth/refresh",
            None,
            Some(json!({
                "access_token": first["access_token"],
                "refresh_token": first["refresh_token"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(second["refresh_token"], first["refresh_token"]);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/refresh",
            None,
            Some(json!({
                "access_token": second["access_token"],
                "refresh_token": first["refresh_token"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let app = setup();
        register(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({ "cpf": "52998224725", "new_password": "another1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "cpf": "52998224725", "password": "another1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

mod protected_routes {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = setup();

        let (status, body) = send(&app, "POST", "/orders/start", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "GET", "/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let app = setup();

        let (status, _) = send(&app, "GET", "/orders", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_order_id_format() {
        let app = setup();
        let token = register(&app).await;

        let (status, _) = send(&app, "GET", "/orders/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod products {
    use super::*;

    #[tokio::test]
    async fn test_product_crud() {
        let app = setup();
        let token = register(&app).await;
        let id = create_product(&app, &token, "Book", 1000).await;

        let (status, body) = send(&app, "GET", &format!("/products/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Book");
        assert_eq!(body["price_cents"], 1000);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/products/{id}"),
            Some(&token),
            Some(json!({ "name": "Hardcover", "price_cents": 1500 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Hardcover");

        let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/products/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_validation() {
        let app = setup();
        let token = register(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/products",
            Some(&token),
            Some(json!({ "name": "  ", "price_cents": 1000 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/products",
            Some(&token),
            Some(json!({ "name": "Book", "price_cents": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_list_is_paginated() {
        let app = setup();
        let token = register(&app).await;
        for i in 0..3 {
            create_product(&app, &token, &format!("Product {i}"), 100).await;
        }

        let (status, body) = send(
            &app,
            "GET",
            "/products?page=2&page_size=2",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_start_order() {
        let app = setup();
        let token = register(&app).await;

        let (status, body) = send(&app, "POST", "/orders/start", Some(&token), None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "Open");
        assert_eq!(body["total_cents"], 0);
        assert!(body["items"].as_array().unwrap().is_empty());
        assert!(body["closed_at"].is_null());
    }

    #[tokio::test]
    async fn test_add_merge_remove_then_close_empty_fails() {
        let app = setup();
        let token = register(&app).await;
        let product = create_product(&app, &token, "P1", 1000).await;
        let order = start_order(&app, &token).await;

        let (status, body) = add_product(&app, &token, &order, &product, 2).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cents"], 2000);

        let (_, body) = add_product(&app, &token, &order, &product, 3).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["quantity"], 5);
        assert_eq!(body["total_cents"], 5000);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/orders/{order}/products/{product}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["items"].as_array().unwrap().is_empty());
        assert_eq!(body["total_cents"], 0);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/orders/{order}/close"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_close_then_add_fails() {
        let app = setup();
        let token = register(&app).await;
        let p2 = create_product(&app, &token, "P2", 500).await;
        let p3 = create_product(&app, &token, "P3", 700).await;
        let order = start_order(&app, &token).await;

        add_product(&app, &token, &order, &p2, 4).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/orders/{order}/close"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Closed");
        assert!(body["closed_at"].is_string());
        assert_eq!(body["total_cents"], 2000);

        let (status, _) = add_product(&app, &token, &order, &p3, 1).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", &format!("/orders/{order}"), Some(&token), None).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["total_cents"], 2000);
    }

    #[tokio::test]
    async fn test_not_found_cases() {
        let app = setup();
        let token = register(&app).await;
        let order = start_order(&app, &token).await;
        let missing = uuid::Uuid::new_v4().to_string();

        let (status, _) = send(&app, "GET", &format!("/orders/{missing}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = add_product(&app, &token, &order, &missing, 1).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/orders/{order}/products/{missing}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_quantity() {
        let app = setup();
        let token = register(&app).await;
        let product = create_product(&app, &token, "P1", 1000).await;
        let order = start_order(&app, &token).await;

        let (status, _) = add_product(&app, &token, &order, &product, 0).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = add_product(&app, &token, &order, &product, -2).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_total_overflow_is_rejected() {
        let app = setup();
        let token = register(&app).await;
        let product = create_product(&app, &token, "Big", i64::MAX / 2).await;
        let order = start_order(&app, &token).await;

        let (status, body) = add_product(&app, &token, &order, &product, 3).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", &format!("/orders/{order}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cents"], 0);
        assert!(body["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_with_filters() {
        let app = setup();
        let token = register(&app).await;
        let product = create_product(&app, &token, "P1", 1000).await;

        let closed = start_order(&app, &token).await;
        add_product(&app, &token, &closed, &product, 3).await;
        send(
            &app,
            "PATCH",
            &format!("/orders/{closed}/close"),
            Some(&token),
            None,
        )
        .await;
        start_order(&app, &token).await;

        let (status, body) = send(&app, "GET", "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 2);
        assert_eq!(body["page"], 1);
        assert_eq!(body["page_size"], 10);

        let (_, body) = send(&app, "GET", "/orders?status=closed", Some(&token), None).await;
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["data"][0]["id"], closed.as_str());

        let (_, body) = send(
            &app,
            "GET",
            "/orders?min_total_cents=2500",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["total_count"], 1);

        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d");
        let (_, body) = send(
            &app,
            "GET",
            &format!("/orders?date={today}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["total_count"], 2);

        let (status, _) = send(&app, "GET", "/orders?status=bogus", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/orders?page_size=500", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
