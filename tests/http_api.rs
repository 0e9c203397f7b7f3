use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::auth::{AuthError, SessionClaims, TokenVerifier};
use storefront_api::domain::aggregates::{Cart, CustomerContact, Employee, EmployeeRole, Order, Product};
use storefront_api::domain::events::EventPublisher;
use storefront_api::store::InMemoryStore;
use storefront_api::{router, AppState};

/// Accepts `user:<id>` and `admin:<id>` tokens; `offline` simulates a JWKS outage.
struct StaticVerifier;

#[axum::async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = |sub: &str, email: &str| SessionClaims {
            sub: sub.to_string(),
            email: Some(email.to_string()),
            exp: usize::MAX,
            sid: None,
        };
        if token == "offline" {
            return Err(AuthError::KeysUnavailable("connection refused".into()));
        }
        if let Some(id) = token.strip_prefix("user:") {
            return Ok(claims(id, &format!("{id}@client.tn")));
        }
        if let Some(id) = token.strip_prefix("admin:") {
            return Ok(claims(id, "gerant@boutique.tn"));
        }
        Err(AuthError::InvalidToken)
    }
}

async fn setup() -> (Router, Arc<InMemoryStore>, Product) {
    let store = Arc::new(InMemoryStore::new());
    let mut p = Product::create("Savon d'Alep");
    p.price_piece = Some(Decimal::new(8_500, 3));
    p.available_quantity = Some(50);
    p.min_order_qty_retail = Some(2);
    store.put_product(p.clone()).await;
    store
        .put_employee(Employee {
            id: Uuid::now_v7(),
            email: "gerant@boutique.tn".into(),
            full_name: "Karim Gerant".into(),
            role: EmployeeRole::Admin,
            is_active: true,
        })
        .await;
    let state = AppState::new(store.clone(), Arc::new(StaticVerifier), EventPublisher::disabled());
    (router(state), store, p)
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _, _) = setup().await;
    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_auth_states() {
    let (app, _, _) = setup().await;

    let (status, body) = send(&app, request(Method::GET, "/api/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, request(Method::GET, "/api/cart", Some("forged"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, request(Method::GET, "/api/cart", Some("offline"), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An unexpected error occurred");

    let (status, body) = send(&app, request(Method::GET, "/api/cart", Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clerkId"], "u1");

    let session = Request::builder()
        .uri("/api/cart")
        .header(header::COOKIE, "__session=user:u2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, session).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clerkId"], "u2");
}

#[tokio::test]
async fn test_add_item_keeps_client_price() {
    let (app, _, p) = setup().await;
    let body = json!({"productId": p.id, "quantity": 3, "priceFromClient": 42});
    let (status, cart) = send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["items"][0]["priceAtAdd"].as_f64(), Some(42.0));
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["items"][0]["minQty"], 2);
    assert_eq!(cart["subtotal"].as_f64(), Some(126.0));
}

#[tokio::test]
async fn test_quantity_errors_carry_suggestion() {
    let (app, _, p) = setup().await;
    let body = json!({"productId": p.id, "quantity": 1});
    let (status, err) = send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_quantity");
    assert_eq!(err["suggestedQty"], 2);

    let body = json!({"productId": p.id, "quantity": 2});
    let (_, cart) = send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(body))).await;
    let item_id = cart["items"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/cart/items/{item_id}");
    let (status, err) = send(&app, request(Method::PATCH, &uri, Some("user:u1"), Some(json!({"quantity": 80})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["suggestedQty"], 50);

    // someone else's line is invisible
    let (status, _) = send(&app, request(Method::DELETE, &uri, Some("user:u9"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cart) = send(&app, request(Method::DELETE, "/api/cart/clear", Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_admin_routes_require_admin_employee() {
    let (app, _, _) = setup().await;
    let (status, _) = send(&app, request(Method::GET, "/notifications", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, request(Method::GET, "/notifications", Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    let (status, _) = send(&app, request(Method::GET, "/api/orders", Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, request(Method::GET, "/notifications", Some("admin:a1"), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_notification_poll_runs_sweeps_once() {
    let (app, store, _) = setup().await;
    let mut overdue = Order::from_cart(&Cart::for_user("u1"), CustomerContact { full_name: "Salma".into(), ..Default::default() });
    overdue.created_at = Utc::now() - Duration::hours(60);
    store.put_order(overdue).await;

    let (status, listed) = send(&app, request(Method::GET, "/notifications", Some("admin:a1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["kind"], "order_overdue");

    let (_, listed) = send(&app, request(Method::GET, "/notifications?unreadOnly=true", Some("admin:a1"), None)).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let id = listed[0]["id"].as_str().unwrap().to_string();
    let uri = format!("/notifications/{id}/read");
    let (status, body) = send(&app, request(Method::POST, &uri, Some("admin:a1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, listed) = send(&app, request(Method::GET, "/notifications?unreadOnly=true", Some("admin:a1"), None)).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
    let (_, body) = send(&app, request(Method::POST, "/notifications/mark-all-read", Some("admin:a1"), None)).await;
    assert_eq!(body["updated"], 0);
}

#[tokio::test]
async fn test_me_role() {
    let (app, _, _) = setup().await;
    let (status, body) = send(&app, request(Method::GET, "/api/me/role", Some("admin:a1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["fullName"], "Karim Gerant");

    let (_, body) = send(&app, request(Method::GET, "/api/me/role", Some("user:u1"), None)).await;
    assert_eq!(body["role"], Value::Null);
    assert_eq!(body["isActive"], false);
    assert!(body.get("id").is_none());
}

#[tokio::test]
async fn test_checkout_and_order_admin() {
    let (app, _, p) = setup().await;
    let body = json!({"productId": p.id, "quantity": 4});
    send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(body))).await;

    let contact = json!({
        "fullName": "Nour Trabelsi",
        "phone": "+21698765432",
        "address": "5 avenue Habib Bourguiba",
        "city": "Sfax"
    });
    let (status, order) = send(&app, request(Method::POST, "/api/orders/checkout", Some("user:u1"), Some(contact))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"].as_f64(), Some(34.0));
    let id = order["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, request(Method::GET, &format!("/api/orders/{id}"), Some("user:u2"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request(Method::GET, &format!("/api/orders/{id}"), Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/orders/{id}/status");
    let (status, order) = send(&app, request(Method::PATCH, &uri, Some("admin:a1"), Some(json!({"status": "paid"})))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "paid");
    let (status, _) = send(&app, request(Method::PATCH, &uri, Some("admin:a1"), Some(json!({"status": "pending"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_reads() {
    let (app, _, p) = setup().await;
    let (status, page) = send(&app, request(Method::GET, "/api/products?page=1&per_page=10", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["title"], "Savon d'Alep");

    let (status, quote) = send(&app, request(Method::GET, &format!("/api/products/{}/price", p.id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["price"].as_f64(), Some(8.5));
    assert_eq!(quote["flashApplied"], false);

    let (status, _) = send(&app, request(Method::GET, &format!("/api/products/{}", Uuid::now_v7()), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let (app, _, p) = setup().await;

    let (status, body) = send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(json!({"quantity": 2})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().is_some_and(|m| m.contains("productId")));

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/api/cart/items")
        .header(header::AUTHORIZATION, "Bearer user:u1")
        .body(Body::from("quantity=2"))
        .unwrap();
    let (status, body) = send(&app, untyped).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let rounded = json!({"productId": p.id, "quantity": 2, "priceFromClient": 42.12345});
    let (status, body) = send(&app, request(Method::POST, "/api/cart/items", Some("user:u1"), Some(rounded))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, request(Method::GET, "/api/orders/not-a-uuid", Some("user:u1"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(&app, request(Method::GET, "/api/products?page=abc", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
