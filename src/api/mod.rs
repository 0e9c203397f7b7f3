//! HTTP surface.

mod cart;
mod extract;
mod me;
mod notifications;
mod orders;
mod products;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/products/:id/price", get(products::get_price));

    let customer = Router::new()
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route("/api/cart/items/:id", patch(cart::update_item).delete(cart::remove_item))
        .route("/api/cart/clear", delete(cart::clear_cart))
        .route("/api/me/role", get(me::get_role))
        .route("/api/orders/checkout", post(orders::checkout))
        .route("/api/orders/:id", get(orders::get_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // layers run outermost-last, so authentication happens before the admin check
    let admin = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/notifications/mark-all-read", post(notifications::mark_all_read))
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/:id/status", patch(orders::update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "storefront-api"}))
}
