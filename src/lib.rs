//! Storefront API
//!
//! Back end for a retail and wholesale storefront with its admin back-office.
//!
//! ## Features
//! - Catalog reads with per-unit pricing and time-boxed flash sales
//! - Cart with minimum-order and stock validation
//! - Checkout and order administration
//! - Admin notifications for new and overdue orders
//! - Session-cookie or bearer JWT authentication against a remote JWKS

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod pricing;
pub mod services;
pub mod state;
pub mod stock;
pub mod store;

pub use api::router;
pub use config::Config;
pub use error::{Result, StorefrontError};
pub use state::AppState;
