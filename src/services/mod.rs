//! Business operations on top of the store.
pub mod cart;
pub mod notifications;
pub mod orders;

pub use cart::{AddItemRequest, CartService, UpdateQuantityRequest};
pub use notifications::{NotificationService, SweepThresholds};
pub use orders::{CheckoutRequest, OrderService};
