//! Aggregates module
pub mod account;
pub mod cart;
pub mod notification;
pub mod order;
pub mod product;

pub use account::{Client, Employee, EmployeeRole};
pub use cart::{Cart, CartItem, CartView};
pub use notification::{Notification, NotificationKind, ADMIN_RECIPIENT};
pub use order::{CustomerContact, Order, OrderItem, OrderStatus};
pub use product::{Combination, CombinationError, FlashSale, Product};
