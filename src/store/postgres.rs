//! PostgreSQL implementation of the store traits.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{
    CartRepository, CatalogRepository, EmployeeRepository, NotificationRepository, OrderRepository, StoreError,
    StoreResult,
};
use crate::domain::aggregates::{
    Cart, CartItem, Client, CustomerContact, Employee, FlashSale, Notification, NotificationKind, Order, OrderItem,
    OrderStatus, Product,
};
use crate::domain::value_objects::UnknownVariant;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

fn corrupt(entity: &'static str, id: impl ToString, reason: impl ToString) -> StoreError {
    StoreError::Corrupt { entity, id: id.to_string(), reason: reason.to_string() }
}

fn parse<T: FromStr<Err = UnknownVariant>>(entity: &'static str, id: Uuid, raw: &str) -> StoreResult<T> {
    raw.parse().map_err(|e: UnknownVariant| corrupt(entity, id, e))
}

// -----------------------------------------------------------------------------
// Rows
// -----------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    category: Option<String>,
    sub_category: Option<String>,
    image_url: Option<String>,
    price_piece: Option<Decimal>,
    price_quantity: Option<Decimal>,
    sale_type: String,
    available_quantity: Option<i32>,
    min_order_qty_retail: Option<i32>,
    min_order_qty_wholesale: Option<i32>,
    combinations: serde_json::Value,
    vente_flash_active: bool,
    flash_apply_target: String,
    flash_apply_all_combinations: bool,
    flash_combination_ids: Vec<String>,
    flash_discount_type: String,
    flash_discount_value: Option<Decimal>,
    vente_flash_percentage: Option<Decimal>,
    flash_start_at: Option<DateTime<Utc>>,
    flash_end_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(r: ProductRow) -> StoreResult<Self> {
        let combinations = Product::decode_combinations(r.combinations).map_err(|e| corrupt("product", r.id, e))?;
        Ok(Product {
            id: r.id,
            title: r.title,
            category: r.category,
            sub_category: r.sub_category,
            image_url: r.image_url,
            price_piece: r.price_piece,
            price_quantity: r.price_quantity,
            sale_type: parse("product", r.id, &r.sale_type)?,
            available_quantity: r.available_quantity,
            min_order_qty_retail: r.min_order_qty_retail,
            min_order_qty_wholesale: r.min_order_qty_wholesale,
            combinations,
            flash: FlashSale {
                active: r.vente_flash_active,
                target: parse("product", r.id, &r.flash_apply_target)?,
                all_combinations: r.flash_apply_all_combinations,
                combination_ids: r.flash_combination_ids,
                discount_type: parse("product", r.id, &r.flash_discount_type)?,
                discount_value: r.flash_discount_value,
                legacy_percentage: r.vente_flash_percentage,
                start_at: r.flash_start_at,
                end_at: r.flash_end_at,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow { id: Uuid, clerk_id: String, purchase_unit: String }

#[derive(sqlx::FromRow)]
struct EmployeeRow { id: Uuid, email: String, full_name: String, role: String, is_active: bool }

#[derive(sqlx::FromRow)]
struct CartRow { id: Uuid, clerk_id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    cart_id: Uuid,
    product_id: Uuid,
    combination_id: Option<String>,
    options: Json<BTreeMap<String, String>>,
    quantity: i32,
    price_at_add: Decimal,
    title_at_add: String,
    image_at_add: Option<String>,
    min_qty: i32,
    max_qty: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        CartItem {
            id: r.id,
            cart_id: r.cart_id,
            product_id: r.product_id,
            combination_id: r.combination_id,
            options: r.options.0,
            quantity: r.quantity,
            price_at_add: r.price_at_add,
            title_at_add: r.title_at_add,
            image_at_add: r.image_at_add,
            min_qty: r.min_qty,
            max_qty: r.max_qty,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    clerk_id: String,
    full_name: String,
    email: Option<String>,
    phone: String,
    address: String,
    city: Option<String>,
    note: Option<String>,
    status: String,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    combination_id: Option<String>,
    options: Json<BTreeMap<String, String>>,
    title: String,
    image_url: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: Option<String>,
    notification_type: String,
    title: String,
    message: String,
    payload: serde_json::Value,
    read: bool,
    recipient: String,
    order_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(r: NotificationRow) -> StoreResult<Self> {
        let kind = r.kind.as_deref().map(|k| parse("notification", r.id, k)).transpose()?;
        Ok(Notification {
            id: r.id,
            kind,
            notification_type: r.notification_type,
            title: r.title,
            message: r.message,
            payload: r.payload,
            read: r.read,
            recipient: r.recipient,
            order_id: r.order_id,
            created_at: r.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, clerk_id, full_name, email, phone, address, city, note, status, total, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str = "id, kind, type AS notification_type, title, message, payload, read, recipient, order_id, created_at";

impl PgStore {
    async fn cart_items(&self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at")
            .bind(cart_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Loads the items of every order in one round trip.
    async fn hydrate_orders(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for r in item_rows {
            items.entry(r.order_id).or_default().push(OrderItem {
                id: r.id,
                order_id: r.order_id,
                product_id: r.product_id,
                combination_id: r.combination_id,
                options: r.options.0,
                title: r.title,
                image_url: r.image_url,
                unit_price: r.unit_price,
                quantity: r.quantity,
                line_total: r.line_total,
            });
        }
        rows.into_iter()
            .map(|r| -> StoreResult<Order> {
                Ok(Order {
                    id: r.id,
                    order_number: r.order_number,
                    clerk_id: r.clerk_id,
                    contact: CustomerContact {
                        full_name: r.full_name,
                        email: r.email,
                        phone: r.phone,
                        address: r.address,
                        city: r.city,
                        note: r.note,
                    },
                    status: parse("order", r.id, &r.status)?,
                    total: r.total,
                    items: items.remove(&r.id).unwrap_or_default(),
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn list_products(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Product>, i64)> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        let products = rows.into_iter().map(Product::try_from).collect::<StoreResult<Vec<_>>>()?;
        Ok((products, total.0))
    }

    async fn client(&self, clerk_id: &str) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT id, clerk_id, purchase_unit FROM clients WHERE clerk_id = $1")
            .bind(clerk_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| -> StoreResult<Client> {
            Ok(Client { id: r.id, purchase_unit: parse("client", r.id, &r.purchase_unit)?, clerk_id: r.clerk_id })
        })
        .transpose()
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn ensure_cart(&self, clerk_id: &str) -> StoreResult<Cart> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (id, clerk_id, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) \
             ON CONFLICT (clerk_id) DO UPDATE SET clerk_id = EXCLUDED.clerk_id RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(clerk_id)
        .fetch_one(&self.pool)
        .await?;
        let items = self.cart_items(row.id).await?;
        Ok(Cart { id: row.id, clerk_id: row.clerk_id, items, created_at: row.created_at, updated_at: row.updated_at })
    }

    async fn insert_item(&self, item: &CartItem) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, combination_id, options, quantity, price_at_add, \
             title_at_add, image_at_add, min_qty, max_qty, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(item.id)
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(&item.combination_id)
        .bind(Json(&item.options))
        .bind(item.quantity)
        .bind(item.price_at_add)
        .bind(&item.title_at_add)
        .bind(&item.image_at_add)
        .bind(item.min_qty)
        .bind(item.max_qty)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1").bind(item.cart_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn update_item(&self, item: &CartItem) -> StoreResult<()> {
        sqlx::query(
            "UPDATE cart_items SET quantity = $2, price_at_add = $3, title_at_add = $4, image_at_add = $5, \
             min_qty = $6, max_qty = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.price_at_add)
        .bind(&item.title_at_add)
        .bind(&item.image_at_add)
        .bind(item.min_qty)
        .bind(item.max_qty)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_item(&self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn clear_cart(&self, cart_id: Uuid) -> StoreResult<u64> {
        let done = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(&self, order: &Order, cart_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO orders (id, order_number, clerk_id, full_name, email, phone, address, city, note, status, \
             total, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.clerk_id)
        .bind(&order.contact.full_name)
        .bind(&order.contact.email)
        .bind(&order.contact.phone)
        .bind(&order.contact.address)
        .bind(&order.contact.city)
        .bind(&order.contact.note)
        .bind(order.status.as_str())
        .bind(order.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;
        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, combination_id, options, title, image_url, \
                 unit_price, quantity, line_total) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(&item.combination_id)
            .bind(Json(&item.options))
            .bind(&item.title)
            .bind(&item.image_url)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(self.hydrate_orders(rows).await?.pop())
    }

    async fn list_orders(&self, limit: i64) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_orders(rows).await
    }

    async fn pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 AND created_at < $2 ORDER BY created_at"
        ))
        .bind(OrderStatus::Pending.as_str())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_orders(rows).await
    }

    async fn pending_orders_created_after(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 AND created_at >= $2 ORDER BY created_at"
        ))
        .bind(OrderStatus::Pending.as_str())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_orders(rows).await
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn notification_exists(&self, order_id: Uuid, kind: NotificationKind) -> StoreResult<bool> {
        let found: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM notifications WHERE order_id = $1 \
             AND (kind = $2 OR payload->>'kind' = $2 OR strpos(title, $3) > 0))",
        )
        .bind(order_id)
        .bind(kind.as_str())
        .bind(kind.legacy_title_marker())
        .fetch_one(&self.pool)
        .await?;
        Ok(found.0)
    }

    async fn insert_notification(&self, n: &Notification) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, kind, type, title, message, payload, read, recipient, order_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(n.id)
        .bind(n.kind.map(|k| k.as_str()))
        .bind(&n.notification_type)
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.payload)
        .bind(n.read)
        .bind(&n.recipient)
        .bind(n.order_id)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(&self, recipient: &str, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient = $1 AND (NOT $2 OR read = FALSE) \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(recipient)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient: &str) -> StoreResult<u64> {
        let done = sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient = $1 AND read = FALSE")
            .bind(recipient)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl EmployeeRepository for PgStore {
    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, email, full_name, role, is_active FROM employees WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| -> StoreResult<Employee> {
            Ok(Employee { id: r.id, role: parse("employee", r.id, &r.role)?, email: r.email, full_name: r.full_name, is_active: r.is_active })
        })
        .transpose()
    }
}
