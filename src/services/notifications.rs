//! Admin notifications and the pending-order sweeps that raise them.
//!
//! The sweeps run inline whenever the back-office polls the notification
//! list. Each one creates at most one notification per order and kind, so
//! polling repeatedly is harmless.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{Notification, NotificationKind, Order, ADMIN_RECIPIENT};
use crate::domain::events::{DomainEvent, EventPublisher, NotificationEvent};
use crate::error::{Result, StorefrontError};
use crate::store::{Store, StoreResult};

/// Age limits for the two sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepThresholds {
    /// Pending orders older than this are overdue.
    pub overdue_after: Duration,
    /// Pending orders younger than this are announced as new.
    pub new_within: Duration,
}

impl Default for SweepThresholds {
    fn default() -> Self {
        Self { overdue_after: Duration::hours(48), new_within: Duration::hours(24) }
    }
}

pub struct NotificationService {
    store: Arc<dyn Store>,
    events: EventPublisher,
    thresholds: SweepThresholds,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher, thresholds: SweepThresholds) -> Self {
        Self { store, events, thresholds }
    }

    async fn ensure(&self, orders: Vec<Order>, kind: NotificationKind, build: impl Fn(&Order) -> Notification) -> StoreResult<usize> {
        let mut created = 0;
        for order in &orders {
            if self.store.notification_exists(order.id, kind).await? {
                continue;
            }
            let notification = build(order);
            self.store.insert_notification(&notification).await?;
            created += 1;
            self.events
                .publish(DomainEvent::Notification(NotificationEvent::Created {
                    notification_id: notification.id,
                    order_id: Some(order.id),
                    kind: Some(kind),
                }))
                .await;
        }
        Ok(created)
    }

    /// Raises an overdue notification for every pending order older than `threshold`.
    pub async fn ensure_overdue_notifications(&self, now: DateTime<Utc>, threshold: Duration) -> StoreResult<usize> {
        let orders = self.store.pending_orders_created_before(now - threshold).await?;
        self.ensure(orders, NotificationKind::OrderOverdue, |o| Notification::order_overdue(o, now)).await
    }

    /// Raises a new-order notification for every pending order younger than `threshold`.
    pub async fn ensure_new_order_notifications(&self, now: DateTime<Utc>, threshold: Duration) -> StoreResult<usize> {
        let orders = self.store.pending_orders_created_after(now - threshold).await?;
        self.ensure(orders, NotificationKind::NewOrder, Notification::new_order).await
    }

    /// Runs both sweeps. Failures are logged and never surface to the caller.
    pub async fn sweep(&self, now: DateTime<Utc>) {
        match self.ensure_overdue_notifications(now, self.thresholds.overdue_after).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(created = n, "overdue order notifications raised"),
            Err(e) => tracing::warn!(error = %e, "overdue order sweep failed"),
        }
        match self.ensure_new_order_notifications(now, self.thresholds.new_within).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(created = n, "new order notifications raised"),
            Err(e) => tracing::warn!(error = %e, "new order sweep failed"),
        }
    }

    pub async fn list(&self, unread_only: bool, limit: i64) -> Result<Vec<Notification>> {
        Ok(self.store.list_notifications(ADMIN_RECIPIENT, unread_only, limit.clamp(1, 200)).await?)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<()> {
        if !self.store.mark_read(id).await? {
            return Err(StorefrontError::NotFound("Notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<u64> {
        Ok(self.store.mark_all_read(ADMIN_RECIPIENT).await?)
    }
}
