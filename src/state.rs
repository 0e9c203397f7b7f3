use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::domain::events::EventPublisher;
use crate::services::{CartService, NotificationService, OrderService, SweepThresholds};
use crate::store::Store;

/// Shared handler state. Cloned per request; everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub events: EventPublisher,
    pub thresholds: SweepThresholds,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, verifier: Arc<dyn TokenVerifier>, events: EventPublisher) -> Self {
        Self { store, verifier, events, thresholds: SweepThresholds::default() }
    }

    pub fn with_thresholds(mut self, thresholds: SweepThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn carts(&self) -> CartService {
        CartService::new(self.store.clone(), self.events.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.store.clone(), self.events.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone(), self.events.clone(), self.thresholds)
    }
}
