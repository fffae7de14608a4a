use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::engine::locks::KeyedLocks;
use crate::events::DispatchEvent;
use crate::models::assignment::Assignment;
use crate::models::cart::Cart;
use crate::observability::metrics::Metrics;
use crate::store::{Catalog, CouponDirectory, Directory, OrderBook};

pub struct AppState {
    pub settings: EngineSettings,
    pub catalog: Arc<dyn Catalog>,
    pub directory: Arc<dyn Directory>,
    pub coupons: Arc<dyn CouponDirectory>,
    pub orders: Arc<dyn OrderBook>,
    /// Keyed by customer id.
    pub carts: DashMap<Uuid, Cart>,
    pub assignments: DashMap<Uuid, Assignment>,
    /// order id -> the one assignment holding a claimed status.
    pub claims: DashMap<Uuid, Uuid>,
    /// courier id -> the courier's one Accepted or Picked assignment.
    pub active_by_courier: DashMap<Uuid, Uuid>,
    pub cart_locks: KeyedLocks,
    pub dispatch_locks: KeyedLocks,
    pub courier_locks: KeyedLocks,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new<S>(settings: EngineSettings, store: Arc<S>, event_buffer_size: usize) -> Self
    where
        S: Catalog + Directory + CouponDirectory + OrderBook + 'static,
    {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            settings,
            catalog: store.clone(),
            directory: store.clone(),
            coupons: store.clone(),
            orders: store,
            carts: DashMap::new(),
            assignments: DashMap::new(),
            claims: DashMap::new(),
            active_by_courier: DashMap::new(),
            cart_locks: KeyedLocks::default(),
            dispatch_locks: KeyedLocks::default(),
            courier_locks: KeyedLocks::default(),
            events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn emit(&self, event: DispatchEvent) {
        // No subscribers is the normal idle case.
        let _ = self.events_tx.send(event);
    }
}
