use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::Coordinate;
use crate::models::catalog::{MenuItem, Restaurant};
use crate::models::coupon::Coupon;
use crate::models::courier::Courier;
use crate::models::customer::Customer;
use crate::models::order::Order;
use crate::store::{Catalog, CouponDirectory, Directory, OrderBook};

/// Fixture format accepted by `SEED_FILE`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub restaurants: Vec<Restaurant>,
    pub menu_items: Vec<MenuItem>,
    pub customers: Vec<Customer>,
    pub couriers: Vec<Courier>,
    pub coupons: Vec<Coupon>,
    pub orders: Vec<Order>,
}

impl Seed {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::Internal(format!("failed to read seed {}: {err}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            AppError::Internal(format!("invalid seed {}: {err}", path.display()))
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    restaurants: DashMap<Uuid, Restaurant>,
    menu_items: DashMap<Uuid, MenuItem>,
    customers: DashMap<Uuid, Customer>,
    couriers: DashMap<Uuid, Courier>,
    coupons: DashMap<Uuid, Coupon>,
    orders: DashMap<Uuid, Order>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        seed.restaurants
            .into_iter()
            .for_each(|r| store.upsert_restaurant(r));
        seed.menu_items
            .into_iter()
            .for_each(|m| store.upsert_menu_item(m));
        seed.customers
            .into_iter()
            .for_each(|c| store.upsert_customer(c));
        seed.couriers.into_iter().for_each(|c| store.upsert_courier(c));
        seed.coupons.into_iter().for_each(|c| store.upsert_coupon(c));
        seed.orders.into_iter().for_each(|o| store.upsert_order(o));
        store
    }

    pub fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.restaurants.insert(restaurant.id, restaurant);
    }

    pub fn upsert_menu_item(&self, item: MenuItem) {
        self.menu_items.insert(item.id, item);
    }

    pub fn upsert_customer(&self, customer: Customer) {
        self.customers.insert(customer.id, customer);
    }

    pub fn upsert_courier(&self, courier: Courier) {
        self.couriers.insert(courier.id, courier);
    }

    pub fn upsert_coupon(&self, coupon: Coupon) {
        self.coupons.insert(coupon.id, coupon);
    }

    pub fn upsert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        Ok(self.restaurants.get(&id).map(|entry| entry.value().clone()))
    }

    async fn menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, AppError> {
        Ok(self.menu_items.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.customers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn courier(&self, id: Uuid) -> Result<Option<Courier>, AppError> {
        Ok(self.couriers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn couriers(&self) -> Result<Vec<Courier>, AppError> {
        Ok(self
            .couriers
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn set_courier_location(
        &self,
        id: Uuid,
        location: Coordinate,
    ) -> Result<Option<Courier>, AppError> {
        Ok(self.couriers.get_mut(&id).map(|mut courier| {
            courier.location = Some(location);
            courier.updated_at = Utc::now();
            courier.clone()
        }))
    }
}

#[async_trait]
impl CouponDirectory for MemoryStore {
    async fn coupon(&self, id: Uuid) -> Result<Option<Coupon>, AppError> {
        Ok(self.coupons.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl OrderBook for MemoryStore {
    async fn order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{MemoryStore, Seed};
    use crate::geo::Coordinate;
    use crate::store::Directory;

    #[test]
    fn seed_parses_with_defaults() {
        let raw = r#"{
            "couriers": [
                { "id": "00000000-0000-0000-0000-000000000001", "name": "Ravi" }
            ]
        }"#;

        let seed: Seed = serde_json::from_str(raw).unwrap();
        assert_eq!(seed.couriers.len(), 1);
        assert!(seed.couriers[0].active);
        assert!(seed.couriers[0].location.is_none());
        assert!(seed.orders.is_empty());
    }

    #[tokio::test]
    async fn courier_location_updates_in_place() {
        let raw = r#"{ "couriers": [ { "id": "00000000-0000-0000-0000-000000000001", "name": "Ravi" } ] }"#;
        let store = MemoryStore::from_seed(serde_json::from_str(raw).unwrap());
        let id = Uuid::from_u128(1);

        let updated = store
            .set_courier_location(id, Coordinate::new(77.6, 12.9))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.location, Some(Coordinate::new(77.6, 12.9)));

        let missing = store
            .set_courier_location(Uuid::from_u128(2), Coordinate::new(0.0, 0.0))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
