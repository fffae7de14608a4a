use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Ongoing,
    Cancelled,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Orders in these states can no longer be handed to couriers.
    pub fn is_closed(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
