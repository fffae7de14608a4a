use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::models::order::{OrderLine, OrderStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Picked,
    Delivered,
    Cancelled,
}

impl AssignmentStatus {
    /// No longer contestable by other couriers.
    pub fn is_claimed(self) -> bool {
        matches!(
            self,
            AssignmentStatus::Accepted | AssignmentStatus::Picked | AssignmentStatus::Delivered
        )
    }

    /// On the road: the courier's position drives live distances.
    pub fn is_active(self) -> bool {
        matches!(self, AssignmentStatus::Accepted | AssignmentStatus::Picked)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Delivered | AssignmentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Picked => "picked",
            AssignmentStatus::Delivered => "delivered",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatSender {
    Customer,
    Courier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySnapshot {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub location: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
    pub status: OrderStatus,
}

/// Copy of everything a courier needs to finish the delivery offline.
/// Captured once, on accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub order: OrderSnapshot,
    pub customer: PartySnapshot,
    pub restaurant: PartySnapshot,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Uuid,
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_location: Coordinate,
    pub customer_location: Coordinate,
    pub pickup_distance_km: f64,
    pub drop_distance_km: f64,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub picked_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub snapshot: Option<AssignmentSnapshot>,
    pub chat: Vec<ChatMessage>,
}
