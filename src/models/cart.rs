use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::pricing::Totals;
use crate::models::catalog::{MenuItem, MenuOption};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// One item + option pair in a cart. Price and display fields are frozen
/// when the line is first added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub item_id: Uuid,
    pub option_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: i64,
    pub option_surcharge: i64,
    pub name: String,
    pub option_name: Option<String>,
    pub image: Option<String>,
}

impl CartLine {
    pub fn from_menu(item: &MenuItem, option: Option<&MenuOption>, quantity: i64) -> Self {
        Self {
            item_id: item.id,
            option_id: option.map(|option| option.id),
            quantity,
            unit_price: item.price,
            option_surcharge: option.map_or(0, |option| option.surcharge),
            name: item.name.clone(),
            option_name: option.map(|option| option.name.clone()),
            image: item.image.clone(),
        }
    }

    pub fn matches(&self, item_id: Uuid, option_id: Option<Uuid>) -> bool {
        self.item_id == item_id && self.option_id == option_id
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity + self.option_surcharge
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Option<Uuid>,
    pub lines: Vec<CartLine>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub coupon_discount: i64,
    pub final_amount: i64,
    pub total_item_count: i64,
    pub applied_coupon: Option<Uuid>,
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(customer_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            restaurant_id: None,
            lines: Vec::new(),
            subtotal: 0,
            delivery_fee: 0,
            coupon_discount: 0,
            final_amount: 0,
            total_item_count: 0,
            applied_coupon: None,
            distance_km: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `quantity` into the line for (item, option). Existing lines
    /// accumulate and disappear when they drop to zero; unknown lines with a
    /// non-positive quantity are ignored.
    pub fn merge_line(&mut self, item: &MenuItem, option: Option<&MenuOption>, quantity: i64) {
        let option_id = option.map(|option| option.id);

        if let Some(index) = self
            .lines
            .iter()
            .position(|line| line.matches(item.id, option_id))
        {
            let merged = self.lines[index].quantity.saturating_add(quantity);
            if merged <= 0 {
                self.lines.remove(index);
            } else {
                self.lines[index].quantity = merged;
            }
            return;
        }

        if quantity > 0 {
            if self.lines.is_empty() {
                self.restaurant_id = Some(item.restaurant_id);
            }
            self.lines.push(CartLine::from_menu(item, option, quantity));
        }
    }

    pub fn remove_line(&mut self, item_id: Uuid, option_id: Option<Uuid>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(item_id, option_id));
        self.lines.len() != before
    }

    pub fn apply_totals(&mut self, totals: Totals) {
        if self.lines.is_empty() {
            self.restaurant_id = None;
        }
        self.subtotal = totals.subtotal;
        self.delivery_fee = totals.delivery_fee;
        self.coupon_discount = totals.coupon_discount;
        self.final_amount = totals.final_amount;
        self.total_item_count = totals.total_item_count;
        self.applied_coupon = totals.applied_coupon;
        self.distance_km = totals.distance_km;
        self.updated_at = Utc::now();
    }
}
