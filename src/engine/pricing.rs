use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{Coordinate, distance_km};
use crate::models::cart::CartLine;
use crate::models::coupon::Coupon;

const DEFAULT_BASE_FEE: i64 = 20;
const DEFAULT_FREE_RADIUS_KM: f64 = 5.0;
const DEFAULT_PER_KM_FEE: i64 = 2;

/// Stepped delivery tariff: a flat fee inside the free radius, plus a fixed
/// step for every started kilometer beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub base_fee: i64,
    pub free_radius_km: f64,
    pub per_km_fee: i64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            base_fee: DEFAULT_BASE_FEE,
            free_radius_km: DEFAULT_FREE_RADIUS_KM,
            per_km_fee: DEFAULT_PER_KM_FEE,
        }
    }
}

impl Tariff {
    pub fn delivery_fee(&self, total_item_count: i64, distance_km: f64) -> i64 {
        if total_item_count <= 0 {
            return 0;
        }

        let overage = distance_km - self.free_radius_km;
        if overage <= 0.0 {
            return self.base_fee;
        }

        // Partial kilometers round up.
        self.base_fee + self.per_km_fee * overage.ceil() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Totals {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub coupon_discount: i64,
    pub final_amount: i64,
    pub total_item_count: i64,
    pub applied_coupon: Option<Uuid>,
    pub distance_km: Option<f64>,
}

/// Discount the coupon grants on `subtotal` at `now`, or `None` when the
/// coupon does not apply.
pub fn coupon_discount(coupon: &Coupon, subtotal: i64, now: DateTime<Utc>) -> Option<i64> {
    if !coupon.active {
        return None;
    }
    if coupon.expires_at.is_some_and(|expires_at| now > expires_at) {
        return None;
    }
    if subtotal < coupon.min_cart_amount.unwrap_or(0) {
        return None;
    }

    let percentage = i64::from(coupon.percentage.min(100));
    let discount = subtotal.max(0) * percentage / 100;

    Some(match coupon.max_discount_amount {
        Some(cap) => discount.min(cap.max(0)),
        None => discount,
    })
}

pub fn compute_totals(
    tariff: &Tariff,
    lines: &[CartLine],
    restaurant_location: Option<&Coordinate>,
    customer_location: Option<&Coordinate>,
    candidate_coupon: Option<&Coupon>,
    now: DateTime<Utc>,
) -> Result<Totals, AppError> {
    let subtotal: i64 = lines.iter().map(CartLine::line_total).sum();
    let total_item_count: i64 = lines.iter().map(|line| line.quantity).sum();

    let (distance, delivery_fee) = if total_item_count > 0 {
        let restaurant = restaurant_location.ok_or_else(|| {
            AppError::LocationMissing("restaurant has no location".to_string())
        })?;
        let customer = customer_location
            .ok_or_else(|| AppError::LocationMissing("customer has no location".to_string()))?;

        let distance = distance_km(customer, restaurant);
        (Some(distance), tariff.delivery_fee(total_item_count, distance))
    } else {
        (None, 0)
    };

    let (coupon_discount, applied_coupon) = match candidate_coupon
        .and_then(|coupon| coupon_discount(coupon, subtotal, now).map(|d| (d, coupon.id)))
    {
        Some((discount, coupon_id)) => (discount.min(subtotal + delivery_fee), Some(coupon_id)),
        None => (0, None),
    };

    Ok(Totals {
        subtotal,
        delivery_fee,
        coupon_discount,
        final_amount: (subtotal + delivery_fee - coupon_discount).max(0),
        total_item_count,
        applied_coupon,
        distance_km: distance,
    })
}
