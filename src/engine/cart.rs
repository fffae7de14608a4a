use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::pricing::compute_totals;
use crate::error::AppError;
use crate::models::cart::{Cart, MAX_LINE_QUANTITY};
use crate::models::coupon::Coupon;
use crate::state::AppState;
use crate::store::bounded;

#[derive(Debug, Clone, Deserialize)]
pub struct LineRequest {
    pub item_id: Uuid,
    #[serde(default)]
    pub option_id: Option<Uuid>,
    pub quantity: i64,
}

/// Merges `lines` into the customer's cart, reprices it and persists the
/// result. Nothing is written unless every lookup and the pricing succeed.
pub async fn add_or_update_lines(
    state: &AppState,
    customer_id: Uuid,
    lines: Vec<LineRequest>,
    coupon_id: Option<Uuid>,
) -> Result<Cart, AppError> {
    let result = mutate(state, customer_id, lines, coupon_id).await;
    record_outcome(state, &result);
    result
}

async fn mutate(
    state: &AppState,
    customer_id: Uuid,
    lines: Vec<LineRequest>,
    coupon_id: Option<Uuid>,
) -> Result<Cart, AppError> {
    let _guard = state.cart_locks.lock(customer_id).await;
    let timeout = state.settings.store_timeout;

    bounded(timeout, "directory", state.directory.customer(customer_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {customer_id} not found")))?;

    let existing = state.carts.get(&customer_id).map(|entry| entry.value().clone());
    let existed = existing.is_some();
    let mut cart = existing.unwrap_or_else(|| Cart::new(customer_id));

    for line in lines {
        if line.quantity.unsigned_abs() > MAX_LINE_QUANTITY as u64 {
            return Err(AppError::InvalidInput(format!(
                "quantity {} for menu item {} exceeds {MAX_LINE_QUANTITY}",
                line.quantity, line.item_id
            )));
        }

        let item = bounded(timeout, "catalog", state.catalog.menu_item(line.item_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("menu item {} not found", line.item_id)))?;

        let option = match line.option_id {
            Some(option_id) => Some(item.option(option_id).cloned().ok_or_else(|| {
                AppError::NotFound(format!(
                    "option {option_id} not found on menu item {}",
                    item.id
                ))
            })?),
            None => None,
        };

        // Non-positive quantities can only touch lines already in the cart.
        if let Some(pinned) = cart.restaurant_id {
            if line.quantity > 0 && !cart.lines.is_empty() && pinned != item.restaurant_id {
                return Err(AppError::InvalidState(format!(
                    "cart holds items from restaurant {pinned}; empty it before ordering from {}",
                    item.restaurant_id
                )));
            }
        }

        cart.merge_line(&item, option.as_ref(), line.quantity);
    }

    if let Some(line) = cart.lines.iter().find(|line| line.quantity > MAX_LINE_QUANTITY) {
        return Err(AppError::InvalidInput(format!(
            "menu item {} would reach quantity {}, above {MAX_LINE_QUANTITY}",
            line.item_id, line.quantity
        )));
    }

    let candidate = match coupon_id {
        Some(id) => Some(
            bounded(timeout, "coupon directory", state.coupons.coupon(id))
                .await?
                .ok_or_else(|| AppError::NotFound(format!("coupon {id} not found")))?,
        ),
        None => match cart.applied_coupon {
            Some(id) => bounded(timeout, "coupon directory", state.coupons.coupon(id)).await?,
            None => None,
        },
    };

    reprice(state, &mut cart, candidate.as_ref()).await?;

    if existed || !cart.lines.is_empty() {
        state.carts.insert(customer_id, cart.clone());
    }

    info!(
        customer_id = %customer_id,
        lines = cart.lines.len(),
        final_amount = cart.final_amount,
        coupon_applied = cart.applied_coupon.is_some(),
        "cart updated"
    );

    Ok(cart)
}

pub async fn remove_line(
    state: &AppState,
    customer_id: Uuid,
    item_id: Uuid,
    option_id: Option<Uuid>,
) -> Result<Cart, AppError> {
    let result = remove(state, customer_id, item_id, option_id).await;
    record_outcome(state, &result);
    result
}

async fn remove(
    state: &AppState,
    customer_id: Uuid,
    item_id: Uuid,
    option_id: Option<Uuid>,
) -> Result<Cart, AppError> {
    let _guard = state.cart_locks.lock(customer_id).await;

    let mut cart = get(state, customer_id)?;
    if !cart.remove_line(item_id, option_id) {
        return Err(AppError::NotFound(format!(
            "menu item {item_id} is not in the cart"
        )));
    }

    let candidate = match cart.applied_coupon {
        Some(id) => {
            bounded(
                state.settings.store_timeout,
                "coupon directory",
                state.coupons.coupon(id),
            )
            .await?
        }
        None => None,
    };

    reprice(state, &mut cart, candidate.as_ref()).await?;
    state.carts.insert(customer_id, cart.clone());

    debug!(customer_id = %customer_id, item_id = %item_id, "cart line removed");
    Ok(cart)
}

async fn reprice(state: &AppState, cart: &mut Cart, coupon: Option<&Coupon>) -> Result<(), AppError> {
    let timeout = state.settings.store_timeout;

    let (restaurant_location, customer_location) = if cart.lines.is_empty() {
        (None, None)
    } else {
        let restaurant_id = cart.restaurant_id.ok_or_else(|| {
            AppError::Internal(format!("cart {} has lines but no restaurant", cart.id))
        })?;
        let restaurant = bounded(timeout, "catalog", state.catalog.restaurant(restaurant_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("restaurant {restaurant_id} not found")))?;
        let customer = bounded(timeout, "directory", state.directory.customer(cart.customer_id))
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("customer {} not found", cart.customer_id))
            })?;

        (restaurant.location, customer.location)
    };

    let totals = compute_totals(
        &state.settings.tariff,
        &cart.lines,
        restaurant_location.as_ref(),
        customer_location.as_ref(),
        coupon,
        Utc::now(),
    )?;

    if coupon.is_some() && totals.applied_coupon.is_none() {
        debug!(cart_id = %cart.id, "coupon no longer applies; dropped");
    }

    cart.apply_totals(totals);
    Ok(())
}

fn record_outcome(state: &AppState, result: &Result<Cart, AppError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(err) => {
            warn!(error = %err, "cart mutation rejected");
            err.kind()
        }
    };
    state
        .metrics
        .cart_mutations_total
        .with_label_values(&[outcome])
        .inc();
}

pub fn get(state: &AppState, customer_id: Uuid) -> Result<Cart, AppError> {
    state
        .carts
        .get(&customer_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("no cart for customer {customer_id}")))
}

pub async fn delete_by_customer(state: &AppState, customer_id: Uuid) -> Result<Cart, AppError> {
    let _guard = state.cart_locks.lock(customer_id).await;

    state
        .carts
        .remove(&customer_id)
        .map(|(_, cart)| cart)
        .ok_or_else(|| AppError::NotFound(format!("no cart for customer {customer_id}")))
}

pub async fn delete_by_id(state: &AppState, cart_id: Uuid) -> Result<Cart, AppError> {
    let customer_id = state
        .carts
        .iter()
        .find(|entry| entry.value().id == cart_id)
        .map(|entry| *entry.key())
        .ok_or_else(|| AppError::NotFound(format!("cart {cart_id} not found")))?;

    let _guard = state.cart_locks.lock(customer_id).await;

    state
        .carts
        .remove_if(&customer_id, |_, cart| cart.id == cart_id)
        .map(|(_, cart)| cart)
        .ok_or_else(|| AppError::NotFound(format!("cart {cart_id} not found")))
}

pub fn list_all(state: &AppState) -> Vec<Cart> {
    state
        .carts
        .iter()
        .map(|entry| entry.value().clone())
        .collect()
}
