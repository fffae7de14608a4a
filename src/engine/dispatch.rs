use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::{parse_courier_target, transition};
use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::geo::{Coordinate, distance_km};
use crate::models::assignment::{
    Assignment, AssignmentSnapshot, AssignmentStatus, ChatMessage, ChatSender, OrderSnapshot,
    PartySnapshot,
};
use crate::state::AppState;
use crate::store::bounded;

const MAX_MESSAGE_LEN: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchOutcome {
    Broadcast,
    NoCouriers,
    AlreadyPending,
    AlreadyClaimed,
}

impl DispatchOutcome {
    fn label(self) -> &'static str {
        match self {
            DispatchOutcome::Broadcast => "broadcast",
            DispatchOutcome::NoCouriers => "no_couriers",
            DispatchOutcome::AlreadyPending => "already_pending",
            DispatchOutcome::AlreadyClaimed => "already_claimed",
        }
    }
}

/// Result of a courier position update.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Tracking {
    /// The courier has nothing accepted or picked.
    Idle,
    Active { assignment: Assignment },
}

/// Offers `order_id` to every dispatchable courier within the configured
/// radius of the restaurant. Repeated calls return the existing offers, or
/// the claimed assignment once a courier has accepted.
pub async fn assign(state: &AppState, order_id: Uuid) -> Result<Vec<Assignment>, AppError> {
    let start = Instant::now();
    let result = broadcast(state, order_id).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok((outcome, _)) => outcome.label(),
        Err(err) => {
            warn!(order_id = %order_id, error = %err, "dispatch failed");
            "error"
        }
    };
    state
        .metrics
        .dispatch_latency_seconds
        .with_label_values(&[outcome])
        .observe(elapsed);
    state
        .metrics
        .dispatch_requests_total
        .with_label_values(&[outcome])
        .inc();

    result.map(|(_, assignments)| assignments)
}

async fn broadcast(
    state: &AppState,
    order_id: Uuid,
) -> Result<(DispatchOutcome, Vec<Assignment>), AppError> {
    let _guard = state.dispatch_locks.lock(order_id).await;
    let timeout = state.settings.store_timeout;

    let order = bounded(timeout, "order book", state.orders.order(order_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status.is_closed() {
        return Err(AppError::InvalidState(format!(
            "order {order_id} is {:?} and cannot be dispatched",
            order.status
        )));
    }

    let history = history_for_order(state, order_id);

    if let Some(claimed) = history.iter().find(|a| a.status.is_claimed()) {
        debug!(order_id = %order_id, assignment_id = %claimed.id, "order already claimed");
        return Ok((DispatchOutcome::AlreadyClaimed, vec![claimed.clone()]));
    }

    let mut pending: Vec<Assignment> = history
        .iter()
        .filter(|a| a.status == AssignmentStatus::Pending)
        .cloned()
        .collect();
    if !pending.is_empty() {
        sort_nearest_first(&mut pending);
        debug!(order_id = %order_id, offers = pending.len(), "order already broadcast");
        return Ok((DispatchOutcome::AlreadyPending, pending));
    }

    let restaurant = bounded(timeout, "catalog", state.catalog.restaurant(order.restaurant_id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("restaurant {} not found", order.restaurant_id))
        })?;
    let restaurant_location = restaurant.location.ok_or_else(|| {
        AppError::LocationMissing(format!("restaurant {} has no location", restaurant.id))
    })?;

    let customer = bounded(timeout, "directory", state.directory.customer(order.customer_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {} not found", order.customer_id)))?;
    let customer_location = customer.location.ok_or_else(|| {
        AppError::LocationMissing(format!("customer {} has no location", customer.id))
    })?;

    let couriers = bounded(timeout, "directory", state.directory.couriers()).await?;

    // Couriers who already backed out of this order are not asked again.
    let declined: HashSet<Uuid> = history
        .iter()
        .filter(|a| a.status == AssignmentStatus::Cancelled)
        .map(|a| a.courier_id)
        .collect();

    let radius = state.settings.dispatch_radius_km;
    let drop_distance_km = distance_km(&restaurant_location, &customer_location);
    let now = Utc::now();

    let mut created: Vec<Assignment> = couriers
        .iter()
        .filter(|courier| courier.is_dispatchable() && !declined.contains(&courier.id))
        .filter_map(|courier| {
            let location = courier.location?;
            let pickup_distance_km = distance_km(&location, &restaurant_location);
            (pickup_distance_km <= radius).then(|| Assignment {
                id: Uuid::new_v4(),
                order_id,
                courier_id: courier.id,
                restaurant_id: order.restaurant_id,
                customer_id: order.customer_id,
                restaurant_location,
                customer_location,
                pickup_distance_km,
                drop_distance_km,
                status: AssignmentStatus::Pending,
                created_at: now,
                updated_at: now,
                accepted_at: None,
                picked_at: None,
                delivered_at: None,
                cancelled_at: None,
                snapshot: None,
                chat: Vec::new(),
            })
        })
        .collect();

    if created.is_empty() {
        warn!(order_id = %order_id, radius_km = radius, "no couriers within radius");
        return Ok((DispatchOutcome::NoCouriers, created));
    }

    sort_nearest_first(&mut created);
    for assignment in &created {
        state.assignments.insert(assignment.id, assignment.clone());
        state.emit(DispatchEvent::AssignmentCreated(assignment.clone()));
    }

    info!(
        order_id = %order_id,
        offers = created.len(),
        drop_distance_km,
        "order broadcast to couriers"
    );

    Ok((DispatchOutcome::Broadcast, created))
}

/// Claims the order for this assignment's courier. Exactly one of several
/// racing accepts on the same order succeeds.
pub async fn accept(state: &AppState, assignment_id: Uuid) -> Result<Assignment, AppError> {
    let current = get(state, assignment_id)?;
    if current.status != AssignmentStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "assignment {assignment_id} is {:?}, not Pending",
            current.status
        )));
    }
    if state.claims.contains_key(&current.order_id) {
        return Err(AppError::InvalidState(format!(
            "order {} was already accepted by another courier",
            current.order_id
        )));
    }
    if state.active_by_courier.contains_key(&current.courier_id) {
        return Err(courier_busy(current.courier_id));
    }

    let snapshot = capture_snapshot(state, &current).await?;

    match state.claims.entry(current.order_id) {
        Entry::Occupied(_) => {
            return Err(AppError::InvalidState(format!(
                "order {} was already accepted by another courier",
                current.order_id
            )));
        }
        Entry::Vacant(slot) => {
            slot.insert(assignment_id);
        }
    }

    match state.active_by_courier.entry(current.courier_id) {
        Entry::Occupied(_) => {
            release_claim(state, current.order_id, assignment_id);
            return Err(courier_busy(current.courier_id));
        }
        Entry::Vacant(slot) => {
            slot.insert(assignment_id);
        }
    }

    let accepted = {
        let Some(mut record) = state.assignments.get_mut(&assignment_id) else {
            release_claim(state, current.order_id, assignment_id);
            release_courier(state, current.courier_id, assignment_id);
            return Err(AppError::NotFound(format!(
                "assignment {assignment_id} not found"
            )));
        };

        if let Err(err) = transition(&mut record, AssignmentStatus::Accepted, Utc::now()) {
            drop(record);
            release_claim(state, current.order_id, assignment_id);
            release_courier(state, current.courier_id, assignment_id);
            return Err(err);
        }
        record.snapshot = Some(snapshot);
        record.clone()
    };

    state.metrics.active_deliveries.inc();
    record_transition(state, &accepted);

    info!(
        assignment_id = %assignment_id,
        order_id = %accepted.order_id,
        courier_id = %accepted.courier_id,
        "assignment accepted"
    );

    Ok(accepted)
}

async fn capture_snapshot(
    state: &AppState,
    assignment: &Assignment,
) -> Result<AssignmentSnapshot, AppError> {
    let timeout = state.settings.store_timeout;

    let order = bounded(timeout, "order book", state.orders.order(assignment.order_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", assignment.order_id)))?;
    let customer = bounded(timeout, "directory", state.directory.customer(assignment.customer_id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("customer {} not found", assignment.customer_id))
        })?;
    let restaurant = bounded(
        timeout,
        "catalog",
        state.catalog.restaurant(assignment.restaurant_id),
    )
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!("restaurant {} not found", assignment.restaurant_id))
    })?;

    Ok(AssignmentSnapshot {
        order: OrderSnapshot {
            id: order.id,
            lines: order.lines,
            total_amount: order.total_amount,
            status: order.status,
        },
        customer: PartySnapshot {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            address: customer.address,
            location: customer.location,
        },
        restaurant: PartySnapshot {
            id: restaurant.id,
            name: restaurant.name,
            phone: restaurant.phone,
            address: restaurant.address,
            location: restaurant.location,
        },
        captured_at: Utc::now(),
    })
}

pub fn update_status(
    state: &AppState,
    assignment_id: Uuid,
    next: AssignmentStatus,
) -> Result<Assignment, AppError> {
    let next = parse_courier_target(next)?;

    let updated = {
        let mut record = state
            .assignments
            .get_mut(&assignment_id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {assignment_id} not found")))?;
        transition(&mut record, next, Utc::now())?;
        record.clone()
    };

    if updated.status == AssignmentStatus::Delivered {
        finish_delivery(state, &updated);
    }
    record_transition(state, &updated);

    info!(
        assignment_id = %assignment_id,
        status = updated.status.as_str(),
        "assignment status updated"
    );

    Ok(updated)
}

/// Withdraws an offer or an accepted delivery. Cancelling an accepted
/// assignment frees the order so the other outstanding offers can be taken.
pub fn cancel(state: &AppState, assignment_id: Uuid) -> Result<Assignment, AppError> {
    let (cancelled, was_accepted) = {
        let mut record = state
            .assignments
            .get_mut(&assignment_id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {assignment_id} not found")))?;
        let was_accepted = record.status == AssignmentStatus::Accepted;
        transition(&mut record, AssignmentStatus::Cancelled, Utc::now())?;
        (record.clone(), was_accepted)
    };

    if was_accepted {
        release_claim(state, cancelled.order_id, assignment_id);
        finish_delivery(state, &cancelled);
    }
    record_transition(state, &cancelled);

    info!(
        assignment_id = %assignment_id,
        order_id = %cancelled.order_id,
        was_accepted,
        "assignment cancelled"
    );

    Ok(cancelled)
}

/// Stores the courier's new position and, when the courier is on a
/// delivery, refreshes its live distances and optionally advances it.
pub async fn update_courier_position_and_track(
    state: &AppState,
    courier_id: Uuid,
    location: Coordinate,
    status: Option<AssignmentStatus>,
) -> Result<Tracking, AppError> {
    location.validate()?;
    let target = status.map(parse_courier_target).transpose()?;

    let _guard = state.courier_locks.lock(courier_id).await;

    bounded(
        state.settings.store_timeout,
        "directory",
        state.directory.set_courier_location(courier_id, location),
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;

    let active_id = state
        .active_by_courier
        .get(&courier_id)
        .map(|entry| *entry.value());

    let Some(active_id) = active_id else {
        debug!(courier_id = %courier_id, "position stored; courier idle");
        return Ok(Tracking::Idle);
    };

    let (tracked, transitioned) = {
        let mut record = state
            .assignments
            .get_mut(&active_id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {active_id} not found")))?;
        let now = Utc::now();

        let transitioned = match target {
            Some(next) => {
                transition(&mut record, next, now)?;
                true
            }
            None => false,
        };

        refresh_distances(&mut record, &location);
        record.updated_at = now;
        (record.clone(), transitioned)
    };

    if transitioned {
        if tracked.status == AssignmentStatus::Delivered {
            finish_delivery(state, &tracked);
        }
        record_transition(state, &tracked);
    }
    state.emit(DispatchEvent::PositionTracked(tracked.clone()));

    debug!(
        courier_id = %courier_id,
        assignment_id = %tracked.id,
        pickup_distance_km = tracked.pickup_distance_km,
        drop_distance_km = tracked.drop_distance_km,
        "courier position tracked"
    );

    Ok(Tracking::Active { assignment: tracked })
}

fn refresh_distances(assignment: &mut Assignment, courier: &Coordinate) {
    assignment.pickup_distance_km = distance_km(courier, &assignment.restaurant_location);
    assignment.drop_distance_km = match assignment.status {
        AssignmentStatus::Picked | AssignmentStatus::Delivered => {
            distance_km(courier, &assignment.customer_location)
        }
        _ => distance_km(&assignment.restaurant_location, &assignment.customer_location),
    };
}

pub fn post_message(
    state: &AppState,
    assignment_id: Uuid,
    sender: ChatSender,
    text: &str,
) -> Result<Assignment, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("message cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::InvalidInput(format!(
            "message longer than {MAX_MESSAGE_LEN} characters"
        )));
    }

    let updated = {
        let mut record = state
            .assignments
            .get_mut(&assignment_id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {assignment_id} not found")))?;
        if !record.status.is_active() {
            return Err(AppError::InvalidState(format!(
                "assignment {assignment_id} is {:?}; chat is only open during delivery",
                record.status
            )));
        }

        let now = Utc::now();
        record.chat.push(ChatMessage {
            sender,
            text: text.to_string(),
            sent_at: now,
        });
        record.updated_at = now;
        record.clone()
    };

    state.emit(DispatchEvent::MessagePosted(updated.clone()));
    Ok(updated)
}

pub fn get(state: &AppState, assignment_id: Uuid) -> Result<Assignment, AppError> {
    state
        .assignments
        .get(&assignment_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("assignment {assignment_id} not found")))
}

/// Assignments for an order. Once a courier has claimed it, only the
/// claimed assignment is returned.
pub fn for_order(state: &AppState, order_id: Uuid) -> Vec<Assignment> {
    let claimed = state.claims.get(&order_id).map(|entry| *entry.value());
    let mut assignments: Vec<Assignment> = history_for_order(state, order_id)
        .into_iter()
        .filter(|a| claimed.is_none_or(|holder| holder == a.id))
        .collect();
    sort_nearest_first(&mut assignments);
    assignments
}

/// A courier's offers and deliveries, newest first, without offers on
/// orders someone else already took.
pub fn for_courier(state: &AppState, courier_id: Uuid) -> Vec<Assignment> {
    let mut assignments: Vec<Assignment> = state
        .assignments
        .iter()
        .filter(|entry| entry.courier_id == courier_id)
        .map(|entry| entry.value().clone())
        .collect();
    assignments.retain(|a| !is_moot(state, a));
    assignments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    assignments
}

fn history_for_order(state: &AppState, order_id: Uuid) -> Vec<Assignment> {
    state
        .assignments
        .iter()
        .filter(|entry| entry.order_id == order_id)
        .map(|entry| entry.value().clone())
        .collect()
}

fn is_moot(state: &AppState, assignment: &Assignment) -> bool {
    assignment.status == AssignmentStatus::Pending
        && state.claims.contains_key(&assignment.order_id)
}

fn release_claim(state: &AppState, order_id: Uuid, assignment_id: Uuid) {
    state
        .claims
        .remove_if(&order_id, |_, holder| *holder == assignment_id);
}

fn release_courier(state: &AppState, courier_id: Uuid, assignment_id: Uuid) {
    state
        .active_by_courier
        .remove_if(&courier_id, |_, holder| *holder == assignment_id);
}

/// The courier is free again once a delivery ends or is withdrawn.
fn finish_delivery(state: &AppState, assignment: &Assignment) {
    release_courier(state, assignment.courier_id, assignment.id);
    state.metrics.active_deliveries.dec();
}

fn courier_busy(courier_id: Uuid) -> AppError {
    AppError::InvalidState(format!(
        "courier {courier_id} is already on another delivery"
    ))
}

fn sort_nearest_first(assignments: &mut [Assignment]) {
    assignments.sort_by(|a, b| a.pickup_distance_km.total_cmp(&b.pickup_distance_km));
}

fn record_transition(state: &AppState, assignment: &Assignment) {
    state
        .metrics
        .assignment_transitions_total
        .with_label_values(&[assignment.status.as_str()])
        .inc();
    state.emit(DispatchEvent::StatusChanged(assignment.clone()));
}
