//! Assignment state machine.
//!
//! ```text
//! Pending --accept--> Accepted --pick--> Picked --deliver--> Delivered
//! Pending --cancel--> Cancelled
//! Accepted --cancel--> Cancelled
//! ```
//!
//! Transitions are applied to a record the caller already holds exclusively
//! (a `DashMap` write guard), so the check against the current status and the
//! write happen atomically.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::assignment::{Assignment, AssignmentStatus};

pub fn can_transition(from: AssignmentStatus, to: AssignmentStatus) -> bool {
    use AssignmentStatus::*;

    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Cancelled)
            | (Accepted, Picked)
            | (Accepted, Cancelled)
            | (Picked, Delivered)
    )
}

/// Moves `assignment` to `next`, stamping the matching timestamp.
pub fn transition(
    assignment: &mut Assignment,
    next: AssignmentStatus,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    let current = assignment.status;
    if !can_transition(current, next) {
        return Err(AppError::InvalidState(format!(
            "assignment {} cannot move from {current:?} to {next:?}",
            assignment.id
        )));
    }

    match next {
        AssignmentStatus::Accepted => assignment.accepted_at = Some(at),
        AssignmentStatus::Picked => assignment.picked_at = Some(at),
        AssignmentStatus::Delivered => assignment.delivered_at = Some(at),
        AssignmentStatus::Cancelled => assignment.cancelled_at = Some(at),
        AssignmentStatus::Pending => {}
    }

    assignment.status = next;
    assignment.updated_at = at;
    Ok(())
}

/// Targets a courier may request through a status update. Accepting and
/// cancelling have their own entry points.
pub fn parse_courier_target(next: AssignmentStatus) -> Result<AssignmentStatus, AppError> {
    match next {
        AssignmentStatus::Picked | AssignmentStatus::Delivered => Ok(next),
        other => Err(AppError::InvalidInput(format!(
            "status update only accepts Picked or Delivered, got {other:?}"
        ))),
    }
}
