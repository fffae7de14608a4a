use serde::Serialize;
use uuid::Uuid;

use crate::models::assignment::Assignment;

/// What the engine publishes on the real-time channel. Each variant carries
/// the assignment as it is after the change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "assignment", rename_all = "snake_case")]
pub enum DispatchEvent {
    AssignmentCreated(Assignment),
    StatusChanged(Assignment),
    PositionTracked(Assignment),
    MessagePosted(Assignment),
}

impl DispatchEvent {
    pub fn assignment(&self) -> &Assignment {
        match self {
            DispatchEvent::AssignmentCreated(assignment)
            | DispatchEvent::StatusChanged(assignment)
            | DispatchEvent::PositionTracked(assignment)
            | DispatchEvent::MessagePosted(assignment) => assignment,
        }
    }

    pub fn concerns(&self, courier_id: Option<Uuid>, order_id: Option<Uuid>) -> bool {
        let assignment = self.assignment();
        courier_id.is_none_or(|id| assignment.courier_id == id)
            && order_id.is_none_or(|id| assignment.order_id == id)
    }
}
