use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::assignment::AssignmentStatus;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub day: NaiveDate,
    pub created: u64,
    pub cancelled: u64,
    pub completed: u64,
}

fn on_day(at: Option<DateTime<Utc>>, day: NaiveDate) -> bool {
    at.is_some_and(|at| at.date_naive() == day)
}

/// Counts assignment activity for one UTC day.
pub fn daily_stats(state: &AppState, day: NaiveDate) -> DailyStats {
    let mut stats = DailyStats {
        day,
        created: 0,
        cancelled: 0,
        completed: 0,
    };

    for entry in state.assignments.iter() {
        let assignment = entry.value();

        if assignment.created_at.date_naive() == day {
            stats.created += 1;
        }
        if assignment.status == AssignmentStatus::Cancelled && on_day(assignment.cancelled_at, day)
        {
            stats.cancelled += 1;
        }
        if assignment.status == AssignmentStatus::Delivered && on_day(assignment.delivered_at, day)
        {
            stats.completed += 1;
        }
    }

    stats
}

pub fn today(state: &AppState) -> DailyStats {
    daily_stats(state, Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{daily_stats, today};
    use crate::engine::dispatch::{accept, assign, cancel, update_status};
    use crate::engine::fixtures::{self, MID_COURIER, NEAR_COURIER, ORDER};
    use crate::models::assignment::AssignmentStatus;

    #[tokio::test]
    async fn empty_history_counts_nothing() {
        let (state, _store) = fixtures::state();
        let stats = today(&state);
        assert_eq!((stats.created, stats.cancelled, stats.completed), (0, 0, 0));
    }

    #[tokio::test]
    async fn counts_follow_assignment_history() {
        let (state, _store) = fixtures::state();
        let offers = assign(&state, ORDER).await.unwrap();
        let near = offers.iter().find(|a| a.courier_id == NEAR_COURIER).unwrap().id;
        let mid = offers.iter().find(|a| a.courier_id == MID_COURIER).unwrap().id;

        cancel(&state, mid).unwrap();
        accept(&state, near).await.unwrap();
        update_status(&state, near, AssignmentStatus::Picked).unwrap();
        update_status(&state, near, AssignmentStatus::Delivered).unwrap();

        let stats = today(&state);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.completed, 1);

        let yesterday = daily_stats(&state, (Utc::now() - Duration::days(1)).date_naive());
        assert_eq!(
            (yesterday.created, yesterday.cancelled, yesterday.completed),
            (0, 0, 0)
        );
    }
}
