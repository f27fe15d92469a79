//! Invariant-bearing progress logic, kept pure so the update rules can be
//! exercised without a database. The service applies these inside its
//! read-modify-write transaction.

use chrono::{DateTime, Utc};
use entities::progress::{Model, WatchEntry, WatchHistory};
use uuid::Uuid;

/// Crossing this percentage latches `is_completed` and unlocks certificates.
pub const COMPLETION_THRESHOLD: f64 = 30.0;

/// Most recent checkpoints retained per record, oldest evicted first.
pub const WATCH_HISTORY_CAP: usize = 10;

/// A zeroed record for a pair that has no persisted progress yet.
pub fn new_record(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Model {
    Model {
        id: Uuid::new_v4(),
        user_id,
        course_id,
        completion_percentage: 0.0,
        last_watched_position: 0.0,
        is_completed: false,
        completed_at: None,
        watch_history: WatchHistory::default(),
        created_at: now,
        updated_at: now,
    }
}

/// Reject malformed input before anything touches the store. Negative values
/// are errors, not something to clamp.
pub fn validate_update(position: f64, completion_percentage: f64) -> Result<(), String> {
    if !position.is_finite() || position < 0.0 {
        return Err("Position must be a non-negative number".into());
    }
    if !completion_percentage.is_finite() || completion_percentage < 0.0 {
        return Err("Completion percentage must be a non-negative number".into());
    }
    Ok(())
}

/// Apply one progress report to a record.
///
/// The reported percentage overwrites the stored one (clamped at 100); it is
/// deliberately not a running maximum, so a lower report lowers the stored
/// value while `is_completed` stays latched.
pub fn apply_update(record: &mut Model, position: f64, reported_percentage: f64, now: DateTime<Utc>) {
    record.last_watched_position = position;
    record.completion_percentage = reported_percentage.min(100.0);

    if record.completion_percentage >= COMPLETION_THRESHOLD && !record.is_completed {
        record.is_completed = true;
        record.completed_at = Some(now);
    }

    push_checkpoint(&mut record.watch_history, WatchEntry { timestamp: now, position });
    record.updated_at = now;
}

/// Append a checkpoint, keeping only the `WATCH_HISTORY_CAP` most recent.
pub fn push_checkpoint(history: &mut WatchHistory, entry: WatchEntry) {
    history.0.push(entry);
    if history.0.len() > WATCH_HISTORY_CAP {
        let excess = history.0.len() - WATCH_HISTORY_CAP;
        history.0.drain(..excess);
    }
}

/// Zero every progress field. The record itself survives; only reset may
/// clear the completion latch.
pub fn apply_reset(record: &mut Model, now: DateTime<Utc>) {
    record.completion_percentage = 0.0;
    record.last_watched_position = 0.0;
    record.is_completed = false;
    record.completed_at = None;
    record.watch_history = WatchHistory::default();
    record.updated_at = now;
}

pub fn is_eligible(completion_percentage: f64) -> bool {
    completion_percentage >= COMPLETION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Model {
        new_record(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn percentage_is_clamped_to_100() {
        let mut rec = record();
        apply_update(&mut rec, 10.0, 250.0, Utc::now());
        assert_eq!(rec.completion_percentage, 100.0);
    }

    #[test]
    fn threshold_latches_completion_once() {
        let mut rec = record();
        apply_update(&mut rec, 120.0, 25.0, Utc::now());
        assert!(!rec.is_completed);
        assert!(rec.completed_at.is_none());

        apply_update(&mut rec, 300.0, 35.0, Utc::now());
        assert!(rec.is_completed);
        let first_completed_at = rec.completed_at.expect("completed_at set on latch");

        // Crossing the threshold again must not move completed_at.
        apply_update(&mut rec, 400.0, 90.0, Utc::now());
        assert_eq!(rec.completed_at, Some(first_completed_at));
    }

    #[test]
    fn lower_report_overwrites_percentage_but_keeps_latch() {
        // Documents the overwrite-not-max policy: the stored percentage
        // follows the latest report even downward, while the latch holds.
        let mut rec = record();
        apply_update(&mut rec, 300.0, 50.0, Utc::now());
        assert!(rec.is_completed);

        apply_update(&mut rec, 60.0, 10.0, Utc::now());
        assert_eq!(rec.completion_percentage, 10.0);
        assert!(rec.is_completed);
        assert!(rec.completed_at.is_some());
    }

    #[test]
    fn watch_history_keeps_last_ten_in_order() {
        let mut rec = record();
        for i in 1..=11 {
            apply_update(&mut rec, i as f64, 5.0, Utc::now());
        }
        let positions: Vec<f64> = rec.watch_history.0.iter().map(|e| e.position).collect();
        assert_eq!(positions, (2..=11).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut rec = record();
        apply_update(&mut rec, 300.0, 80.0, Utc::now());
        apply_reset(&mut rec, Utc::now());

        assert_eq!(rec.completion_percentage, 0.0);
        assert_eq!(rec.last_watched_position, 0.0);
        assert!(!rec.is_completed);
        assert!(rec.completed_at.is_none());
        assert!(rec.watch_history.0.is_empty());
    }

    #[test]
    fn rejects_negative_input() {
        assert!(validate_update(-1.0, 50.0).is_err());
        assert!(validate_update(10.0, -0.1).is_err());
        assert!(validate_update(10.0, f64::NAN).is_err());
        assert!(validate_update(0.0, 0.0).is_ok());
    }

    #[test]
    fn eligibility_boundary_is_inclusive() {
        assert!(!is_eligible(29.9));
        assert!(is_eligible(30.0));
        assert!(is_eligible(100.0));
    }
}
