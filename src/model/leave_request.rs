use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a leave request. Stored as a lowercase string column;
/// `pending` is the only state with outgoing transitions apart from the
/// admin cancellation of an approved request (which refunds the balance).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Rejected | LeaveStatus::Cancelled)
    }
}

/// Inclusive span in days; a single-day request covers 1 day.
/// Callers must have validated `end >= start` first.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub tenant_id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub request_date: Option<DateTime<Utc>>,
    pub approver_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approval_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub attachment_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn span_is_inclusive() {
        assert_eq!(inclusive_days(d("2024-08-01"), d("2024-08-05")), 5);
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(inclusive_days(d("2024-08-01"), d("2024-08-01")), 1);
    }

    #[test]
    fn span_crosses_month_boundary() {
        assert_eq!(inclusive_days(d("2024-08-30"), d("2024-09-02")), 4);
    }

    #[test]
    fn pending_can_reach_every_outcome() {
        use LeaveStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn approved_can_only_be_cancelled() {
        use LeaveStatus::*;
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn rejected_and_cancelled_are_terminal() {
        use LeaveStatus::*;
        for status in [Rejected, Cancelled] {
            assert!(status.is_terminal());
            for next in [Pending, Approved, Rejected, Cancelled] {
                assert!(!status.can_transition_to(next));
            }
        }
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            let stored = status.to_string();
            assert_eq!(stored, stored.to_lowercase());
            assert_eq!(LeaveStatus::from_str(&stored).unwrap(), status);
        }
    }
}
