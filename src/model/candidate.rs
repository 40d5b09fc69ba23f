use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Recruitment pipeline stages. No side effects attach to a stage change;
/// the set itself is the only validation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CandidateStatus {
    Applied,
    Screening,
    Interview,
    Offered,
    Hired,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Candidate {
    pub id: u64,
    pub tenant_id: u64,
    pub job_posting_id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "applied")]
    pub status: String,
    pub resume_url: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub applied_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stages_round_trip_through_storage_form() {
        for status in [
            CandidateStatus::Applied,
            CandidateStatus::Screening,
            CandidateStatus::Interview,
            CandidateStatus::Offered,
            CandidateStatus::Hired,
            CandidateStatus::Rejected,
        ] {
            assert_eq!(
                CandidateStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn unknown_stage_is_rejected() {
        assert!(CandidateStatus::from_str("ghosted").is_err());
    }
}
