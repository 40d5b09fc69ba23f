use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Balance row joined with its leave-type name for display.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalanceView {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    #[schema(example = "Annual Leave")]
    pub leave_type: String,
    pub balance: f64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_updated: Option<DateTime<Utc>>,
}
