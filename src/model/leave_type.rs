use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "tenant_id": 1,
        "name": "Annual Leave",
        "short_code": "AL",
        "is_paid": true,
        "requires_approval": true,
        "default_balance": 20.0,
        "accrual_rate": 1.67,
        "applicable_gender": null,
        "is_active": true
    })
)]
pub struct LeaveType {
    pub id: u64,
    pub tenant_id: u64,
    pub name: String,
    pub short_code: Option<String>,
    pub is_paid: bool,
    pub requires_approval: bool,
    pub default_balance: f64,
    pub accrual_rate: f64,
    pub applicable_gender: Option<String>,
    pub is_active: bool,
}
