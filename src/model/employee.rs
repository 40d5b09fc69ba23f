use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "tenant_id": 1,
        "user_id": null,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "gender": "male",
        "hire_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    pub tenant_id: u64,

    /// Linked login account, if any
    pub user_id: Option<u64>,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    pub gender: Option<String>,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}

/// Next human-readable code for a tenant: max numeric suffix among existing
/// codes with this prefix, plus one, zero-padded to three digits. Codes that
/// do not parse as `<prefix><digits>` are ignored. The caller runs this over
/// a `FOR UPDATE` scan; the unique key on `(tenant_id, employee_code)` is
/// what actually guarantees no duplicates under concurrent inserts.
pub fn next_employee_code<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let max = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", prefix, max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_code_for_a_tenant() {
        assert_eq!(next_employee_code("EMP-", []), "EMP-001");
    }

    #[test]
    fn increments_past_the_maximum() {
        let codes = ["EMP-001", "EMP-007", "EMP-003"];
        assert_eq!(next_employee_code("EMP-", codes), "EMP-008");
    }

    #[test]
    fn ignores_foreign_and_malformed_codes() {
        let codes = ["EMP-002", "CTR-900", "EMP-XYZ", "EMP-"];
        assert_eq!(next_employee_code("EMP-", codes), "EMP-003");
    }

    #[test]
    fn padding_widens_beyond_three_digits() {
        assert_eq!(next_employee_code("EMP-", ["EMP-999"]), "EMP-1000");
    }

    #[test]
    fn respects_configured_prefix() {
        assert_eq!(next_employee_code("STAFF/", ["STAFF/041"]), "STAFF/042");
    }
}
