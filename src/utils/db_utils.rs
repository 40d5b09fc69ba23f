use serde_json::Value;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build a dynamic UPDATE from a JSON patch. Only columns named in
/// `allowed` may appear; anything else is a validation error naming the
/// field. The WHERE clause always carries the tenant guard.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
    tenant_id: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::validation("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::validation(format!(
            "Field '{}' cannot be updated",
            unknown
        )));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ? AND tenant_id = ?",
        table, set_clause, id_column
    );

    let mut values = Vec::with_capacity(obj.len() + 2);

    // Convert JSON values -> SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) =
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ApiError::validation("Unsupported JSON value type")),
        }
    }

    values.push(SqlValue::U64(id_value));
    values.push(SqlValue::U64(tenant_id));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    pool: &MySqlPool,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["first_name", "status", "hire_date"];

    #[test]
    fn builds_update_with_tenant_guard() {
        let patch = json!({"first_name": "Jane", "status": "inactive"});
        let update = build_update_sql("employees", &patch, ALLOWED, "id", 9, 3).unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET first_name = ?, status = ? WHERE id = ? AND tenant_id = ?"
        );
        assert_eq!(update.values.len(), 4);
    }

    #[test]
    fn date_strings_become_dates() {
        let patch = json!({"hire_date": "2024-01-15"});
        let update = build_update_sql("employees", &patch, ALLOWED, "id", 1, 1).unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }

    #[test]
    fn unknown_field_is_rejected_by_name() {
        let patch = json!({"employee_code": "EMP-999"});
        let err = build_update_sql("employees", &patch, ALLOWED, "id", 1, 1).unwrap_err();
        assert!(err.to_string().contains("employee_code"));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let patch = json!({});
        assert!(build_update_sql("employees", &patch, ALLOWED, "id", 1, 1).is_err());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let patch = json!(["not", "an", "object"]);
        assert!(build_update_sql("employees", &patch, ALLOWED, "id", 1, 1).is_err());
    }
}
