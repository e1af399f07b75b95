use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, MySql, MySqlPool};
use tracing::debug;

use crate::error::ApiError;
use crate::utils::pagination::Page;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Null,
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::U64(u64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                SqlValue::String(v) => query.bind(v.clone()),
                SqlValue::I64(v) => query.bind(*v),
                SqlValue::U64(v) => query.bind(*v),
                SqlValue::F64(v) => query.bind(*v),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
                SqlValue::Time(v) => query.bind(*v),
                SqlValue::DateTime(v) => query.bind(*v),
                SqlValue::Null => query.bind(None::<String>),
            };
        }
        query
    }};
}

fn bind_as<'q, O>(
    query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    bind_values!(query, values)
}

fn bind_scalar<'q, O>(
    query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    bind_values!(query, values)
}

/// ===============================
/// WHERE clause builder
/// ===============================
#[derive(Debug, Default)]
pub struct Filters {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = ?`
    pub fn eq(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.conditions.push(format!("{column} = ?"));
        self.values.push(value.into());
        self
    }

    /// `column = ?` when a value is present
    pub fn eq_opt<V: Into<SqlValue>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.eq(column, v);
        }
        self
    }

    /// Arbitrary condition with its own placeholders.
    pub fn raw(&mut self, condition: &str, values: Vec<SqlValue>) -> &mut Self {
        self.conditions.push(format!("({condition})"));
        self.values.extend(values);
        self
    }

    /// Case-insensitive substring match over several columns.
    pub fn search(&mut self, columns: &[&str], needle: &str) -> &mut Self {
        let needle = needle.trim();
        if needle.is_empty() || columns.is_empty() {
            return self;
        }
        let like = format!("%{needle}%");
        let clause = columns
            .iter()
            .map(|c| format!("{c} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let values = columns.iter().map(|_| SqlValue::String(like.clone())).collect();
        self.raw(&clause, values)
    }

    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Runs a COUNT and a LIMIT/OFFSET query against one table.
pub async fn fetch_page<T>(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    filters: &Filters,
    order_by: &str,
    page: Page,
) -> Result<(Vec<T>, i64), sqlx::Error>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let where_sql = filters.where_sql();

    let count_sql = format!("SELECT COUNT(*) FROM {table}{where_sql}");
    debug!(sql = %count_sql, values = ?filters.values(), "Counting rows");
    let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), filters.values())
        .fetch_one(pool)
        .await?;

    let data_sql =
        format!("SELECT {columns} FROM {table}{where_sql} ORDER BY {order_by} LIMIT ? OFFSET ?");
    debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching rows");
    let rows = bind_as(sqlx::query_as::<_, T>(&data_sql), filters.values())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Runs an unpaginated SELECT.
pub async fn fetch_all<T>(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    filters: &Filters,
    order_by: &str,
) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let sql = format!(
        "SELECT {columns} FROM {table}{} ORDER BY {order_by}",
        filters.where_sql()
    );
    debug!(sql = %sql, values = ?filters.values(), "Fetching rows");
    bind_as(sqlx::query_as::<_, T>(&sql), filters.values())
        .fetch_all(pool)
        .await
}

pub async fn fetch_by_id<T>(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    id: u64,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let sql = format!("SELECT {columns} FROM {table} WHERE id = ?");
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Like [`fetch_by_id`] but maps a missing row to 404.
pub async fn find_or_404<T>(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    id: u64,
    what: &str,
) -> Result<T, ApiError>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    fetch_by_id(pool, table, columns, id)
        .await?
        .ok_or_else(|| ApiError::not_found(what))
}

pub async fn delete_by_id(pool: &MySqlPool, table: &str, id: u64) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {table} WHERE id = ?");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn json_to_sql(column: &str, value: &Value) -> Result<SqlValue, ApiError> {
    let converted = match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
                SqlValue::Time(t)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ApiError::bad_request(format!("Invalid number for {column}")));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => {
            return Err(ApiError::bad_request(format!(
                "Unsupported value type for {column}"
            )));
        }
    };
    Ok(converted)
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may be updated; anything else is a 400.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ApiError::bad_request("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::bad_request(format!(
            "Field '{unknown}' cannot be updated"
        )));
    }

    // Stable column order regardless of map implementation
    let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    // Build SET clause
    let set_clause = entries
        .iter()
        .map(|(k, _)| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, set_clause);

    let mut values = Vec::with_capacity(entries.len() + 1);
    for (column, value) in entries {
        values.push(json_to_sql(column, value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    execute_sql(pool, &update.sql, &update.values).await
}

/// Executes a statement with positional values, returning affected rows.
pub async fn execute_sql(
    pool: &MySqlPool,
    sql: &str,
    values: &[SqlValue],
) -> Result<u64, sqlx::Error> {
    debug!(sql = %sql, values = ?values, "Executing statement");
    let query = bind_values!(sqlx::query(sql), values);
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_update_for_allowed_columns() {
        let payload = json!({ "name": "Finance", "code": null });
        let update = build_update_sql("departments", &payload, &["name", "code"], 4).unwrap();

        assert_eq!(update.sql, "UPDATE departments SET code = ?, name = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![
                SqlValue::Null,
                SqlValue::String("Finance".to_string()),
                SqlValue::U64(4)
            ]
        );
    }

    #[test]
    fn rejects_unknown_columns() {
        let payload = json!({ "name": "x", "id = 1; DROP TABLE users; --": 1 });
        let err = build_update_sql("departments", &payload, &["name"], 1).unwrap_err();
        assert!(err.to_string().contains("cannot be updated"));
    }

    #[test]
    fn rejects_empty_and_non_objects() {
        assert!(build_update_sql("t", &json!({}), &["a"], 1).is_err());
        assert!(build_update_sql("t", &json!([1, 2]), &["a"], 1).is_err());
        assert!(build_update_sql("t", &json!({ "a": [1] }), &["a"], 1).is_err());
    }

    #[test]
    fn converts_dates_and_numbers() {
        let payload = json!({ "dol": "2026-06-30", "reporting_to": 7, "rating": 4.5 });
        let update =
            build_update_sql("employees", &payload, &["dol", "reporting_to", "rating"], 2).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(
            update.values,
            vec![
                SqlValue::Date(date),
                SqlValue::F64(4.5),
                SqlValue::I64(7),
                SqlValue::U64(2)
            ]
        );
    }

    #[test]
    fn filters_render_where_clause() {
        let mut filters = Filters::new();
        assert_eq!(filters.where_sql(), "");

        filters
            .eq("status", "pending")
            .eq_opt("employee_id", Some(5u64))
            .eq_opt::<u32>("month", None)
            .search(&["first_name", "email"], " ali ");

        assert_eq!(
            filters.where_sql(),
            " WHERE status = ? AND employee_id = ? AND (first_name LIKE ? OR email LIKE ?)"
        );
        assert_eq!(filters.values().len(), 4);
        assert_eq!(filters.values()[3], SqlValue::String("%ali%".to_string()));
    }
}
