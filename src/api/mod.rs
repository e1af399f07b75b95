pub mod allowance;
pub mod appraisal;
pub mod ctc;
pub mod department;
pub mod employee;
pub mod fixed_allowance;
pub mod helpdesk;
pub mod holiday;
pub mod leave;
pub mod ltc;
pub mod message;
pub mod notification;
pub mod salary;
pub mod travel_expenditure;
pub mod user;

use actix_web::HttpResponse;
use serde_json::{Value, json};
use sqlx::MySqlPool;

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::line_item::validate_amount;
use crate::model::role::Role;
use crate::model::salary::validate_period;
use crate::service::approval::{self, ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::db_utils::{Filters, SqlValue, build_update_sql, execute_update};

/// Employee id of the lead `employee_id` reports to.
pub(crate) async fn lead_of(pool: &MySqlPool, employee_id: u64) -> Result<Option<u64>, ApiError> {
    let lead = sqlx::query_scalar::<_, Option<u64>>(
        "SELECT reporting_to FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;

    Ok(lead.flatten())
}

/// Narrows a list of employee-owned records to what the caller may see.
///
/// Privileged roles may filter by any employee. Everyone else is pinned to
/// their own records; with `reportees` set, leads also see records of the
/// people reporting to them.
pub(crate) fn scope_to_caller(
    filters: &mut Filters,
    auth: &AuthUser,
    privileged: &[Role],
    requested: Option<u64>,
    reportees: bool,
) -> Result<(), ApiError> {
    if reportees && auth.role == Role::Lead && !auth.has_any(privileged) {
        let own = auth.employee()?;
        filters
            .raw(
                "employee_id = ? OR employee_id IN (SELECT id FROM employees WHERE reporting_to = ?)",
                vec![SqlValue::U64(own), SqlValue::U64(own)],
            )
            .eq_opt("employee_id", requested);
        return Ok(());
    }

    let employee = auth.scoped_employee(privileged, requested)?;
    filters.eq_opt("employee_id", employee);
    Ok(())
}

/// Checks read access to a single employee-owned record.
pub(crate) async fn ensure_can_view(
    pool: &MySqlPool,
    auth: &AuthUser,
    privileged: &[Role],
    owner: u64,
    reportees: bool,
) -> Result<(), ApiError> {
    if auth.has_any(privileged) || auth.employee_id == Some(owner) {
        return Ok(());
    }
    if reportees && auth.role == Role::Lead && auth.employee_id.is_some() {
        if lead_of(pool, owner).await? == auth.employee_id {
            return Ok(());
        }
    }
    Err(ApiError::forbidden("You can only access your own records"))
}

/// Shared body of the approve / reject endpoints.
pub(crate) async fn decision_response(
    pool: &MySqlPool,
    kind: ApprovalKind,
    id: u64,
    decision: Decision,
    request: DecisionRequest,
    auth: &AuthUser,
    update: DecisionUpdate<'_>,
) -> Result<HttpResponse, ApiError> {
    let status = approval::decide(
        pool,
        kind,
        id,
        decision,
        request.remarks.as_deref(),
        auth,
        update,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("{} {}", kind.label(), status),
        "status": status
    })))
}

/// Applies a whitelisted partial update to a record that is still pending.
pub(crate) async fn update_pending(
    pool: &MySqlPool,
    table: &str,
    body: &Value,
    allowed: &[&str],
    id: u64,
) -> Result<(), ApiError> {
    let mut update = build_update_sql(table, body, allowed, id)?;
    update.sql.push_str(" AND status = 'pending'");

    if execute_update(pool, update).await? == 0 {
        return Err(ApiError::bad_request("Only pending records can be changed"));
    }
    Ok(())
}

/// Reads an optional money field from a partial update body.
pub(crate) fn amount_field(body: &Value, field: &str) -> Result<Option<f64>, ApiError> {
    match body.get(field) {
        None => Ok(None),
        Some(value) => {
            let amount = value
                .as_f64()
                .ok_or_else(|| ApiError::bad_request(format!("{field} must be a number")))?;
            validate_amount(field, amount).map_err(ApiError::BadRequest)?;
            Ok(Some(amount))
        }
    }
}

/// Reads an optional name field from a partial update body; when present it
/// must be a non-blank string.
pub(crate) fn name_field(body: &Value, field: &str) -> Result<Option<String>, ApiError> {
    match body.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Some(name.to_string()))
            .ok_or_else(|| ApiError::bad_request(format!("{field} must be a non-empty string"))),
    }
}

/// Validates month / year in a partial update against the stored period.
pub(crate) fn period_fields(body: &Value, month: u32, year: u32) -> Result<(), ApiError> {
    let read = |field: &str, current: u32| -> Result<u32, ApiError> {
        match body.get(field) {
            None => Ok(current),
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| ApiError::bad_request(format!("{field} must be a number"))),
        }
    };

    validate_period(read("month", month)?, read("year", year)?).map_err(ApiError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::HR_ROLES;

    fn caller(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "caller".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_only_list_their_own_records() {
        let mut filters = Filters::new();
        scope_to_caller(
            &mut filters,
            &caller(Role::Employee, Some(4)),
            HR_ROLES,
            None,
            true,
        )
        .unwrap();
        assert_eq!(filters.where_sql(), " WHERE employee_id = ?");
        assert_eq!(filters.values(), &[SqlValue::U64(4)]);
    }

    #[test]
    fn leads_also_list_reportees() {
        let mut filters = Filters::new();
        scope_to_caller(
            &mut filters,
            &caller(Role::Lead, Some(7)),
            HR_ROLES,
            Some(9),
            true,
        )
        .unwrap();
        assert_eq!(
            filters.where_sql(),
            " WHERE (employee_id = ? OR employee_id IN (SELECT id FROM employees WHERE reporting_to = ?)) AND employee_id = ?"
        );
        assert_eq!(filters.values().len(), 3);

        // without reportee reach a lead is just an employee
        let mut filters = Filters::new();
        let lead = caller(Role::Lead, Some(7));
        assert!(
            scope_to_caller(&mut filters, &lead, HR_ROLES, Some(9), false)
                .is_err()
        );
    }

    #[test]
    fn privileged_roles_filter_freely() {
        let mut filters = Filters::new();
        scope_to_caller(
            &mut filters,
            &caller(Role::Hr, None),
            HR_ROLES,
            None,
            true,
        )
        .unwrap();
        assert_eq!(filters.where_sql(), "");
    }

    #[test]
    fn partial_update_field_checks() {
        let body = json!({ "amount": 250.5, "month": 13 });
        assert_eq!(amount_field(&body, "amount").unwrap(), Some(250.5));
        assert_eq!(amount_field(&body, "missing").unwrap(), None);
        assert!(amount_field(&json!({ "amount": -1 }), "amount").is_err());
        assert!(amount_field(&json!({ "amount": "ten" }), "amount").is_err());

        assert_eq!(
            name_field(&json!({ "name": " Night shift " }), "name").unwrap(),
            Some("Night shift".to_string())
        );
        assert_eq!(name_field(&body, "name").unwrap(), None);
        for bad in [json!(""), json!("   "), json!(5), json!(null)] {
            assert!(name_field(&json!({ "name": bad }), "name").is_err());
        }

        assert!(period_fields(&body, 1, 2026).is_err());
        assert!(period_fields(&json!({ "year": 2027 }), 1, 2026).is_ok());
        assert!(period_fields(&json!({ "month": "x" }), 1, 2026).is_err());
    }
}
