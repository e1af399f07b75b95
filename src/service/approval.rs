//! Pending -> approved | rejected transitions shared by every record type
//! that goes through sign-off.

use derive_more::Display;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::utils::db_utils::{SqlValue, execute_sql};
use crate::utils::notify::notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalKind {
    Leave,
    Allowance,
    FixedAllowance,
    Ltc,
    TravelExpenditure,
}

impl ApprovalKind {
    pub fn table(self) -> &'static str {
        match self {
            ApprovalKind::Leave => "leaves",
            ApprovalKind::Allowance => "allowances",
            ApprovalKind::FixedAllowance => "fixed_allowances",
            ApprovalKind::Ltc => "ltc_claims",
            ApprovalKind::TravelExpenditure => "travel_expenditures",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApprovalKind::Leave => "Leave request",
            ApprovalKind::Allowance => "Allowance",
            ApprovalKind::FixedAllowance => "Fixed allowance",
            ApprovalKind::Ltc => "LTC claim",
            ApprovalKind::TravelExpenditure => "Travel expenditure",
        }
    }

    fn link(self, id: u64) -> String {
        let base = match self {
            ApprovalKind::Leave => "/leaves",
            ApprovalKind::Allowance => "/allowances",
            ApprovalKind::FixedAllowance => "/fixed-allowances",
            ApprovalKind::Ltc => "/ltc",
            ApprovalKind::TravelExpenditure => "/travel-expenditures",
        };
        format!("{base}/{id}")
    }

    /// Roles allowed to sign off this kind of record.
    pub fn approvers(self) -> &'static [Role] {
        match self {
            ApprovalKind::Leave => &[Role::Lead, Role::Hr, Role::Admin],
            ApprovalKind::Allowance
            | ApprovalKind::FixedAllowance
            | ApprovalKind::TravelExpenditure => &[Role::Accounts, Role::Admin],
            ApprovalKind::Ltc => &[Role::Hr, Role::Accounts, Role::Admin],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDenied {
    #[display(fmt = "Your role cannot approve this record")]
    RoleNotAllowed,
    #[display(fmt = "You cannot approve your own record")]
    SelfApproval,
    #[display(fmt = "Leads can only approve records of their reportees")]
    NotReportee,
    #[display(fmt = "Remarks are required when rejecting")]
    RemarksRequired,
    #[display(fmt = "Record not found or already processed")]
    NotPending,
}

impl From<ApprovalDenied> for ApiError {
    fn from(denied: ApprovalDenied) -> Self {
        match denied {
            ApprovalDenied::RemarksRequired | ApprovalDenied::NotPending => {
                ApiError::BadRequest(denied.to_string())
            }
            _ => ApiError::Forbidden(denied.to_string()),
        }
    }
}

/// Request body for approve / reject endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DecisionRequest {
    #[schema(example = "Enjoy your time off", nullable = true)]
    pub remarks: Option<String>,
}

/// Checks whether `actor` may decide a record owned by `owner`, whose lead
/// is `owner_lead`.
pub fn authorize(
    kind: ApprovalKind,
    actor: &AuthUser,
    owner: u64,
    owner_lead: Option<u64>,
) -> Result<(), ApprovalDenied> {
    if actor.employee_id == Some(owner) {
        return Err(ApprovalDenied::SelfApproval);
    }
    if !kind.approvers().contains(&actor.role) {
        return Err(ApprovalDenied::RoleNotAllowed);
    }
    if actor.role == Role::Lead && (owner_lead.is_none() || owner_lead != actor.employee_id) {
        return Err(ApprovalDenied::NotReportee);
    }
    Ok(())
}

/// Normalises remarks; a rejection must say why.
pub fn check_remarks(
    decision: Decision,
    remarks: Option<&str>,
) -> Result<Option<String>, ApprovalDenied> {
    let remarks = remarks
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    if decision == Decision::Reject && remarks.is_none() {
        return Err(ApprovalDenied::RemarksRequired);
    }
    Ok(remarks)
}

/// Columns written together with a decision, and predicates the row must
/// still satisfy when the statement runs. Each guard is a SQL condition
/// with a single `?` placeholder.
#[derive(Debug, Default)]
pub struct DecisionUpdate<'a> {
    pub set: &'a [(&'a str, SqlValue)],
    pub guard: &'a [(&'a str, SqlValue)],
}

fn decision_statement(
    kind: ApprovalKind,
    id: u64,
    next: ApprovalStatus,
    remarks: Option<String>,
    actor: &AuthUser,
    update: &DecisionUpdate<'_>,
) -> (String, Vec<SqlValue>) {
    let mut sql = format!(
        "UPDATE {} SET status = ?, remarks = ?, actioned_by = ?, actioned_at = UTC_TIMESTAMP()",
        kind.table()
    );
    let mut values = vec![
        SqlValue::from(next.as_ref()),
        remarks.map_or(SqlValue::Null, SqlValue::String),
        SqlValue::U64(actor.user_id),
    ];
    for (column, value) in update.set {
        sql.push_str(&format!(", {column} = ?"));
        values.push(value.clone());
    }

    sql.push_str(" WHERE id = ? AND status = 'pending'");
    values.push(SqlValue::U64(id));
    for (condition, value) in update.guard {
        sql.push_str(&format!(" AND {condition}"));
        values.push(value.clone());
    }

    (sql, values)
}

/// Applies `decision` to a pending record, stamping remarks and approver,
/// then notifies the owner and returns the new status.
pub async fn decide(
    pool: &MySqlPool,
    kind: ApprovalKind,
    id: u64,
    decision: Decision,
    remarks: Option<&str>,
    actor: &AuthUser,
    update: DecisionUpdate<'_>,
) -> Result<ApprovalStatus, ApiError> {
    let remarks = check_remarks(decision, remarks)?;

    let lookup = format!(
        "SELECT r.employee_id, r.status, e.reporting_to \
         FROM {} r LEFT JOIN employees e ON e.id = r.employee_id \
         WHERE r.id = ?",
        kind.table()
    );
    let (owner, status, owner_lead) = sqlx::query_as::<_, (u64, String, Option<u64>)>(&lookup)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(kind.label()))?;

    authorize(kind, actor, owner, owner_lead)?;

    if !is_pending(&status) {
        return Err(ApprovalDenied::NotPending.into());
    }

    let next = decision.status();
    let (sql, values) = decision_statement(kind, id, next, remarks.clone(), actor, &update);

    let affected = execute_sql(pool, &sql, &values).await?;
    if affected == 0 {
        if !update.guard.is_empty() {
            return Err(ApiError::Conflict(format!(
                "{} changed while being decided; reload and try again",
                kind.label()
            )));
        }
        return Err(ApprovalDenied::NotPending.into());
    }

    info!(
        kind = kind.label(),
        id,
        status = %next,
        actor = actor.user_id,
        username = %actor.username,
        "Approval decision recorded"
    );

    let mut message = format!("Your {} #{} was {}", kind.label().to_lowercase(), id, next);
    if let Some(r) = &remarks {
        message.push_str(&format!(": {r}"));
    }
    notify(pool, owner, &message, Some(kind.link(id))).await;

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 100,
            username: "approver".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn leave_approvers() {
        let kind = ApprovalKind::Leave;
        assert_eq!(authorize(kind, &actor(Role::Hr, Some(1)), 5, None), Ok(()));
        assert_eq!(authorize(kind, &actor(Role::Admin, None), 5, None), Ok(()));
        assert_eq!(
            authorize(kind, &actor(Role::Accounts, Some(1)), 5, None),
            Err(ApprovalDenied::RoleNotAllowed)
        );
        assert_eq!(
            authorize(kind, &actor(Role::Employee, Some(1)), 5, Some(1)),
            Err(ApprovalDenied::RoleNotAllowed)
        );
    }

    #[test]
    fn leads_only_approve_reportees() {
        let lead = actor(Role::Lead, Some(7));
        assert_eq!(authorize(ApprovalKind::Leave, &lead, 5, Some(7)), Ok(()));
        assert_eq!(
            authorize(ApprovalKind::Leave, &lead, 5, Some(8)),
            Err(ApprovalDenied::NotReportee)
        );
        assert_eq!(
            authorize(ApprovalKind::Leave, &lead, 5, None),
            Err(ApprovalDenied::NotReportee)
        );
        // leads have no say over money
        assert_eq!(
            authorize(ApprovalKind::Allowance, &lead, 5, Some(7)),
            Err(ApprovalDenied::RoleNotAllowed)
        );
    }

    #[test]
    fn money_records_go_to_accounts() {
        for kind in [
            ApprovalKind::Allowance,
            ApprovalKind::FixedAllowance,
            ApprovalKind::TravelExpenditure,
        ] {
            assert_eq!(authorize(kind, &actor(Role::Accounts, Some(1)), 5, None), Ok(()));
            assert_eq!(
                authorize(kind, &actor(Role::Hr, Some(1)), 5, None),
                Err(ApprovalDenied::RoleNotAllowed)
            );
        }
        assert_eq!(
            authorize(ApprovalKind::Ltc, &actor(Role::Hr, Some(1)), 5, None),
            Ok(())
        );
    }

    #[test]
    fn nobody_approves_themselves() {
        assert_eq!(
            authorize(ApprovalKind::Leave, &actor(Role::Admin, Some(5)), 5, None),
            Err(ApprovalDenied::SelfApproval)
        );
        assert_eq!(
            authorize(ApprovalKind::Ltc, &actor(Role::Accounts, Some(5)), 5, None),
            Err(ApprovalDenied::SelfApproval)
        );
    }

    #[test]
    fn rejection_needs_remarks() {
        assert_eq!(check_remarks(Decision::Approve, None), Ok(None));
        assert_eq!(
            check_remarks(Decision::Approve, Some("  ok ")),
            Ok(Some("ok".to_string()))
        );
        assert_eq!(
            check_remarks(Decision::Reject, Some("   ")),
            Err(ApprovalDenied::RemarksRequired)
        );
        assert_eq!(
            check_remarks(Decision::Reject, Some("Project deadline")),
            Ok(Some("Project deadline".to_string()))
        );
    }

    #[test]
    fn statement_carries_extra_columns_and_guards() {
        let set = [("amount_approved", SqlValue::F64(900.0))];
        let guard = [("amount_claimed >= ?", SqlValue::F64(900.0))];
        let (sql, values) = decision_statement(
            ApprovalKind::Ltc,
            3,
            ApprovalStatus::Approved,
            None,
            &actor(Role::Hr, Some(1)),
            &DecisionUpdate {
                set: &set,
                guard: &guard,
            },
        );
        assert_eq!(
            sql,
            "UPDATE ltc_claims SET status = ?, remarks = ?, actioned_by = ?, \
             actioned_at = UTC_TIMESTAMP(), amount_approved = ? \
             WHERE id = ? AND status = 'pending' AND amount_claimed >= ?"
        );
        assert_eq!(values.len(), 6);
        assert_eq!(values[3], SqlValue::F64(900.0));
        assert_eq!(values[4], SqlValue::U64(3));

        let (sql, values) = decision_statement(
            ApprovalKind::Leave,
            8,
            ApprovalStatus::Rejected,
            Some("Busy week".to_string()),
            &actor(Role::Hr, Some(1)),
            &DecisionUpdate::default(),
        );
        assert!(sql.ends_with("WHERE id = ? AND status = 'pending'"));
        assert_eq!(values[1], SqlValue::String("Busy week".to_string()));
    }

    #[test]
    fn denial_status_codes() {
        use actix_web::ResponseError;
        use actix_web::http::StatusCode;

        assert_eq!(
            ApiError::from(ApprovalDenied::NotPending).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ApprovalDenied::SelfApproval).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Decision::Reject.status(), ApprovalStatus::Rejected);
    }
}
