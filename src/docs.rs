use crate::api::allowance::{AllowanceListResponse, CreateAllowance};
use crate::api::appraisal::{AppraisalListResponse, CreateAppraisal, ReviewAppraisal};
use crate::api::ctc::CtcReport;
use crate::api::department::{CreateDepartment, DepartmentListResponse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::fixed_allowance::{CreateFixedAllowance, FixedAllowanceListResponse};
use crate::api::helpdesk::{CreateTicket, HelpdeskListResponse, TicketReply};
use crate::api::holiday::{CreateHoliday, HolidayListResponse};
use crate::api::leave::{CreateLeave, LeaveDaysResponse, LeaveListResponse, LeaveWindow, UpdateLeave};
use crate::api::ltc::{ApproveLtc, CreateLtc, LtcListResponse, UpdateLtc};
use crate::api::message::{MessageListResponse, ReplyMessage, SendMessage};
use crate::api::notification::NotificationListResponse;
use crate::api::salary::{CreateSalary, SalaryListResponse, UpdateSalary};
use crate::api::travel_expenditure::{
    CreateTravelExpenditure, TravelExpenditureListResponse, UpdateTravelExpenditure,
};
use crate::api::user::{CreateUser, UserListResponse};
use crate::model::allowance::Allowance;
use crate::model::appraisal::{Appraisal, AppraisalStatus};
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::fixed_allowance::FixedAllowance;
use crate::model::helpdesk::HelpdeskTicket;
use crate::model::holiday::Holiday;
use crate::model::leave::{Leave, LeaveType};
use crate::model::line_item::LineItem;
use crate::model::ltc::LtcClaim;
use crate::model::message::Message;
use crate::model::notification::Notification;
use crate::model::role::Role;
use crate::model::salary::Salary;
use crate::model::status::ApprovalStatus;
use crate::model::travel_expenditure::{Expense, TravelExpenditure};
use crate::model::user::User;
use crate::service::approval::DecisionRequest;
use crate::service::ctc::CtcRow;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## HR and Payroll Management

Back office API for an organisation's people and payroll records.

### Key Features
- **Directory**: users, departments and employees with reporting lines
- **Leave**: half-day aware leave requests with lead/HR approval
- **Payroll**: salary slips, variable and fixed allowances, cost-to-company report
- **Claims**: LTC and travel expenditure claims with approval
- **Self-service**: appraisals, helpdesk tickets, messages and notifications

### Security
Every endpoint expects a JWT **access** token as `Authorization: Bearer <token>`.
Employees see their own records; HR, Accounts and Admin see the domains they administer.

### Response Format
- Errors are `{"message": "..."}` with the matching HTTP status
- Lists are `{data, page, per_page, total}`
"#,
    ),
    paths(
        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::leave::compute_days,
        crate::api::leave::list_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::update_leave,
        crate::api::leave::delete_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::salary::list_salaries,
        crate::api::salary::get_salary,
        crate::api::salary::create_salary,
        crate::api::salary::update_salary,
        crate::api::salary::delete_salary,

        crate::api::allowance::list_allowances,
        crate::api::allowance::get_allowance,
        crate::api::allowance::create_allowance,
        crate::api::allowance::update_allowance,
        crate::api::allowance::delete_allowance,
        crate::api::allowance::approve_allowance,
        crate::api::allowance::reject_allowance,

        crate::api::fixed_allowance::list_fixed_allowances,
        crate::api::fixed_allowance::get_fixed_allowance,
        crate::api::fixed_allowance::create_fixed_allowance,
        crate::api::fixed_allowance::update_fixed_allowance,
        crate::api::fixed_allowance::delete_fixed_allowance,
        crate::api::fixed_allowance::approve_fixed_allowance,
        crate::api::fixed_allowance::reject_fixed_allowance,

        crate::api::appraisal::list_appraisals,
        crate::api::appraisal::get_appraisal,
        crate::api::appraisal::create_appraisal,
        crate::api::appraisal::update_appraisal,
        crate::api::appraisal::submit_appraisal,
        crate::api::appraisal::review_appraisal,
        crate::api::appraisal::delete_appraisal,

        crate::api::helpdesk::list_tickets,
        crate::api::helpdesk::get_ticket,
        crate::api::helpdesk::create_ticket,
        crate::api::helpdesk::reply_ticket,
        crate::api::helpdesk::resolve_ticket,
        crate::api::helpdesk::delete_ticket,

        crate::api::message::inbox,
        crate::api::message::sent,
        crate::api::message::get_message,
        crate::api::message::send_message,
        crate::api::message::reply_message,
        crate::api::message::mark_read,
        crate::api::message::delete_message,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read,
        crate::api::notification::delete_notification,

        crate::api::holiday::list_holidays,
        crate::api::holiday::get_holiday,
        crate::api::holiday::create_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::ltc::list_ltc,
        crate::api::ltc::get_ltc,
        crate::api::ltc::create_ltc,
        crate::api::ltc::update_ltc,
        crate::api::ltc::delete_ltc,
        crate::api::ltc::approve_ltc,
        crate::api::ltc::reject_ltc,

        crate::api::travel_expenditure::list_travel_expenditures,
        crate::api::travel_expenditure::get_travel_expenditure,
        crate::api::travel_expenditure::create_travel_expenditure,
        crate::api::travel_expenditure::update_travel_expenditure,
        crate::api::travel_expenditure::delete_travel_expenditure,
        crate::api::travel_expenditure::approve_travel_expenditure,
        crate::api::travel_expenditure::reject_travel_expenditure,

        crate::api::ctc::ctc_report
    ),
    components(
        schemas(
            Role,
            ApprovalStatus,
            LeaveType,
            AppraisalStatus,
            LineItem,
            Expense,
            DecisionRequest,
            User,
            CreateUser,
            UserListResponse,
            Department,
            CreateDepartment,
            DepartmentListResponse,
            Employee,
            CreateEmployee,
            EmployeeListResponse,
            Leave,
            CreateLeave,
            UpdateLeave,
            LeaveWindow,
            LeaveDaysResponse,
            LeaveListResponse,
            Salary,
            CreateSalary,
            UpdateSalary,
            SalaryListResponse,
            Allowance,
            CreateAllowance,
            AllowanceListResponse,
            FixedAllowance,
            CreateFixedAllowance,
            FixedAllowanceListResponse,
            Appraisal,
            CreateAppraisal,
            ReviewAppraisal,
            AppraisalListResponse,
            HelpdeskTicket,
            CreateTicket,
            TicketReply,
            HelpdeskListResponse,
            Message,
            SendMessage,
            ReplyMessage,
            MessageListResponse,
            Notification,
            NotificationListResponse,
            Holiday,
            CreateHoliday,
            HolidayListResponse,
            LtcClaim,
            CreateLtc,
            UpdateLtc,
            ApproveLtc,
            LtcListResponse,
            TravelExpenditure,
            CreateTravelExpenditure,
            UpdateTravelExpenditure,
            TravelExpenditureListResponse,
            CtcRow,
            CtcReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "User", description = "User account management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Leave", description = "Leave request and approval APIs"),
        (name = "Salary", description = "Salary slip APIs"),
        (name = "Allowance", description = "Variable allowance APIs"),
        (name = "FixedAllowance", description = "Fixed allowance APIs"),
        (name = "Appraisal", description = "Appraisal cycle APIs"),
        (name = "Helpdesk", description = "Helpdesk ticket APIs"),
        (name = "Message", description = "Employee messaging APIs"),
        (name = "Notification", description = "In-app notification APIs"),
        (name = "Holiday", description = "Holiday calendar APIs"),
        (name = "LTC", description = "Leave travel concession claim APIs"),
        (name = "TravelExpenditure", description = "Travel expenditure claim APIs"),
        (name = "CTC", description = "Cost-to-company reporting APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_is_bearer_protected() {
        let doc = ApiDoc::openapi();

        let components = doc.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));

        for (path, item) in &doc.paths.paths {
            for (_, operation) in &item.operations {
                assert!(
                    operation.security.is_some(),
                    "{path} is missing a security requirement"
                );
            }
        }
    }

    #[test]
    fn documents_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/users",
            "/api/employees/{id}",
            "/api/leaves/compute-days",
            "/api/fixed-allowances/{id}/approve",
            "/api/messages/inbox",
            "/api/notifications/read-all",
            "/api/travel-expenditures/{id}/reject",
            "/api/ctc",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} is not documented");
        }
    }
}
