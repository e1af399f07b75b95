pub mod allowance;
pub mod appraisal;
pub mod department;
pub mod employee;
pub mod fixed_allowance;
pub mod helpdesk;
pub mod holiday;
pub mod leave;
pub mod line_item;
pub mod ltc;
pub mod message;
pub mod notification;
pub mod role;
pub mod salary;
pub mod status;
pub mod travel_expenditure;
pub mod user;
