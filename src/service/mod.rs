pub mod approval;
pub mod ctc;
pub mod leave_days;
