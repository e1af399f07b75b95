pub mod db_utils;
pub mod json_body;
pub mod notify;
pub mod pagination;
