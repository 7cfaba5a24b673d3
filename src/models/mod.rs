pub mod audit_log;
pub mod notification;
pub mod role_change_request;
pub mod staff_role;
pub mod user;
