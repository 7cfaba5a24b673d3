pub mod audit;
pub mod notification;
pub mod security;
pub mod workflow;

pub use audit::AuditService;
pub use notification::{NotificationEvent, NotificationService};
pub use workflow::RoleChangeService;
