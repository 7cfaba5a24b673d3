pub mod auth;
pub mod permissions;

pub use auth::{require_auth, AuthenticatedUser};
pub use permissions::{Authenticated, Authorized};
