//! Authentication and session lifetime: the two login flows, silent session
//! refresh, and the classification of blocked-account pages.

pub(crate) mod api_auth;
pub mod manager;
pub mod status;
pub(crate) mod web_auth;

pub use manager::{AuthMode, SessionManager};
pub use status::BlockedStatus;
