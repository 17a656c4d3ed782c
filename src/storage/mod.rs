pub mod cookies;
pub mod credentials;
