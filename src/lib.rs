//! Unofficial automation client for a social network.
//!
//! The crate covers the session and transport layer an automation tool needs
//! before any feature work: logging in over the mobile-web form or the
//! private mobile-application API, keeping the session key fresh, pacing
//! requests to look human, detecting captcha interstitials and blocked
//! accounts, and translating every failure into a typed error a caller can
//! branch on.
//!
//! ```no_run
//! use oktools::config::Config;
//! use oktools::dispatch::Dispatcher;
//! use oktools::session::SessionManager;
//!
//! # async fn run() -> oktools::error::Result<()> {
//! let config = Config::new();
//! let session = SessionManager::login_api(config).await?;
//! let mut dispatcher = Dispatcher::new(session);
//! let info = dispatcher
//!     .make_request(
//!         "users/getCurrentUser",
//!         &[],
//!         oktools::dispatch::Verb::Get,
//!         false,
//!         &[],
//!     )
//!     .await?;
//! println!("{info}");
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod codec;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod pacing;
pub mod session;
pub mod storage;
pub mod transport;
pub mod utils;

pub use account::AccountControl;
pub use codec::IdCodec;
pub use config::Config;
pub use dispatch::{Dispatcher, Verb};
pub use error::{OkToolsError, Result};
pub use session::{AuthMode, BlockedStatus, SessionManager};
