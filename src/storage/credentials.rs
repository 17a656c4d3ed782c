//! Per-account persistence of the private-API login payload. Keeping the
//! payload across process runs lets the next run refresh the session key
//! with the stored long-lived auth token instead of a full re-login.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// The raw login response plus the moment it was acquired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLogin {
    pub payload: serde_json::Value,
    /// Unix seconds at acquisition.
    pub acquired_at: i64,
}

impl StoredLogin {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            acquired_at: Utc::now().timestamp(),
        }
    }

    pub fn session_key(&self) -> Option<&str> {
        self.payload["auth_login_response"]["session_key"].as_str()
    }

    /// Long-lived token used for silent refresh.
    pub fn auth_token(&self) -> Option<&str> {
        self.payload["auth_login_response"]["auth_token"].as_str()
    }

    /// Numeric id of the account in the private-API namespace.
    pub fn uid(&self) -> Option<&str> {
        self.payload["auth_login_response"]["uid"].as_str()
    }

    pub fn age_secs(&self) -> i64 {
        Utc::now().timestamp() - self.acquired_at
    }

    pub fn replace_session_key(&mut self, session_key: &str) {
        self.payload["auth_login_response"]["session_key"] =
            serde_json::Value::String(session_key.to_string());
        self.acquired_at = Utc::now().timestamp();
    }
}

fn account_path(dir: &Path, account: &str) -> PathBuf {
    dir.join(account)
}

/// Load the stored login for `account`, or `None` when no file exists yet.
pub fn load(dir: &Path, account: &str) -> Result<Option<StoredLogin>> {
    let path = account_path(dir, account);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)?;
    let stored: StoredLogin = serde_json::from_str(&raw)?;
    debug!("loaded stored login for {} from {:?}", account, path);
    Ok(Some(stored))
}

pub fn save(dir: &Path, account: &str, stored: &StoredLogin) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = account_path(dir, account);
    fs::write(&path, serde_json::to_string(stored)?)?;
    debug!("persisted login for {} to {:?}", account, path);
    Ok(())
}
