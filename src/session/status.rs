//! Classification of a non-normal browsing/authentication outcome from body
//! markers. Recomputed per response, never persisted. A substring probe is
//! all this needs; the full DOM belongs to the feature scrapers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::StatusMarkers;

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]+)""#).expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedStatus {
    Normal,
    /// Permanently blocked by the provider's administration.
    UserBlocked,
    /// Frozen pending phone verification.
    UserFrozen,
    GroupDisabled,
    /// Generic provider error page.
    ErrorPage,
}

impl BlockedStatus {
    pub fn classify(body: &str, markers: &StatusMarkers) -> Self {
        if body.contains(&markers.user_blocked) {
            BlockedStatus::UserBlocked
        } else if body.contains(&markers.user_frozen) {
            BlockedStatus::UserFrozen
        } else if body.contains(&markers.group_disabled) {
            BlockedStatus::GroupDisabled
        } else if body.contains(&markers.error_page) {
            BlockedStatus::ErrorPage
        } else {
            BlockedStatus::Normal
        }
    }
}

/// Pull the verification link off a frozen-account page: the first href
/// after the frozen marker.
pub(crate) fn extract_verification_url(body: &str, markers: &StatusMarkers) -> Option<String> {
    let from = body.find(&markers.user_frozen)?;
    HREF_RE
        .captures(&body[from..])
        .map(|caps| caps[1].to_string())
}
