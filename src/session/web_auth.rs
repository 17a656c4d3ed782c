//! Mobile-web form login: the guest login form fields and the mapping from
//! the returned page to an authentication outcome.

use crate::config::Credentials;
use crate::constants::StatusMarkers;
use crate::error::{OkToolsError, Result};
use crate::session::status::{extract_verification_url, BlockedStatus};

pub(crate) fn login_form(creds: &Credentials) -> Vec<(String, String)> {
    vec![
        ("fr.login".to_string(), creds.login.clone()),
        ("fr.password".to_string(), creds.password.clone()),
        ("fr.posted".to_string(), "set".to_string()),
        ("fr.proto".to_string(), "1".to_string()),
    ]
}

pub(crate) fn logout_form() -> Vec<(String, String)> {
    vec![
        ("fr.posted".to_string(), "set".to_string()),
        ("button_logoff".to_string(), "logoff".to_string()),
    ]
}

/// Map the page returned by the login POST to success or a typed failure.
pub(crate) fn classify_login_page(
    account: &str,
    body: &str,
    markers: &StatusMarkers,
) -> Result<()> {
    match BlockedStatus::classify(body, markers) {
        BlockedStatus::UserBlocked => Err(OkToolsError::Blocked {
            account: account.to_string(),
            details: "account blocked by provider administration".to_string(),
            verification_url: None,
        }),
        BlockedStatus::UserFrozen => Err(OkToolsError::Blocked {
            account: account.to_string(),
            details: "account frozen, phone verification required".to_string(),
            verification_url: extract_verification_url(body, markers),
        }),
        BlockedStatus::Normal if body.contains(&markers.authenticated) => Ok(()),
        // Error page, disabled group or an unrecognized guest page: nothing
        // we can branch on, escalate for manual inspection.
        _ => Err(OkToolsError::LoginFailed {
            account: account.to_string(),
            details: "login page did not match any known outcome marker".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests_web_auth {
    use super::*;
    use pretty_assertions::assert_eq;

    fn creds() -> Credentials {
        Credentials {
            login: "79990001122".to_string(),
            password: "secret".to_string(),
            application_key: String::new(),
            install_id: String::new(),
            device_id: String::new(),
            android_id: String::new(),
        }
    }

    #[test]
    fn test_login_form_fields() {
        let form = login_form(&creds());
        assert_eq!(
            form,
            vec![
                ("fr.login".to_string(), "79990001122".to_string()),
                ("fr.password".to_string(), "secret".to_string()),
                ("fr.posted".to_string(), "set".to_string()),
                ("fr.proto".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_classify_authenticated_page() {
        let markers = StatusMarkers::default();
        let body = r#"<a href="dk?st.cmd=userMain">feed</a>"#;
        assert!(classify_login_page("acc", body, &markers).is_ok());
    }

    #[test]
    fn test_classify_blocked_page() {
        let markers = StatusMarkers::default();
        let err =
            classify_login_page("acc", "<div class=\"accountBlockedByAdminStub\">", &markers)
                .unwrap_err();
        match err {
            OkToolsError::Blocked {
                account,
                verification_url,
                ..
            } => {
                assert_eq!(account, "acc");
                assert!(verification_url.is_none());
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_frozen_page_carries_verification_url() {
        let markers = StatusMarkers::default();
        let body = r#"<div id="uvPrePhoneCaptcha"><a href="https://m.example.org/verify">go</a></div>"#;
        let err = classify_login_page("acc", body, &markers).unwrap_err();
        match err {
            OkToolsError::Blocked {
                verification_url, ..
            } => assert_eq!(
                verification_url.as_deref(),
                Some("https://m.example.org/verify")
            ),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_unknown_page_is_login_failed() {
        let markers = StatusMarkers::default();
        let err = classify_login_page("acc", "<html>guest landing</html>", &markers).unwrap_err();
        assert!(matches!(err, OkToolsError::LoginFailed { .. }));
    }
}
