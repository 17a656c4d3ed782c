//! Request/response shapes of the private-API login. The login itself is a
//! batch RPC envelope: several named methods bundled into one form POST
//! against the batch-execute endpoint.

use serde::Deserialize;
use serde_json::json;

use crate::config::Credentials;
use crate::constants::{ANDROID_CLIENT, LOGIN_REFERRER};
use crate::error::Result;

/// The device identifier triple in the wire form the mobile app uses.
pub(crate) fn device_id_string(creds: &Credentials) -> String {
    format!(
        "INSTALL_ID={};DEVICE_ID={};ANDROID_ID={}",
        creds.install_id, creds.device_id, creds.android_id
    )
}

/// The three methods of the login batch: the login itself, a settings pull
/// and the phone-verification probe the real client sends alongside it.
fn login_methods(creds: &Credentials) -> serde_json::Value {
    json!([
        {
            "method": "auth.login",
            "params": {
                "client": ANDROID_CLIENT,
                "device_id": device_id_string(creds),
                "gen_token": "true",
                "password": creds.password,
                "referrer": LOGIN_REFERRER,
                "user_name": creds.login,
                "verification_supported": "true",
                "verification_supported_v": "1"
            }
        },
        {
            "method": "settings.get",
            "params": { "keys": "*", "marker": "0", "version": "319" }
        },
        {
            "method": "libverify.libverifyPhoneActual"
        }
    ])
}

/// Form fields of the batch-execute login POST.
pub(crate) fn login_form(creds: &Credentials) -> Result<Vec<(String, String)>> {
    Ok(vec![
        (
            "application_key".to_string(),
            creds.application_key.clone(),
        ),
        ("deviceId".to_string(), device_id_string(creds)),
        ("id".to_string(), "auth.login".to_string()),
        (
            "methods".to_string(),
            serde_json::to_string(&login_methods(creds))?,
        ),
    ])
}

/// Query parameters of the silent token refresh GET.
pub(crate) fn refresh_query(creds: &Credentials, auth_token: &str) -> Vec<(String, String)> {
    vec![
        (
            "application_key".to_string(),
            creds.application_key.clone(),
        ),
        ("client".to_string(), ANDROID_CLIENT.to_string()),
        ("deviceId".to_string(), device_id_string(creds)),
        ("token".to_string(), auth_token.to_string()),
        ("verification_supported".to_string(), "true".to_string()),
        ("verification_supported_v".to_string(), "1".to_string()),
    ]
}

/// Structured error fields the auth endpoints return alongside, or instead
/// of, the login payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error_code: Option<i64>,
    pub error_msg: Option<String>,
    pub ver_redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub session_key: Option<String>,
}

#[cfg(test)]
mod tests_api_auth {
    use super::*;
    use pretty_assertions::assert_eq;

    fn creds() -> Credentials {
        Credentials {
            login: "79990001122".to_string(),
            password: "secret".to_string(),
            application_key: "APPKEY".to_string(),
            install_id: "i-1".to_string(),
            device_id: "d-1".to_string(),
            android_id: "a-1".to_string(),
        }
    }

    #[test]
    fn test_device_id_string_format() {
        assert_eq!(
            device_id_string(&creds()),
            "INSTALL_ID=i-1;DEVICE_ID=d-1;ANDROID_ID=a-1"
        );
    }

    #[test]
    fn test_login_form_envelope() {
        let form = login_form(&creds()).unwrap();
        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("application_key"), "APPKEY");
        assert_eq!(get("id"), "auth.login");

        let methods: serde_json::Value = serde_json::from_str(get("methods")).unwrap();
        let names: Vec<&str> = methods
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["method"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["auth.login", "settings.get", "libverify.libverifyPhoneActual"]
        );
        assert_eq!(methods[0]["params"]["user_name"], "79990001122");
        assert_eq!(methods[0]["params"]["gen_token"], "true");
    }

    #[test]
    fn test_refresh_query_carries_stored_token() {
        let query = refresh_query(&creds(), "long-lived-token");
        assert!(query.contains(&("token".to_string(), "long-lived-token".to_string())));
        assert!(query.contains(&("application_key".to_string(), "APPKEY".to_string())));
    }
}
