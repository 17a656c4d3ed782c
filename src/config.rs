use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::error;

use crate::constants::MOBILE_USER_AGENT;

/// Account credentials plus the mobile-application identity used by the
/// private-API login. The device triple is what the provider uses to tell
/// installations apart, so every account should carry its own.
#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
    pub application_key: String,
    pub install_id: String,
    pub device_id: String,
    pub android_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Mobile-web surface, HTML responses, cookie-authenticated.
    pub web_base_url: String,
    /// Desktop-web surface.
    pub desktop_base_url: String,
    /// Private mobile-application JSON API.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    /// Fixed part of the inter-request pause, in milliseconds. A random
    /// 0..1s jitter is added on top of it per request.
    pub base_pause_ms: u64,
}

/// Where per-account state lives on disk. `None` disables persistence for
/// that concern.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub credentials_dir: Option<PathBuf>,
    pub cookies_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: EndpointConfig,
    pub pacing: PacingConfig,
    pub storage: StorageConfig,
    /// `type:ip:port:login:password`, type is `http` or `socks5`.
    pub proxy: Option<String>,
    pub user_agent: String,
    /// Session key age after which a silent refresh is attempted.
    pub refresh_interval_secs: u64,
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"login\":\"{}\",\"password\":\"[REDACTED]\",\"application_key\":\"[REDACTED]\",\"install_id\":\"{}\",\"device_id\":\"{}\",\"android_id\":\"{}\"}}",
            self.login, self.install_id, self.device_id, self.android_id
        )
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"web_base_url\":\"{}\",\"desktop_base_url\":\"{}\",\"api_base_url\":\"{}\",\"timeout\":{}}}",
            self.web_base_url, self.desktop_base_url, self.api_base_url, self.timeout
        )
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"credentials\":{},\"endpoints\":{},\"base_pause_ms\":{},\"refresh_interval_secs\":{}}}",
            self.credentials, self.endpoints, self.pacing.base_pause_ms, self.refresh_interval_secs
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

fn get_env_opt(env_var: &str) -> Option<String> {
    env::var(env_var).ok().filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            credentials: Credentials {
                login: get_env_or_default("OKTOOLS_LOGIN", String::from("default_login")),
                password: get_env_or_default("OKTOOLS_PASSWORD", String::from("default_password")),
                application_key: get_env_or_default(
                    "OKTOOLS_APP_KEY",
                    String::from("default_app_key"),
                ),
                install_id: get_env_or_default("OKTOOLS_INSTALL_ID", String::new()),
                device_id: get_env_or_default("OKTOOLS_DEVICE_ID", String::new()),
                android_id: get_env_or_default("OKTOOLS_ANDROID_ID", String::new()),
            },
            endpoints: EndpointConfig {
                web_base_url: get_env_or_default(
                    "OKTOOLS_WEB_BASE_URL",
                    String::from("https://m.ok.ru/"),
                ),
                desktop_base_url: get_env_or_default(
                    "OKTOOLS_DESKTOP_BASE_URL",
                    String::from("https://ok.ru/"),
                ),
                api_base_url: get_env_or_default(
                    "OKTOOLS_API_BASE_URL",
                    String::from("https://api.ok.ru/api"),
                ),
                timeout: get_env_or_default("OKTOOLS_TIMEOUT", 30),
            },
            pacing: PacingConfig {
                base_pause_ms: get_env_or_default("OKTOOLS_BASE_PAUSE_MS", 1000),
            },
            storage: StorageConfig {
                credentials_dir: get_env_opt("OKTOOLS_CREDENTIALS_DIR").map(PathBuf::from),
                cookies_dir: get_env_opt("OKTOOLS_COOKIES_DIR").map(PathBuf::from),
            },
            proxy: get_env_opt("OKTOOLS_PROXY"),
            user_agent: get_env_or_default(
                "OKTOOLS_USER_AGENT",
                String::from(MOBILE_USER_AGENT),
            ),
            // 20 minutes, matching the provider-side session key lifetime.
            refresh_interval_secs: get_env_or_default("OKTOOLS_REFRESH_INTERVAL", 1200),
        }
    }
}

#[cfg(test)]
mod tests_config {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn with_env_vars<F>(vars: Vec<(&str, &str)>, test: F)
    where
        F: FnOnce(),
    {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut old_vars = Vec::new();

        for (key, value) in vars {
            old_vars.push((key, env::var(key).ok()));
            env::set_var(key, value);
        }

        test();

        for (key, value) in old_vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_config_new() {
        with_env_vars(
            vec![
                ("OKTOOLS_LOGIN", "79990001122"),
                ("OKTOOLS_PASSWORD", "test_pass"),
                ("OKTOOLS_APP_KEY", "CBAFJIICABABABABA"),
                ("OKTOOLS_WEB_BASE_URL", "https://m.test.example/"),
                ("OKTOOLS_API_BASE_URL", "https://api.test.example/api"),
                ("OKTOOLS_BASE_PAUSE_MS", "250"),
                ("OKTOOLS_REFRESH_INTERVAL", "600"),
                ("OKTOOLS_PROXY", "socks5:1.2.3.4:1080:user:pass"),
            ],
            || {
                let config = Config::new();

                assert_eq!(config.credentials.login, "79990001122");
                assert_eq!(config.credentials.password, "test_pass");
                assert_eq!(config.credentials.application_key, "CBAFJIICABABABABA");
                assert_eq!(config.endpoints.web_base_url, "https://m.test.example/");
                assert_eq!(config.endpoints.api_base_url, "https://api.test.example/api");
                assert_eq!(config.pacing.base_pause_ms, 250);
                assert_eq!(config.refresh_interval_secs, 600);
                assert_eq!(config.proxy.as_deref(), Some("socks5:1.2.3.4:1080:user:pass"));
            },
        );
    }

    #[test]
    fn test_default_values() {
        with_env_vars(vec![], || {
            let config = Config::new();

            assert_eq!(config.endpoints.web_base_url, "https://m.ok.ru/");
            assert_eq!(config.endpoints.api_base_url, "https://api.ok.ru/api");
            assert_eq!(config.endpoints.timeout, 30);
            assert_eq!(config.pacing.base_pause_ms, 1000);
            assert_eq!(config.refresh_interval_secs, 1200);
            assert!(config.storage.credentials_dir.is_none());
        });
    }
}

#[cfg(test)]
mod tests_display {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn test_credentials_display_redacts_secrets() {
        let credentials = Credentials {
            login: "79990001122".to_string(),
            password: "pass123".to_string(),
            application_key: "key789".to_string(),
            install_id: "inst1".to_string(),
            device_id: "dev1".to_string(),
            android_id: "andr1".to_string(),
        };

        let display_output = credentials.to_string();
        let expected_json = json!({
            "login": "79990001122",
            "password": "[REDACTED]",
            "application_key": "[REDACTED]",
            "install_id": "inst1",
            "device_id": "dev1",
            "android_id": "andr1"
        });

        assert_json_eq!(
            serde_json::from_str::<serde_json::Value>(&display_output).unwrap(),
            expected_json
        );
        assert!(!display_output.contains("pass123"));
        assert!(!display_output.contains("key789"));
    }
}
