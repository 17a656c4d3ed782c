use std::path::PathBuf;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::Config;
use crate::constants::{Pages, StatusMarkers};
use crate::error::{OkToolsError, Result};
use crate::pacing::Pacing;
use crate::session::{api_auth, web_auth};
use crate::storage::cookies::CookieFile;
use crate::storage::credentials::{self, StoredLogin};
use crate::transport::{HttpTransport, ProxyConfig, TransportOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Mobile-web form login, cookie-authenticated.
    Web,
    /// Private-API token login, bearer session key.
    Api,
}

/// Owns the credentials and the live authentication state for one account.
/// A `SessionManager` that exists is authenticated: both constructors either
/// complete the handshake or return the typed failure, so callers never see
/// a half-logged-in object.
#[derive(Debug)]
pub struct SessionManager {
    transport: HttpTransport,
    config: Config,
    pages: Pages,
    markers: StatusMarkers,
    pacing: Pacing,
    mode: AuthMode,
    /// Private-API login payload plus acquisition time. `None` in web mode.
    login_data: Option<StoredLogin>,
    /// Persistence mirror of the live cookie jar. `None` in API mode or when
    /// no cookie directory is configured.
    cookie_file: Option<(PathBuf, CookieFile)>,
}

impl SessionManager {
    /// Log in against the private mobile-application API. Reuses a persisted
    /// session when one exists for this account, refreshing it if stale.
    #[instrument(skip(config), fields(account = %config.credentials.login))]
    pub async fn login_api(config: Config) -> Result<Self> {
        Self::login_api_with(config, Pages::default(), StatusMarkers::default()).await
    }

    pub async fn login_api_with(
        config: Config,
        pages: Pages,
        markers: StatusMarkers,
    ) -> Result<Self> {
        let transport = Self::build_transport(&config, None)?;
        let account = config.credentials.login.clone();

        let stored = match &config.storage.credentials_dir {
            Some(dir) => credentials::load(dir, &account)?,
            None => None,
        };

        let mut manager = Self {
            transport,
            pacing: Pacing::from_millis(config.pacing.base_pause_ms),
            config,
            pages,
            markers,
            mode: AuthMode::Api,
            login_data: stored,
            cookie_file: None,
        };

        if manager.login_data.is_some() {
            debug!("found persisted login for {}, refreshing if stale", account);
            manager.ensure_fresh().await?;
        } else {
            let stored = manager.full_login().await?;
            manager.persist_login(&stored)?;
            manager.login_data = Some(stored);
        }

        info!("API session established for {}", account);
        Ok(manager)
    }

    /// Log in through the mobile-web login form. The cookie jar carries the
    /// authentication from here on.
    #[instrument(skip(config), fields(account = %config.credentials.login))]
    pub async fn login_web(config: Config) -> Result<Self> {
        Self::login_web_with(config, Pages::default(), StatusMarkers::default()).await
    }

    pub async fn login_web_with(
        config: Config,
        pages: Pages,
        markers: StatusMarkers,
    ) -> Result<Self> {
        let account = config.credentials.login.clone();

        let cookie_file = match &config.storage.cookies_dir {
            Some(dir) => {
                let path = CookieFile::account_path(dir, &account);
                Some((path.clone(), CookieFile::load(&path)?))
            }
            None => None,
        };
        let jar = cookie_file
            .as_ref()
            .map(|(_, file)| file.to_jar())
            .unwrap_or_default();

        let transport = Self::build_transport(&config, Some(jar))?;
        let pacing = Pacing::from_millis(config.pacing.base_pause_ms);

        let login_url = format!("{}{}", config.endpoints.web_base_url, pages.login);
        let form = web_auth::login_form(&config.credentials);
        pacing.delay().await;
        let response = transport.post_form(&login_url, &form, &[]).await?;

        web_auth::classify_login_page(&account, &response.body, &markers)?;

        let mut manager = Self {
            transport,
            config,
            pages,
            markers,
            pacing,
            mode: AuthMode::Web,
            login_data: None,
            cookie_file,
        };
        if let Ok(url) = Url::parse(&login_url) {
            manager.record_cookies(&url, &response.headers);
        }
        manager.persist_cookies()?;

        info!("web session established for {}", account);
        Ok(manager)
    }

    fn build_transport(
        config: &Config,
        jar: Option<std::sync::Arc<reqwest::cookie::Jar>>,
    ) -> Result<HttpTransport> {
        let proxy = config
            .proxy
            .as_deref()
            .map(str::parse::<ProxyConfig>)
            .transpose()?;

        let mut options = TransportOptions::new(&config.user_agent)
            .with_proxy(proxy)
            .with_timeout(std::time::Duration::from_secs(config.endpoints.timeout));
        if let Some(jar) = jar {
            options = options.with_cookie_jar(jar);
        }
        HttpTransport::new(options)
    }

    /// Full private-API login: one batch RPC POST carrying the credentials
    /// and the device identity.
    async fn full_login(&self) -> Result<StoredLogin> {
        let url = format!("{}/batch/execute", self.config.endpoints.api_base_url);
        let form = api_auth::login_form(&self.config.credentials)?;
        let headers = [("Accept".to_string(), "application/json".to_string())];

        self.pacing.delay().await;
        let response = self.transport.post_form(&url, &form, &headers).await?;
        let payload: serde_json::Value = serde_json::from_str(&response.body)?;

        self.check_api_error(&payload)?;

        let stored = StoredLogin::new(payload);
        if stored.session_key().is_none() {
            return Err(OkToolsError::LoginFailed {
                account: self.account_login().to_string(),
                details: format!(
                    "no session key in login response: {}",
                    stored.payload
                ),
            });
        }
        Ok(stored)
    }

    /// Map the structured API error fields onto the taxonomy. 403 means the
    /// provider blocked the account, 401 means the credentials are wrong.
    fn check_api_error(&self, payload: &serde_json::Value) -> Result<()> {
        let error: api_auth::ApiError = serde_json::from_value(payload.clone())?;
        let Some(code) = error.error_code else {
            return Ok(());
        };
        let account = self.account_login().to_string();
        let details = error
            .error_msg
            .unwrap_or_else(|| payload.to_string());
        match code {
            403 => Err(OkToolsError::Blocked {
                account,
                details,
                verification_url: error.ver_redirect_url,
            }),
            401 => Err(OkToolsError::Unauthorized { account, details }),
            _ => Err(OkToolsError::LoginFailed { account, details }),
        }
    }

    /// Refresh the session key when it is older than the configured
    /// interval. A young session is reused without touching the network, so
    /// at most one refresh call fires per expiry.
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&mut self) -> Result<()> {
        if self.mode == AuthMode::Web {
            return Ok(());
        }
        let Some(stored) = &self.login_data else {
            return Err(OkToolsError::LoginFailed {
                account: self.account_login().to_string(),
                details: "no login data held".to_string(),
            });
        };
        // A negative age (future-dated file, clock skew) counts as fresh;
        // comparing as i64 avoids the wrap a truncating cast would take.
        if stored.age_secs() < self.config.refresh_interval_secs as i64 {
            return Ok(());
        }

        debug!("session key stale, refreshing by stored token");
        let auth_token = stored
            .auth_token()
            .ok_or_else(|| OkToolsError::LoginFailed {
                account: self.account_login().to_string(),
                details: "stored login has no auth token to refresh with".to_string(),
            })?
            .to_string();

        let url = format!("{}/auth/loginByToken", self.config.endpoints.api_base_url);
        let query = api_auth::refresh_query(&self.config.credentials, &auth_token);
        self.pacing.delay().await;
        let response = self.transport.get(&url, &query, &[]).await?;

        let payload: serde_json::Value = serde_json::from_str(&response.body)?;
        self.check_api_error(&payload)?;
        let refresh: api_auth::RefreshResponse = serde_json::from_value(payload)?;
        let session_key = refresh
            .session_key
            .ok_or_else(|| OkToolsError::LoginFailed {
                account: self.account_login().to_string(),
                details: "refresh response carried no session key".to_string(),
            })?;

        if let Some(stored) = self.login_data.as_mut() {
            stored.replace_session_key(&session_key);
            let snapshot = stored.clone();
            self.persist_login(&snapshot)?;
        }
        Ok(())
    }

    fn persist_login(&self, stored: &StoredLogin) -> Result<()> {
        if let Some(dir) = &self.config.storage.credentials_dir {
            credentials::save(dir, self.account_login(), stored)?;
        }
        Ok(())
    }

    /// Mirror response cookies into the persistence store. The live jar
    /// inside the transport already picked them up.
    pub(crate) fn record_cookies(&mut self, url: &Url, headers: &reqwest::header::HeaderMap) {
        if let Some((_, file)) = &mut self.cookie_file {
            file.record_response(url, headers);
        }
    }

    pub(crate) fn persist_cookies(&self) -> Result<()> {
        if let Some((path, file)) = &self.cookie_file {
            file.save(path)?;
        }
        Ok(())
    }

    /// Post the logoff form and drop the web session.
    pub async fn logout(&mut self) -> Result<()> {
        if self.mode != AuthMode::Web {
            return Err(OkToolsError::NotPermitted {
                details: "logout is a web-mode operation".to_string(),
            });
        }
        let url = format!("{}{}", self.config.endpoints.web_base_url, self.pages.logout);
        self.pacing.delay().await;
        self.transport
            .post_form(&url, &web_auth::logout_form(), &[])
            .await?;
        Ok(())
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn account_login(&self) -> &str {
        &self.config.credentials.login
    }

    pub fn session_key(&self) -> Option<&str> {
        self.login_data.as_ref().and_then(|d| d.session_key())
    }

    /// Numeric account id in the private-API namespace, when the login
    /// payload carried one.
    pub fn account_api_id(&self) -> Option<&str> {
        self.login_data.as_ref().and_then(|d| d.uid())
    }

    pub fn application_key(&self) -> &str {
        &self.config.credentials.application_key
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.endpoints.api_base_url
    }

    pub fn web_base_url(&self, desktop: bool) -> &str {
        if desktop {
            &self.config.endpoints.desktop_base_url
        } else {
            &self.config.endpoints.web_base_url
        }
    }

    pub fn base_pause_ms(&self) -> u64 {
        self.config.pacing.base_pause_ms
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub(crate) fn markers(&self) -> &StatusMarkers {
        &self.markers
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }
}
