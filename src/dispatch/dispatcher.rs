use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{OkToolsError, Result};
use crate::pacing::Pacing;
use crate::session::{AuthMode, SessionManager};

static FORM_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="tkn"\s+value="([^"]+)""#).expect("static regex"));
static PAGE_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""gwtHash":"([^"]+)""#).expect("static regex"));

/// HTTP verb of an API call issued through [`Dispatcher::make_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

/// Central request funnel. Every page visit and API call of an account goes
/// through here so pacing, captcha detection, cookie persistence and the
/// desktop anti-forgery token are applied uniformly. Methods take `&mut self`
/// to keep one account on one sequential request flow.
#[derive(Debug)]
pub struct Dispatcher {
    session: SessionManager,
    pacing: Pacing,
    /// Body of the last successful page visit, kept for scrapers and for
    /// post-mortem inspection after a typed failure.
    last_response: Option<String>,
    /// Desktop anti-forgery token, harvested from the first desktop page.
    form_token: Option<String>,
    /// GWT state hash of the desktop frontend, harvested alongside the token.
    page_hash: Option<String>,
}

impl Dispatcher {
    pub fn new(session: SessionManager) -> Self {
        let pacing = Pacing::from_millis(session.base_pause_ms());
        Self {
            session,
            pacing,
            last_response: None,
            form_token: None,
            page_hash: None,
        }
    }

    /// Visit a page and return its body. `desktop` switches to the desktop
    /// frontend and maintains its anti-forgery token.
    #[instrument(skip(self, extra_headers))]
    pub async fn attend_page(
        &mut self,
        path: &str,
        desktop: bool,
        extra_headers: &[(String, String)],
    ) -> Result<String> {
        self.paced_page(path, desktop, None, extra_headers).await
    }

    /// POST a form to a page and return the resulting body. Used for the
    /// in-page actions of browser emulation.
    #[instrument(skip(self, form, extra_headers))]
    pub async fn send_form(
        &mut self,
        path: &str,
        form: &[(String, String)],
        desktop: bool,
        extra_headers: &[(String, String)],
    ) -> Result<String> {
        self.paced_page(path, desktop, Some(form), extra_headers)
            .await
    }

    async fn paced_page(
        &mut self,
        path: &str,
        desktop: bool,
        form: Option<&[(String, String)]>,
        extra_headers: &[(String, String)],
    ) -> Result<String> {
        self.pacing.delay().await;

        let url = format!("{}{}", self.session.web_base_url(desktop), path);
        let mut headers = extra_headers.to_vec();
        if desktop {
            if let Some(token) = &self.form_token {
                headers.push(("tkn".to_string(), token.clone()));
            }
        }

        let response = match form {
            Some(form) => {
                self.session
                    .transport()
                    .post_form(&url, form, &headers)
                    .await?
            }
            None => self.session.transport().get(&url, &[], &headers).await?,
        };

        if let Ok(parsed) = Url::parse(&url) {
            self.session.record_cookies(&parsed, &response.headers);
        }
        self.session.persist_cookies()?;

        self.check_captcha(&response.body)?;
        if desktop {
            self.harvest_desktop_tokens(&response.body);
        }

        // A human reads the page before acting on it.
        self.pacing.delay().await;

        self.last_response = Some(response.body.clone());
        Ok(response.body)
    }

    /// Call a private-API method and return its JSON payload. The application
    /// key and the current session key are injected unless the caller already
    /// set them. With `browser_emulation` a second pacing delay follows the
    /// call, matching the page-visit cadence.
    #[instrument(skip(self, params, extra_headers))]
    pub async fn make_request(
        &mut self,
        method_path: &str,
        params: &[(String, String)],
        verb: Verb,
        browser_emulation: bool,
        extra_headers: &[(String, String)],
    ) -> Result<serde_json::Value> {
        if self.session.mode() != AuthMode::Api {
            return Err(OkToolsError::NotPermitted {
                details: "API calls require a private-API session".to_string(),
            });
        }
        self.session.ensure_fresh().await?;
        self.pacing.delay().await;

        let mut params = params.to_vec();
        if !params.iter().any(|(k, _)| k == "application_key") {
            params.push((
                "application_key".to_string(),
                self.session.application_key().to_string(),
            ));
        }
        if !params.iter().any(|(k, _)| k == "session_key") {
            let key = self
                .session
                .session_key()
                .ok_or_else(|| OkToolsError::LoginFailed {
                    account: self.session.account_login().to_string(),
                    details: "no live session key".to_string(),
                })?;
            params.push(("session_key".to_string(), key.to_string()));
        }

        let url = format!(
            "{}/{}",
            self.session.api_base_url(),
            method_path.trim_start_matches('/')
        );
        let response = match verb {
            Verb::Get => {
                self.session
                    .transport()
                    .get(&url, &params, extra_headers)
                    .await?
            }
            Verb::Post => {
                self.session
                    .transport()
                    .post_form(&url, &params, extra_headers)
                    .await?
            }
        };

        self.check_captcha(&response.body)?;
        if browser_emulation {
            self.pacing.delay().await;
        }
        self.last_response = Some(response.body.clone());

        let payload: serde_json::Value = serde_json::from_str(&response.body)?;
        self.check_api_error(&payload)?;
        Ok(payload)
    }

    /// A captcha interstitial ships with a 200 status, so the body marker is
    /// checked before any success interpretation.
    fn check_captcha(&mut self, body: &str) -> Result<()> {
        if body.contains(&self.session.markers().captcha) {
            warn!(
                "captcha challenge served to {}",
                self.session.account_login()
            );
            self.last_response = Some(body.to_string());
            return Err(OkToolsError::Captcha {
                account: self.session.account_login().to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }

    fn check_api_error(&self, payload: &serde_json::Value) -> Result<()> {
        let Some(code) = payload["error_code"].as_i64() else {
            return Ok(());
        };
        let details = payload["error_msg"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string());
        let account = self.session.account_login().to_string();
        match code {
            403 => Err(OkToolsError::Blocked {
                account,
                details,
                verification_url: payload["ver_redirect_url"].as_str().map(str::to_string),
            }),
            401 => Err(OkToolsError::Unauthorized { account, details }),
            _ => Err(OkToolsError::NotPermitted { details }),
        }
    }

    fn harvest_desktop_tokens(&mut self, body: &str) {
        if let Some(caps) = FORM_TOKEN_RE.captures(body) {
            debug!("anti-forgery token refreshed");
            self.form_token = Some(caps[1].to_string());
        }
        if let Some(caps) = PAGE_HASH_RE.captures(body) {
            self.page_hash = Some(caps[1].to_string());
        }
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn form_token(&self) -> Option<&str> {
        self.form_token.as_deref()
    }

    pub fn page_hash(&self) -> Option<&str> {
        self.page_hash.as_deref()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }
}
