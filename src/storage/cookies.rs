//! File-backed cookie store for the browser-emulation mode, one file per
//! account. Cookies are kept in the Netscape tab-separated format so the
//! files stay interoperable with curl and browser exports. The store feeds
//! a `reqwest::cookie::Jar` on client construction and records `Set-Cookie`
//! headers from responses so the next run resumes the same browser session.

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, SET_COOKIE};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp, 0 for session cookies.
    pub expires: u64,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct CookieFile {
    cookies: Vec<StoredCookie>,
}

impl CookieFile {
    pub fn account_path(dir: &Path, account: &str) -> PathBuf {
        dir.join(format!("{account}.cookies"))
    }

    /// Load a cookie file. A missing file yields an empty store; a malformed
    /// line is skipped with a warning rather than poisoning the session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let mut cookies = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some(cookie) => cookies.push(cookie),
                None => warn!("skipping malformed cookie line {}", idx + 1),
            }
        }
        debug!("loaded {} cookies from {:?}", cookies.len(), path);
        Ok(Self { cookies })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::from("# Netscape HTTP Cookie File\n");
        for c in &self.cookies {
            let tailmatch = if c.domain.starts_with('.') {
                "TRUE"
            } else {
                "FALSE"
            };
            let secure = if c.secure { "TRUE" } else { "FALSE" };
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                c.domain, tailmatch, c.path, secure, c.expires, c.name, c.value
            ));
        }
        fs::write(path, out)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn cookies(&self) -> &[StoredCookie] {
        &self.cookies
    }

    /// Build a jar pre-loaded with the stored cookies, suitable for
    /// `ClientBuilder::cookie_provider`.
    pub fn to_jar(&self) -> Arc<Jar> {
        let jar = Arc::new(Jar::default());
        for c in &self.cookies {
            let scheme = if c.secure { "https" } else { "http" };
            let host = c.domain.trim_start_matches('.');
            let origin = format!("{scheme}://{host}{}", c.path);
            match origin.parse::<Url>() {
                Ok(url) => {
                    let header = format!(
                        "{}={}; Domain={}; Path={}",
                        c.name, c.value, c.domain, c.path
                    );
                    jar.add_cookie_str(&header, &url);
                }
                Err(_) => warn!("skipping cookie with unparseable domain {}", c.domain),
            }
        }
        jar
    }

    /// Record `Set-Cookie` headers from a response so they survive the
    /// process. The live jar inside reqwest picks them up on its own; this
    /// mirror exists purely for persistence.
    pub fn record_response(&mut self, url: &Url, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(cookie) = parse_set_cookie(raw, url) else {
                continue;
            };
            self.cookies
                .retain(|c| !(c.name == cookie.name && c.domain == cookie.domain));
            self.cookies.push(cookie);
        }
    }
}

/// One Netscape line: domain, tailmatch, path, secure, expires, name, value.
fn parse_line(line: &str) -> Option<StoredCookie> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 {
        return None;
    }
    Some(StoredCookie {
        domain: fields[0].to_string(),
        path: fields[2].to_string(),
        secure: fields[3] == "TRUE",
        expires: fields[4].parse().ok()?,
        name: fields[5].to_string(),
        value: fields[6].to_string(),
    })
}

/// Minimal Set-Cookie parsing: name=value plus the attributes the store
/// keeps. Unknown attributes are ignored.
fn parse_set_cookie(raw: &str, url: &Url) -> Option<StoredCookie> {
    let mut parts = raw.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;
    if name.is_empty() {
        return None;
    }

    let mut cookie = StoredCookie {
        domain: url.host_str()?.to_string(),
        path: "/".to_string(),
        secure: false,
        expires: 0,
        name: name.to_string(),
        value: value.to_string(),
    };

    for attr in parts {
        match attr.split_once('=') {
            Some((k, v)) if k.eq_ignore_ascii_case("domain") => cookie.domain = v.to_string(),
            Some((k, v)) if k.eq_ignore_ascii_case("path") => cookie.path = v.to_string(),
            Some((k, v)) if k.eq_ignore_ascii_case("max-age") => {
                if let Ok(secs) = v.parse::<i64>() {
                    cookie.expires = (chrono::Utc::now().timestamp() + secs).max(0) as u64;
                }
            }
            None if attr.eq_ignore_ascii_case("secure") => cookie.secure = true,
            _ => {}
        }
    }
    Some(cookie)
}
