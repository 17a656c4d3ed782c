//! Proxy descriptor parsing. The descriptor string is `type:ip:port:login:password`
//! with type `http` or `socks5`. Malformed strings are rejected here, at
//! configuration time, never at request time.

use std::fmt;
use std::str::FromStr;

use crate::error::{OkToolsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Http,
    Socks5,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl FromStr for ProxyConfig {
    type Err = OkToolsError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != 5 {
            return Err(OkToolsError::Config(format!(
                "proxy spec must have 5 colon-separated fields, got {}",
                fields.len()
            )));
        }

        let kind = match fields[0] {
            "http" => ProxyKind::Http,
            "socks5" => ProxyKind::Socks5,
            other => {
                return Err(OkToolsError::Config(format!(
                    "unknown proxy type '{other}', expected http or socks5"
                )))
            }
        };

        let port = fields[2]
            .parse::<u16>()
            .map_err(|_| OkToolsError::Config(format!("invalid proxy port '{}'", fields[2])))?;

        Ok(Self {
            kind,
            host: fields[1].to_string(),
            port,
            username: fields[3].to_string(),
            password: fields[4].to_string(),
        })
    }
}

impl ProxyConfig {
    /// Build the reqwest proxy for this descriptor.
    pub fn to_proxy(&self) -> Result<reqwest::Proxy> {
        let scheme = match self.kind {
            ProxyKind::Http => "http",
            ProxyKind::Socks5 => "socks5",
        };
        let proxy = reqwest::Proxy::all(format!("{scheme}://{}:{}", self.host, self.port))?
            .basic_auth(&self.username, &self.password);
        Ok(proxy)
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ProxyKind::Http => "http",
            ProxyKind::Socks5 => "socks5",
        };
        // Credentials stay out of logs.
        write!(f, "{kind}://{}:{}", self.host, self.port)
    }
}
