use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::error::{OkToolsError, Result};
use crate::transport::proxy::ProxyConfig;

/// Terminal 2xx response. Anything else became an
/// [`OkToolsError::Transport`] before reaching the caller.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Build-time knobs for a transport instance. One per account.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
    /// Present in browser-emulation mode, absent for the stateless
    /// bearer-token API mode.
    pub cookie_jar: Option<Arc<Jar>>,
    pub timeout: Duration,
}

impl TransportOptions {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            proxy: None,
            cookie_jar: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Executes raw HTTP against the provider. Follows redirects, decompresses
/// gzip bodies, injects the configured user agent, and optionally routes
/// through a proxy. Status interpretation happens upstream; this layer only
/// distinguishes 2xx from everything else.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(options: TransportOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .map_err(|e| OkToolsError::Config(format!("invalid user agent: {e}")))?,
        );

        let mut builder = Client::builder()
            .default_headers(headers)
            .gzip(true)
            .timeout(options.timeout);

        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(proxy.to_proxy()?);
        }
        if let Some(jar) = options.cookie_jar {
            builder = builder.cookie_provider(jar);
        }

        let client = builder
            .build()
            .map_err(|e| OkToolsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    #[instrument(skip(self, query, headers))]
    pub async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<RawResponse> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        request = Self::apply_headers(request, headers)?;

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    #[instrument(skip(self, form, headers))]
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &[(String, String)],
    ) -> Result<RawResponse> {
        debug!("POST {}", url);
        let mut request = self.client.post(url).form(form);
        request = Self::apply_headers(request, headers)?;

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// POST an opaque body, e.g. photo bytes against an upload URL.
    #[instrument(skip(self, body))]
    pub async fn post_raw(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<RawResponse> {
        debug!("POST {} ({} raw bytes)", url, body.len());
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| OkToolsError::Config(format!("invalid content type: {e}")))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn apply_headers(
        mut request: reqwest::RequestBuilder,
        headers: &[(String, String)],
    ) -> Result<reqwest::RequestBuilder> {
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| OkToolsError::Config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| OkToolsError::Config(format!("invalid header value for '{key}': {e}")))?;
            request = request.header(name, value);
        }
        Ok(request)
    }

    async fn handle_response(response: Response) -> Result<RawResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!("response status {}", status);

        if status.is_success() {
            Ok(RawResponse {
                status,
                headers,
                body,
            })
        } else {
            error!("request failed, status {}", status);
            Err(OkToolsError::Transport {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests_http_transport {
    use super::*;
    use crate::utils::logger::setup_logger;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    fn create_transport() -> HttpTransport {
        HttpTransport::new(TransportOptions::new("test-agent")).unwrap()
    }

    #[tokio::test]
    async fn test_get_success() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", "test-agent")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let transport = create_transport();
        let response = transport
            .get(&format!("{}/page", server.url()), &[], &[])
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_appends_query() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_query(Matcher::UrlEncoded("token".into(), "abc".into()))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let transport = create_transport();
        transport
            .get(
                &format!("{}/page", server.url()),
                &[("token".to_string(), "abc".to_string())],
                &[],
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_form_url_encoded() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fr.login".into(), "user".into()),
                Matcher::UrlEncoded("fr.posted".into(), "set".into()),
            ]))
            .with_status(200)
            .with_body("logged")
            .create_async()
            .await;

        let transport = create_transport();
        let response = transport
            .post_form(
                &format!("{}/login", server.url()),
                &[
                    ("fr.login".to_string(), "user".to_string()),
                    ("fr.posted".to_string(), "set".to_string()),
                ],
                &[],
            )
            .await
            .unwrap();

        assert_eq!(response.body, "logged");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_raw_sets_content_type() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header("content-type", "application/octet-stream")
            .with_status(200)
            .with_body(r#"{"photos":[]}"#)
            .create_async()
            .await;

        let transport = create_transport();
        transport
            .post_raw(
                &format!("{}/upload", server.url()),
                vec![0xde, 0xad, 0xbe, 0xef],
                "application/octet-stream",
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_becomes_transport_error_with_payload() {
        setup_logger();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(404)
            .with_header("x-trace", "trace-1")
            .with_body("not here")
            .create_async()
            .await;

        let transport = create_transport();
        let err = transport
            .get(&format!("{}/gone", server.url()), &[], &[])
            .await
            .unwrap_err();

        match err {
            OkToolsError::Transport {
                status,
                headers,
                body,
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "not here");
                assert_eq!(headers.get("x-trace").unwrap(), "trace-1");
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_headers_are_sent() {
        setup_logger();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("tkn", "anti-forgery")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let transport = create_transport();
        transport
            .get(
                &format!("{}/page", server.url()),
                &[],
                &[("tkn".to_string(), "anti-forgery".to_string())],
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
