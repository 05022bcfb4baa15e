//! Bright Data SERP proxy provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use rag_core::{RagError, Result, WebResult, WebSearchPort};

use crate::serp::{parse_organic, FieldMap};
use crate::{require_vars, EnvLookup};

pub const USERNAME_VAR: &str = "BRIGHT_DATA_USERNAME";
pub const PASSWORD_VAR: &str = "BRIGHT_DATA_PASSWORD";
pub const HOST_VAR: &str = "BRIGHT_DATA_HOST";
pub const PORT_VAR: &str = "BRIGHT_DATA_PORT";

const DEFAULT_HOST: &str = "brd.superproxy.io";
const DEFAULT_PORT: u16 = 33335;

const FIELDS: FieldMap = FieldMap {
    title: &["title"],
    url: &["url"],
    snippet: &["snippet", "description"],
};

/// Google results fetched through the Bright Data super proxy.
///
/// The proxy re-signs TLS, so certificate verification is disabled for
/// requests sent through it.
pub struct BrightDataSearch {
    endpoint: String,
    timeout: Duration,
    env: EnvLookup,
}

struct ProxyCredentials {
    username: String,
    password: String,
    host: String,
    port: u16,
}

impl BrightDataSearch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, env: EnvLookup) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            env,
        }
    }

    fn credentials(&self) -> Result<ProxyCredentials> {
        let mut values = require_vars(&self.env, &[USERNAME_VAR, PASSWORD_VAR])?.into_iter();
        let username = values.next().unwrap_or_default();
        let password = values.next().unwrap_or_default();

        let host = (self.env)(HOST_VAR)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match (self.env)(PORT_VAR).filter(|p| !p.is_empty()) {
            Some(port) => port
                .parse()
                .map_err(|_| RagError::config(format!("{} is not a valid port: {:?}", PORT_VAR, port)))?,
            None => DEFAULT_PORT,
        };

        Ok(ProxyCredentials {
            username,
            password,
            host,
            port,
        })
    }

    fn client(&self, creds: &ProxyCredentials) -> Result<reqwest::Client> {
        let proxy = reqwest::Proxy::all(format!("http://{}:{}", creds.host, creds.port))
            .map_err(|e| RagError::config(format!("Invalid proxy address: {}", e)))?
            .basic_auth(&creds.username, &creds.password);

        reqwest::Client::builder()
            .proxy(proxy)
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| RagError::upstream(format!("HTTP client error: {}", e)))
    }
}

#[async_trait]
impl WebSearchPort for BrightDataSearch {
    fn provider(&self) -> &'static str {
        "bright_data"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<WebResult>> {
        let creds = self.credentials()?;
        if num_results == 0 {
            return Ok(Vec::new());
        }

        debug!("Bright Data search via {}:{}: {:?}", creds.host, creds.port, query);

        let num = num_results.to_string();
        let response = self
            .client(&creds)?
            .get(&self.endpoint)
            .query(&[("q", query), ("num", num.as_str()), ("brd_json", "1")])
            .send()
            .await
            .map_err(|e| RagError::upstream(format!("Bright Data request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::upstream(format!("Bright Data returned HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RagError::upstream(format!("Bright Data returned invalid JSON: {}", e)))?;

        let results = parse_organic(&body, &FIELDS, num_results);
        info!("Bright Data returned {} results for {:?}", results.len(), query);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_from;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Provider routed through the mock server acting as the proxy.
    fn proxied(server: &MockServer) -> BrightDataSearch {
        let port = server.address().port().to_string();
        BrightDataSearch::new(
            "http://www.google.com/search",
            Duration::from_secs(5),
            env_from(&[
                (USERNAME_VAR, "user"),
                (PASSWORD_VAR, "pass"),
                (HOST_VAR, "127.0.0.1"),
                (PORT_VAR, port.as_str()),
            ]),
        )
    }

    fn search(env: EnvLookup) -> BrightDataSearch {
        BrightDataSearch::new("https://www.google.com/search", Duration::from_secs(1), env)
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let provider = search(env_from(&[]));

        let err = provider.search("rust", 3).await.unwrap_err();
        match err {
            RagError::MissingCredentials { variables } => {
                assert_eq!(variables, vec![USERNAME_VAR, PASSWORD_VAR]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_password_only() {
        let provider = search(env_from(&[(USERNAME_VAR, "user")]));

        let err = provider.search("rust", 3).await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_CREDENTIALS");
        assert!(err.to_string().contains(PASSWORD_VAR));
        assert!(!err.to_string().contains(USERNAME_VAR));
    }

    #[test]
    fn test_credential_defaults() {
        let provider = search(env_from(&[(USERNAME_VAR, "user"), (PASSWORD_VAR, "pass")]));

        let creds = provider.credentials().unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "pass");
        assert_eq!(creds.host, "brd.superproxy.io");
        assert_eq!(creds.port, 33335);
    }

    #[test]
    fn test_credential_overrides() {
        let provider = search(env_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, "pass"),
            (HOST_VAR, "proxy.local"),
            (PORT_VAR, "22225"),
        ]));

        let creds = provider.credentials().unwrap();
        assert_eq!(creds.host, "proxy.local");
        assert_eq!(creds.port, 22225);
    }

    #[test]
    fn test_invalid_port() {
        let provider = search(env_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, "pass"),
            (PORT_VAR, "not-a-port"),
        ]));

        let err = provider.credentials().err().unwrap();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_zero_results_skips_request() {
        // The proxy address is unreachable; a request would fail.
        let provider = search(env_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, "pass"),
            (HOST_VAR, "127.0.0.1"),
            (PORT_VAR, "1"),
        ]));

        assert!(provider.search("rust", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_upstream_failure() {
        let provider = search(env_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, "pass"),
            (HOST_VAR, "127.0.0.1"),
            (PORT_VAR, "1"),
        ]));

        let err = provider.search("rust", 3).await.unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_SEARCH_FAILURE");
    }

    #[tokio::test]
    async fn test_search_through_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust async"))
            .and(query_param("num", "2"))
            .and(query_param("brd_json", "1"))
            // base64("user:pass")
            .and(header("proxy-authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {"title": "Tokio", "url": "https://tokio.rs", "snippet": "An async runtime."},
                    {"title": "Async Book", "url": "https://rust-lang.github.io/async-book", "description": "Learn async."},
                    {"title": "Extra", "url": "https://example.com", "snippet": "Trimmed."}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = proxied(&server).search("rust async", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Tokio");
        assert_eq!(results[0].url, "https://tokio.rs");
        assert_eq!(results[0].snippet, "An async runtime.");
        assert_eq!(results[1].url, "https://rust-lang.github.io/async-book");
        assert_eq!(results[1].snippet, "Learn async.");
    }

    #[tokio::test]
    async fn test_proxy_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = proxied(&server).search("rust", 3).await.unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_SEARCH_FAILURE");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;

        let err = proxied(&server).search("rust", 3).await.unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_SEARCH_FAILURE");
    }
}
