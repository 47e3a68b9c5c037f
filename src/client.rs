use crate::error::{RestError, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::redirect::Policy;
use reqwest::Proxy;
use std::collections::BTreeMap;
use std::time::Duration;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("everyplay-rs/", env!("CARGO_PKG_VERSION"));

/// Default API host
pub const DEFAULT_SITE: &str = "api.everyplay.com";

/// Create an HTTP client for one combination of transport options.
///
/// `proxies` maps `http`, `https` or `all` to a proxy URL; a bare
/// `host:port` is treated as an http proxy.
pub fn create_http_client(
    verify_ssl: bool,
    allow_redirects: bool,
    proxies: &BTreeMap<String, String>,
    timeout: Option<Duration>,
) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout);

    if !verify_ssl {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if !allow_redirects {
        builder = builder.redirect(Policy::none());
    }
    for (scheme, url) in proxies {
        let proxy = match scheme.as_str() {
            "http" => Proxy::http(url.as_str())?,
            "https" => Proxy::https(url.as_str())?,
            "all" => Proxy::all(url.as_str())?,
            other => {
                return Err(RestError::InvalidParams(format!(
                    "unknown proxy scheme: {}",
                    other
                )))
            }
        };
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Configuration for the Everyplay API client
#[derive(Debug, Clone)]
pub struct Config {
    /// Application client id, sent as `client_id` on every call
    pub client_id: Option<String>,
    /// Application secret; kept for token flows handled by the caller
    pub client_secret: Option<String>,
    /// OAuth access token, sent as `oauth_token` on every call
    pub access_token: Option<String>,
    /// API host
    pub site: String,
    /// Use https (default) or http
    pub use_ssl: bool,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Scheme to proxy URL
    pub proxies: BTreeMap<String, String>,
    /// Follow 3xx responses
    pub allow_redirects: bool,
    pub user_agent: String,
    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client_id: None,
            client_secret: None,
            access_token: None,
            site: DEFAULT_SITE.to_string(),
            use_ssl: true,
            verify_ssl: true,
            proxies: BTreeMap::new(),
            allow_redirects: true,
            user_agent: USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl Config {
    /// Create a configuration for the given client id
    pub fn new(client_id: impl Into<String>) -> Self {
        Config {
            client_id: Some(client_id.into()),
            ..Config::default()
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Add a proxy for `http`, `https` or `all`
    pub fn with_proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies.insert(scheme.into(), url.into());
        self
    }

    pub fn with_redirects(mut self, allow_redirects: bool) -> Self {
        self.allow_redirects = allow_redirects;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.site)
    }

    /// Map a resource name like `videos` or `/games/1/` to its endpoint URL
    pub fn resolve_resource_name(&self, name: &str) -> String {
        format!("{}/{}.json", self.base_url(), name.trim_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site, "api.everyplay.com");
        assert!(config.use_ssl);
        assert!(config.verify_ssl);
        assert!(config.allow_redirects);
        assert_eq!(config.client_id, None);
        assert!(config.user_agent.starts_with("everyplay-rs/"));
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("foo")
            .with_client_secret("bar")
            .with_access_token("baz")
            .with_site("api.everyplay.dev")
            .with_proxy("http", "myproxyserver:1234");
        assert_eq!(config.client_id.as_deref(), Some("foo"));
        assert_eq!(config.client_secret.as_deref(), Some("bar"));
        assert_eq!(config.access_token.as_deref(), Some("baz"));
        assert_eq!(config.site, "api.everyplay.dev");
        assert_eq!(
            config.proxies.get("http").map(String::as_str),
            Some("myproxyserver:1234")
        );
    }

    #[test]
    fn test_url_creation() {
        let config = Config::new("foo");
        assert_eq!(
            config.resolve_resource_name("videos"),
            "https://api.everyplay.com/videos.json"
        );
        assert_eq!(
            config.resolve_resource_name("/videos/"),
            "https://api.everyplay.com/videos.json"
        );
    }

    #[test]
    fn test_url_creation_options() {
        let config = Config::new("foo").with_ssl(false).with_site("everyplay.dev");
        assert_eq!(
            config.resolve_resource_name("games/1"),
            "http://everyplay.dev/games/1.json"
        );
    }

    #[test]
    fn test_create_http_client_rejects_unknown_proxy_scheme() {
        let mut proxies = BTreeMap::new();
        proxies.insert("gopher".to_string(), "proxy:70".to_string());
        let err = create_http_client(true, true, &proxies, None).unwrap_err();
        assert!(matches!(err, RestError::InvalidParams(_)));
    }

    #[test]
    fn test_create_http_client_with_options() {
        let mut proxies = BTreeMap::new();
        proxies.insert("http".to_string(), "myproxyserver:1234".to_string());
        assert!(create_http_client(false, false, &proxies, Some(Duration::from_secs(5))).is_ok());
    }
}
