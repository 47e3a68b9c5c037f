//! The HTTP seam between formatted requests and the network.

use crate::client::create_http_client;
use crate::error::Result;
use crate::request::{Body, Method, RequestSpec};
use reqwest::blocking::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// A raw HTTP response as seen by the response wrapper
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after any redirects
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
            ..HttpResponse::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Canonical reason phrase for the status code
    pub fn reason(&self) -> Option<&'static str> {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
    }
}

/// Executes a [`RequestSpec`].
///
/// Transport failures (DNS, TLS, connection) are returned unchanged; status
/// codes are not interpreted here.
pub trait Transport {
    fn send(&self, request: RequestSpec) -> Result<HttpResponse>;
}

/// Options that require a separately configured HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientOptions {
    verify_ssl: bool,
    allow_redirects: bool,
    proxies: BTreeMap<String, String>,
}

impl ClientOptions {
    fn of(request: &RequestSpec) -> Self {
        ClientOptions {
            verify_ssl: request.verify_ssl,
            allow_redirects: request.allow_redirects,
            proxies: request.proxies.clone(),
        }
    }
}

/// Blocking transport backed by reqwest.
///
/// One client is built per distinct set of TLS, redirect and proxy options
/// and reused for later calls with the same options.
#[derive(Debug)]
pub struct ReqwestTransport {
    clients: Mutex<HashMap<ClientOptions, Client>>,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let transport = ReqwestTransport {
            clients: Mutex::new(HashMap::new()),
            timeout,
        };
        let defaults = ClientOptions {
            verify_ssl: true,
            allow_redirects: true,
            proxies: BTreeMap::new(),
        };
        transport.client_with(defaults)?;
        Ok(transport)
    }

    fn client_for(&self, request: &RequestSpec) -> Result<Client> {
        self.client_with(ClientOptions::of(request))
    }

    fn client_with(&self, options: ClientOptions) -> Result<Client> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = clients.get(&options) {
            return Ok(client.clone());
        }
        let client = create_http_client(
            options.verify_ssl,
            options.allow_redirects,
            &options.proxies,
            self.timeout,
        )?;
        clients.insert(options, client.clone());
        Ok(client)
    }

    /// Number of distinct clients built so far
    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: RequestSpec) -> Result<HttpResponse> {
        let client = self.client_for(&request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        };

        let mut builder = client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Form(form) => builder.body(form),
            Body::Multipart(multipart) => builder.body(multipart.data),
        };

        let start = Instant::now();
        let response = builder.send()?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes()?.to_vec();

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            elapsed = ?start.elapsed(),
            "request completed"
        );

        Ok(HttpResponse {
            status,
            url: Some(url),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_header_lookup() {
        let response = HttpResponse::new(302, "")
            .with_url("http://example.com")
            .with_header("Location", "http://example.com/next");
        assert_eq!(response.header("location"), Some("http://example.com/next"));
        assert_eq!(response.url.as_deref(), Some("http://example.com"));
    }

    fn request(verify_ssl: bool, allow_redirects: bool) -> RequestSpec {
        RequestSpec {
            method: Method::Get,
            url: "https://api.everyplay.com/videos.json".to_string(),
            headers: Vec::new(),
            body: Body::Empty,
            verify_ssl,
            proxies: BTreeMap::new(),
            allow_redirects,
        }
    }

    #[test]
    fn test_clients_reused_per_option_set() {
        let transport = ReqwestTransport::new().unwrap();
        assert_eq!(transport.client_count(), 1);

        transport.client_for(&request(true, true)).unwrap();
        assert_eq!(transport.client_count(), 1);

        transport.client_for(&request(false, true)).unwrap();
        transport.client_for(&request(false, true)).unwrap();
        assert_eq!(transport.client_count(), 2);

        transport.client_for(&request(false, false)).unwrap();
        assert_eq!(transport.client_count(), 3);
    }

    #[test]
    fn test_response_reason() {
        assert_eq!(HttpResponse::new(404, "").reason(), Some("Not Found"));
        assert_eq!(HttpResponse::new(200, "{}").text(), "{}");
    }
}
