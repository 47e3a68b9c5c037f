use crate::client::Config;
use crate::error::Result;
use crate::params::{Param, ParamTree};
use crate::request::{check_status, Method, RequestFormatter, ALLOW_REDIRECTS, PROXIES, VERIFY_SSL};
use crate::response::{wrap, wrap_lenient, Wrapped};
use crate::transport::{ReqwestTransport, Transport};
use tracing::debug;

/// Client for the Everyplay API.
///
/// Every call resolves the resource name against the configured site, adds
/// the client credentials, and returns the wrapped response.
pub struct RestClient<T: Transport = ReqwestTransport> {
    /// Configuration
    pub config: Config,
    formatter: RequestFormatter,
    transport: T,
}

impl RestClient<ReqwestTransport> {
    /// Create a client using the blocking reqwest transport
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> RestClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(config: Config, transport: T) -> Self {
        let formatter = RequestFormatter::new().with_user_agent(config.user_agent.clone());
        RestClient {
            config,
            formatter,
            transport,
        }
    }

    /// Replace the request formatter, e.g. to inject a multipart encoder
    pub fn with_formatter(mut self, formatter: RequestFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Make a request with a verb given by name
    ///
    /// # Arguments
    /// * `method` - get, post, put, delete or head
    /// * `resource` - resource name such as `videos` or `/games/1`
    /// * `params` - request parameters; `allow_redirects`, `verify_ssl` and
    ///   `proxies` override the configured transport options for this call
    pub fn request(&self, method: &str, resource: &str, params: ParamTree) -> Result<Wrapped> {
        let method: Method = method.parse()?;
        self.call(method, resource, params)
    }

    pub fn get(&self, resource: &str, params: ParamTree) -> Result<Wrapped> {
        self.call(Method::Get, resource, params)
    }

    pub fn post(&self, resource: &str, params: ParamTree) -> Result<Wrapped> {
        self.call(Method::Post, resource, params)
    }

    pub fn put(&self, resource: &str, params: ParamTree) -> Result<Wrapped> {
        self.call(Method::Put, resource, params)
    }

    pub fn delete(&self, resource: &str, params: ParamTree) -> Result<Wrapped> {
        self.call(Method::Delete, resource, params)
    }

    pub fn head(&self, resource: &str, params: ParamTree) -> Result<Wrapped> {
        self.call(Method::Head, resource, params)
    }

    fn call(&self, method: Method, resource: &str, mut params: ParamTree) -> Result<Wrapped> {
        let url = self.config.resolve_resource_name(resource);
        self.apply_defaults(&mut params);

        let request = self.formatter.format(method, &url, params)?;
        let allow_redirects = request.allow_redirects;
        let response = self.transport.send(request)?;

        check_status(response.status, allow_redirects, &response.body)?;

        if matches!(response.status, 301 | 302) {
            debug!(status = response.status, url = %url, "returning unfollowed redirect");
            return Ok(wrap_lenient(&response));
        }
        wrap(&response)
    }

    /// Merge credentials and configured transport options into the params
    fn apply_defaults(&self, params: &mut ParamTree) {
        if let Some(ref token) = self.config.access_token {
            params.insert("oauth_token", token);
        }
        if let Some(ref client_id) = self.config.client_id {
            params.insert("client_id", client_id);
        }

        if !params.contains_key(VERIFY_SSL) {
            params.insert(VERIFY_SSL, self.config.verify_ssl);
        }
        if !params.contains_key(ALLOW_REDIRECTS) {
            params.insert(ALLOW_REDIRECTS, self.config.allow_redirects);
        }
        if !params.contains_key(PROXIES) && !self.config.proxies.is_empty() {
            let proxies: ParamTree = self
                .config
                .proxies
                .iter()
                .map(|(scheme, url)| (scheme.clone(), Param::from(url)))
                .collect();
            params.insert(PROXIES, proxies);
        }
    }
}
