use crate::client::USER_AGENT;
use crate::error::{RestError, Result};
use crate::multipart::{BarePartsEncoder, MultipartBody, MultipartEncoder};
use crate::params::{FileUpload, Param, ParamTree};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Flat `name[child]` keyed pairs, in tree order
pub type NamespacedParams = Vec<(String, String)>;

/// Control key: follow redirects (default true)
pub const ALLOW_REDIRECTS: &str = "allow_redirects";
/// Control key: verify TLS certificates (default true)
pub const VERIFY_SSL: &str = "verify_ssl";
/// Control key: scheme to proxy URL mapping
pub const PROXIES: &str = "proxies";

/// HTTP verbs understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Head => "head",
        }
    }

    /// Reads carry their parameters in the query string
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl FromStr for Method {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            _ => Err(RestError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// application/x-www-form-urlencoded payload
    Form(String),
    Multipart(MultipartBody),
}

/// A fully formatted request, ready for a [`Transport`](crate::transport::Transport)
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Final URL, including the query string for reads
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    pub verify_ssl: bool,
    /// Scheme (`http`, `https`, `all`) to proxy URL
    pub proxies: BTreeMap<String, String>,
    pub allow_redirects: bool,
}

impl RequestSpec {
    /// Look up a header value, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Control options consumed from the parameter tree
#[derive(Debug, Clone, PartialEq, Eq)]
struct Controls {
    allow_redirects: bool,
    verify_ssl: bool,
    proxies: BTreeMap<String, String>,
}

impl Controls {
    fn take(params: &mut ParamTree) -> Result<Self> {
        let allow_redirects = take_flag(params, ALLOW_REDIRECTS)?.unwrap_or(true);
        let verify_ssl = take_flag(params, VERIFY_SSL)?.unwrap_or(true);

        let proxies = match params.remove(PROXIES) {
            None | Some(Param::Null) => BTreeMap::new(),
            Some(Param::Tree(tree)) => tree
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(scheme, v)| match v {
                    Param::Str(url) => Ok((scheme, url)),
                    other => Err(RestError::InvalidParams(format!(
                        "proxy for {} must be a string, got {:?}",
                        scheme, other
                    ))),
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
            Some(other) => {
                return Err(RestError::InvalidParams(format!(
                    "{} must be a mapping, got {:?}",
                    PROXIES, other
                )))
            }
        };

        Ok(Controls {
            allow_redirects,
            verify_ssl,
            proxies,
        })
    }
}

fn take_flag(params: &mut ParamTree, key: &str) -> Result<Option<bool>> {
    match params.remove(key) {
        None | Some(Param::Null) => Ok(None),
        Some(Param::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(RestError::InvalidParams(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}

/// Split a tree into namespaced text fields and file fields.
///
/// Nulls are dropped at every depth. Nested trees add one `[child]` level,
/// list items are repeated under `name[]`.
pub fn namespace_params(tree: ParamTree) -> (NamespacedParams, Vec<(String, FileUpload)>) {
    let mut fields = Vec::new();
    let mut files = Vec::new();
    flatten_tree(None, tree, &mut fields, &mut files);
    (fields, files)
}

fn flatten_tree(
    prefix: Option<&str>,
    tree: ParamTree,
    fields: &mut NamespacedParams,
    files: &mut Vec<(String, FileUpload)>,
) {
    for (key, value) in tree {
        let name = match prefix {
            Some(parent) => format!("{}[{}]", parent, key),
            None => key,
        };
        flatten_value(name, value, fields, files);
    }
}

fn flatten_value(
    name: String,
    value: Param,
    fields: &mut NamespacedParams,
    files: &mut Vec<(String, FileUpload)>,
) {
    match value {
        Param::Null => {}
        Param::Tree(tree) => flatten_tree(Some(name.as_str()), tree, fields, files),
        Param::List(items) => {
            let item_name = format!("{}[]", name);
            for item in items {
                flatten_value(item_name.clone(), item, fields, files);
            }
        }
        Param::File(file) => files.push((name, file)),
        scalar => {
            if let Some(value) = scalar.scalar_string() {
                fields.push((name, value));
            }
        }
    }
}

fn form_encode(fields: &NamespacedParams) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// Turns a method, URL and parameter tree into a [`RequestSpec`].
pub struct RequestFormatter {
    user_agent: String,
    encoder: Arc<dyn MultipartEncoder>,
}

impl RequestFormatter {
    pub fn new() -> Self {
        RequestFormatter {
            user_agent: USER_AGENT.to_string(),
            encoder: Arc::new(BarePartsEncoder::new()),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Replace the multipart encoding strategy
    pub fn with_encoder(mut self, encoder: Arc<dyn MultipartEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Build a request from a verb name.
    ///
    /// Fails with [`RestError::UnsupportedMethod`] for anything other than
    /// get, post, put, delete and head.
    pub fn build_request(&self, method: &str, url: &str, params: ParamTree) -> Result<RequestSpec> {
        let method: Method = method.parse()?;
        self.format(method, url, params)
    }

    /// Build a request for an already validated verb
    pub fn format(&self, method: Method, url: &str, mut params: ParamTree) -> Result<RequestSpec> {
        let controls = Controls::take(&mut params)?;
        let mut url = Url::parse(url)?;
        let (fields, files) = namespace_params(params);

        let mut headers = vec![("User-Agent".to_string(), self.user_agent.clone())];

        let body = if method.is_read() {
            if !files.is_empty() {
                warn!(
                    method = %method,
                    count = files.len(),
                    "dropping file parameters on a request without a body"
                );
            }
            if !fields.is_empty() {
                url.query_pairs_mut().extend_pairs(&fields);
            }
            Body::Empty
        } else if !files.is_empty() {
            let multipart = self.encoder.encode(&fields, files)?;
            headers.push(("Content-Type".to_string(), multipart.content_type.clone()));
            Body::Multipart(multipart)
        } else if !fields.is_empty() {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            Body::Form(form_encode(&fields))
        } else {
            Body::Empty
        };

        debug!(method = %method, url = %url, "formatted request");

        Ok(RequestSpec {
            method,
            url: url.into(),
            headers,
            body,
            verify_ssl: controls.verify_ssl,
            proxies: controls.proxies,
            allow_redirects: controls.allow_redirects,
        })
    }
}

impl Default for RequestFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestFormatter")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Apply the redirect/status policy to a completed call.
///
/// A 301 or 302 is accepted when redirect following was disabled; any other
/// status outside 2xx is an [`RestError::HttpStatus`].
pub fn check_status(status: u16, allow_redirects: bool, body: &[u8]) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    if matches!(status, 301 | 302) && !allow_redirects {
        debug!(status, "redirect not followed");
        return Ok(());
    }
    Err(RestError::http(status, String::from_utf8_lossy(body)))
}
