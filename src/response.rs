use crate::error::{RestError, Result};
use crate::transport::HttpResponse;
use serde_json::{Map, Value};
use std::ops::Index;

/// One parsed JSON object plus the HTTP metadata of the call that produced it.
///
/// Elements of a [`ResourceList`] leave the metadata fields empty; only the
/// top-level value returned by [`wrap`] carries them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    fields: Map<String, Value>,
    /// HTTP status of the response
    pub status_code: Option<u16>,
    /// Final URL of the response
    pub url: Option<String>,
    /// Set when the body was not a JSON object, e.g. a bare error string
    pub error: Option<String>,
    /// Canonical reason phrase for the status
    pub reason: Option<String>,
    /// Body text as received
    pub raw_data: Option<String>,
}

impl Resource {
    /// Wrap a top-level JSON value; non-objects become a re-encoded `error`
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Resource {
                fields,
                ..Resource::default()
            },
            other => Resource {
                error: Some(other.to_string()),
                ..Resource::default()
            },
        }
    }

    /// Wrap one element of a JSON array
    fn from_element(value: Value) -> Self {
        match value {
            Value::Object(fields) => Resource {
                fields,
                ..Resource::default()
            },
            Value::String(s) => Resource {
                error: Some(s),
                ..Resource::default()
            },
            other => Resource {
                error: Some(other.to_string()),
                ..Resource::default()
            },
        }
    }

    fn with_metadata(mut self, response: &HttpResponse, raw_data: String) -> Self {
        self.status_code = Some(response.status);
        self.url = response.url.clone();
        self.reason = response.reason().map(str::to_string);
        self.raw_data = Some(raw_data);
        self
    }

    /// Get a field by a slash-separated path.
    /// For example, "user/username" reads `username` inside the `user` object
    /// and "tags/0" reads the first element of `tags`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut current = self.fields.get(parts.next()?)?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// The parsed domain fields, without metadata
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Deserialize the domain fields into a typed value
    pub fn apply<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(RestError::from)
    }

    /// The `collection` field of a paginated payload, wrapped as a list
    pub fn collection(&self) -> Option<ResourceList> {
        match self.fields.get("collection")? {
            Value::Array(items) => Some(ResourceList::from_values(items.clone())),
            _ => None,
        }
    }
}

/// Ordered resources parsed from a JSON array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceList {
    items: Vec<Resource>,
    pub status_code: Option<u16>,
    pub url: Option<String>,
    pub reason: Option<String>,
    pub raw_data: Option<String>,
}

impl ResourceList {
    fn from_values(values: Vec<Value>) -> Self {
        ResourceList {
            items: values.into_iter().map(Resource::from_element).collect(),
            ..ResourceList::default()
        }
    }

    fn with_metadata(mut self, response: &HttpResponse, raw_data: String) -> Self {
        self.status_code = Some(response.status);
        self.url = response.url.clone();
        self.reason = response.reason().map(str::to_string);
        self.raw_data = Some(raw_data);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }

    /// Deserialize every element into a typed value
    pub fn apply<T>(&self) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.items.iter().map(|item| item.apply()).collect()
    }
}

impl Index<usize> for ResourceList {
    type Output = Resource;

    fn index(&self, index: usize) -> &Resource {
        &self.items[index]
    }
}

impl IntoIterator for ResourceList {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Result of wrapping a response: one resource, or a list for array bodies
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    One(Resource),
    Many(ResourceList),
}

impl Wrapped {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Wrapped::One(r) => r.status_code,
            Wrapped::Many(l) => l.status_code,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Wrapped::One(r) => r.url.as_deref(),
            Wrapped::Many(l) => l.url.as_deref(),
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Wrapped::One(r) => Some(r),
            Wrapped::Many(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&ResourceList> {
        match self {
            Wrapped::Many(l) => Some(l),
            Wrapped::One(_) => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Wrapped::One(r) => Some(r),
            Wrapped::Many(_) => None,
        }
    }

    pub fn into_list(self) -> Option<ResourceList> {
        match self {
            Wrapped::Many(l) => Some(l),
            Wrapped::One(_) => None,
        }
    }
}

fn wrap_value(value: Value, response: &HttpResponse, raw_data: String) -> Wrapped {
    match value {
        Value::Array(items) => {
            Wrapped::Many(ResourceList::from_values(items).with_metadata(response, raw_data))
        }
        other => Wrapped::One(Resource::from_value(other).with_metadata(response, raw_data)),
    }
}

/// Wrap a response body into resource(s).
///
/// An empty body (HEAD, 204) yields a resource with no fields. Any other
/// body must be valid JSON, otherwise [`RestError::ResponseParse`].
pub fn wrap(response: &HttpResponse) -> Result<Wrapped> {
    let raw_data = response.text();
    if raw_data.trim().is_empty() {
        return Ok(Wrapped::One(Resource::default().with_metadata(response, raw_data)));
    }

    match serde_json::from_str::<Value>(&raw_data) {
        Ok(value) => Ok(wrap_value(value, response, raw_data)),
        Err(source) => Err(RestError::ResponseParse {
            source,
            body: raw_data,
        }),
    }
}

/// Like [`wrap`], but a body that is not JSON yields a resource with no
/// fields. Used for redirects that were not followed.
pub fn wrap_lenient(response: &HttpResponse) -> Wrapped {
    let raw_data = response.text();
    match serde_json::from_str::<Value>(&raw_data) {
        Ok(value) => wrap_value(value, response, raw_data),
        Err(_) => Wrapped::One(Resource::default().with_metadata(response, raw_data)),
    }
}
