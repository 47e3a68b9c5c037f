//! Nested request parameters.
//!
//! A [`ParamTree`] is built fresh for every call and consumed when the request
//! is formatted. Values may be scalars, lists (multi-value fields), nested
//! trees, or [`FileUpload`] payloads that end up as multipart file parts.

use crate::error::{RestError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

/// A single parameter value.
#[derive(Debug)]
pub enum Param {
    /// Absent value, dropped before encoding
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    /// Repeated field, encoded as `key[]=a&key[]=b`
    List(Vec<Param>),
    /// Nested tree, encoded as `key[child]=...`
    Tree(ParamTree),
    /// File payload, routed to a multipart file part
    File(FileUpload),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Param::File(_))
    }

    /// Boolean view used for control keys
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Param::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String form of a scalar; `None` for lists, trees, files and null
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Param::Bool(b) => Some(b.to_string()),
            Param::Number(n) => Some(n.to_string()),
            Param::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Str(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Str(value.clone())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

macro_rules! param_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Param {
                fn from(value: $t) -> Self {
                    Param::Number(Number::from(value))
                }
            }
        )*
    };
}

param_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Param::Null, Param::Number)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::from(f64::from(value))
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(value: Vec<T>) -> Self {
        Param::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<ParamTree> for Param {
    fn from(value: ParamTree) -> Self {
        Param::Tree(value)
    }
}

impl From<FileUpload> for Param {
    fn from(value: FileUpload) -> Self {
        Param::File(value)
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(b),
            Value::Number(n) => Param::Number(n),
            Value::String(s) => Param::Str(s),
            Value::Array(items) => Param::List(items.into_iter().map(Param::from).collect()),
            Value::Object(map) => Param::Tree(map.into_iter().collect()),
        }
    }
}

/// Ordered mapping from keys to [`Param`] values.
#[derive(Debug, Default)]
pub struct ParamTree {
    entries: IndexMap<String, Param>,
}

impl ParamTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from any serializable object.
    ///
    /// Fails with [`RestError::InvalidParams`] when the value does not
    /// serialize to a JSON object.
    pub fn from_serialize<P: Serialize>(params: P) -> Result<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(RestError::InvalidParams(format!(
                "expected an object of parameters, got {}",
                other
            ))),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing and returning any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Param>) -> Option<Param> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.get(key)
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Param> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Param)> {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Param>> FromIterator<(K, V)> for ParamTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ParamTree {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for ParamTree {
    type Item = (String, Param);
    type IntoIter = indexmap::map::IntoIter<String, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A readable payload sent as a multipart file part.
///
/// The reader is drained when the request body is encoded.
pub struct FileUpload {
    filename: String,
    reader: Box<dyn Read + Send>,
}

impl FileUpload {
    pub fn new<R: Read + Send + 'static>(filename: impl Into<String>, reader: R) -> Self {
        FileUpload {
            filename: filename.into(),
            reader: Box::new(reader),
        }
    }

    /// Upload in-memory bytes under the given filename
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(filename, Cursor::new(data.into()))
    }

    /// Open a file on disk; the part's filename is the path's final component
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, File::open(path)?))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Read the remaining payload into memory
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}
