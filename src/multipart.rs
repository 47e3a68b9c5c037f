//! multipart/form-data encoding.
//!
//! The encoder is a strategy owned by the [`RequestFormatter`](crate::request::RequestFormatter)
//! rather than a process-wide setting. The default [`BarePartsEncoder`] writes
//! text parts with only a Content-Disposition header: the Everyplay servers
//! reject text parts that carry a Content-Type.

use crate::error::Result;
use crate::params::FileUpload;
use std::fmt;
use std::io::Write;

/// An encoded multipart body and its Content-Type header value.
#[derive(Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Strategy for turning namespaced fields and files into a multipart body.
pub trait MultipartEncoder: Send + Sync {
    fn encode(
        &self,
        fields: &[(String, String)],
        files: Vec<(String, FileUpload)>,
    ) -> Result<MultipartBody>;
}

/// Default encoder: text parts carry no Content-Type, file parts carry one
/// guessed from the filename.
#[derive(Debug, Clone, Default)]
pub struct BarePartsEncoder {
    boundary: Option<String>,
}

impl BarePartsEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed boundary instead of a random one
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        BarePartsEncoder {
            boundary: Some(boundary.into()),
        }
    }

    fn boundary(&self) -> String {
        self.boundary
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Content-Type for a file part, falling back to application/octet-stream
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Escape a Content-Disposition parameter value: `"`, CR and LF are
/// percent-encoded so a name cannot end the quoted string
pub fn escape_disposition(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl MultipartEncoder for BarePartsEncoder {
    fn encode(
        &self,
        fields: &[(String, String)],
        files: Vec<(String, FileUpload)>,
    ) -> Result<MultipartBody> {
        let boundary = self.boundary();
        let mut data = Vec::new();

        for (name, value) in fields {
            write!(data, "--{}\r\n", boundary)?;
            write!(
                data,
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_disposition(name)
            )?;
            data.extend_from_slice(value.as_bytes());
            data.extend_from_slice(b"\r\n");
        }

        for (name, mut file) in files {
            let payload = file.read_all()?;
            write!(data, "--{}\r\n", boundary)?;
            write!(
                data,
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_disposition(&name),
                escape_disposition(file.filename())
            )?;
            write!(data, "Content-Type: {}\r\n\r\n", content_type_for(file.filename()))?;
            data.extend_from_slice(&payload);
            data.extend_from_slice(b"\r\n");
        }

        write!(data, "--{}--\r\n", boundary)?;

        Ok(MultipartBody {
            content_type: format!("multipart/form-data; boundary={}", boundary),
            data,
        })
    }
}
