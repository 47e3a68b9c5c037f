//! # everyplay - Everyplay API client for Rust
//!
//! A blocking client for the Everyplay REST API. Calls take a resource name
//! and a nested parameter tree; responses come back as [`Resource`] values
//! (or a [`ResourceList`] for array bodies) that expose the parsed JSON
//! fields alongside the HTTP status and URL.
//!
//! ## Features
//!
//! - Nested parameters encoded with the `parent[child]` convention
//! - File uploads as multipart/form-data, with bare text parts
//! - Per-call control of redirects, TLS verification and proxies
//! - Pluggable [`Transport`] and [`MultipartEncoder`]
//!
//! ## Basic Usage
//!
//! ```no_run
//! use everyplay::{Config, ParamTree, RestClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new(Config::new("my-client-id"))?;
//!
//!     let videos = client.get(
//!         "videos",
//!         ParamTree::new().with("order", "popularity").with("limit", 5),
//!     )?;
//!
//!     if let Some(list) = videos.as_list() {
//!         for video in list {
//!             println!("{:?}", video.get_str("title"));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Uploads
//!
//! ```no_run
//! use everyplay::{Config, FileUpload, ParamTree, RestClient};
//!
//! let client = RestClient::new(Config::new("my-client-id").with_access_token("token"))?;
//! let video = ParamTree::new()
//!     .with("title", "Speed run")
//!     .with("asset_data", FileUpload::open("run.mp4")?);
//!
//! client.post("videos", ParamTree::new().with("video", video))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod multipart;
pub mod params;
pub mod request;
pub mod response;
pub mod rest;
pub mod transport;

// Re-export main types for convenience
pub use client::{Config, USER_AGENT};
pub use error::{RestError, Result};
pub use multipart::{BarePartsEncoder, MultipartBody, MultipartEncoder};
pub use params::{FileUpload, Param, ParamTree};
pub use request::{check_status, namespace_params, Body, Method, RequestFormatter, RequestSpec};
pub use response::{wrap, Resource, ResourceList, Wrapped};
pub use rest::RestClient;
pub use transport::{HttpResponse, ReqwestTransport, Transport};

// Re-export serde_json for convenience
pub use serde_json::json;
