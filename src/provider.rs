//! Resource providers: turn a location string into bytes.
//!
//! The loader never touches the filesystem or network directly. It asks a
//! [`ResourceProvider`] for the repository index and for every chart bundle,
//! so that catalogs can live on local disk, behind HTTP, or in memory
//! (tests).
//!
//! | Location | Provider |
//! |----------|----------|
//! | `http://…`, `https://…` | [`HttpProvider`] (bounded timeout per fetch) |
//! | `file://…` or a plain path | [`FsProvider`] |
//!
//! [`DefaultProvider`] dispatches on the scheme.

use std::io::ErrorKind;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::FetchError;

/// Fetches the bytes behind a location.
///
/// Implementations are blocking; the async server calls the loader from
/// `spawn_blocking`.
pub trait ResourceProvider: Send + Sync {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads local files. Accepts plain paths and `file://` URLs.
#[derive(Debug, Default, Clone)]
pub struct FsProvider;

impl ResourceProvider for FsProvider {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                location: location.to_string(),
            },
            _ => FetchError::Io {
                location: location.to_string(),
                source: e,
            },
        })
    }
}

/// Fetches over HTTP(S) with a per-request timeout.
///
/// The underlying blocking client is built on first use so that a
/// provider can be created (and dropped) from async code as long as it
/// only serves local locations there.
#[derive(Debug)]
pub struct HttpProvider {
    timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl HttpProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self, location: &str) -> Result<&reqwest::blocking::Client, FetchError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("chart-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request {
                location: location.to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(self.client.get_or_init(|| client))
    }
}

fn classify_reqwest(location: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            location: location.to_string(),
        }
    } else {
        FetchError::Request {
            location: location.to_string(),
            message: err.to_string(),
        }
    }
}

impl ResourceProvider for HttpProvider {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client(location)?
            .get(location)
            .send()
            .map_err(|e| classify_reqwest(location, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                location: location.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| classify_reqwest(location, e))?;
        Ok(bytes.to_vec())
    }
}

/// Dispatches to [`HttpProvider`] or [`FsProvider`] by location scheme.
#[derive(Debug)]
pub struct DefaultProvider {
    fs: FsProvider,
    http: HttpProvider,
}

impl DefaultProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            fs: FsProvider,
            http: HttpProvider::new(timeout),
        }
    }
}

impl ResourceProvider for DefaultProvider {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        if is_http(location) {
            self.http.fetch(location)
        } else {
            self.fs.fetch(location)
        }
    }
}

fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Whether a URL carries its own scheme and must not be joined to a base.
pub fn is_absolute(location: &str) -> bool {
    location.contains("://") || location.starts_with('/')
}

/// Resolves `relative` against the directory `base`.
///
/// Absolute URLs and paths are returned unchanged.
pub fn join_location(base: &str, relative: &str) -> String {
    if is_absolute(relative) {
        return relative.to_string();
    }
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    if base.is_empty() {
        return relative.to_string();
    }
    if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

/// The directory part of a location (everything before the last `/`).
///
/// A root keeps its trailing slash: `/index.yaml` gives `/` and
/// `file:///index.yaml` gives `file:///`.
pub fn parent_location(location: &str) -> &str {
    let trimmed = location.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => {
            let head = &trimmed[..idx];
            if head.is_empty() || head.ends_with("://") {
                &trimmed[..=idx]
            } else if head.ends_with(":/") {
                // "https://host" has no path to strip.
                trimmed
            } else {
                head
            }
        }
        None => "",
    }
}
