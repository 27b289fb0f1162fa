//! Resource fetching and inline encoding
//!
//! This module provides a trait-based abstraction for fetching the external
//! resources the embedding pipeline touches (font binaries and stylesheet
//! text), plus the conversion of fetched bytes into a self-describing inline
//! `data:` representation. The trait keeps the engine agnostic about how
//! resources are retrieved, enabling:
//!
//! - Offline modes
//! - Mocking for tests
//! - Rate limiting
//!
//! # Example
//!
//! ```rust,ignore
//! use fontembed::fetch::{ResourceFetcher, HttpFetcher};
//!
//! let fetcher = HttpFetcher::new();
//! let resource = fetcher.fetch("https://example.com/fonts/body.woff2")?;
//! println!("Got {} bytes", resource.bytes.len());
//! ```

use crate::error::{FetchError, Result};
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default User-Agent string used by HTTP fetchers
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 fontembed/0.1";

/// Default Accept-Language header value
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Media type assumed when neither the response nor the URL reveals one
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

// ============================================================================
// Core types
// ============================================================================

/// Result of fetching an external resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Raw bytes of the resource
    pub bytes: Vec<u8>,
    /// Content-Type header value, if available (e.g., "font/woff2", "text/css")
    pub content_type: Option<String>,
}

impl FetchedResource {
    /// Create a new FetchedResource
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self { bytes, content_type }
    }

    /// Check if this resource appears to be CSS based on content-type
    pub fn is_css(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/css"))
            .unwrap_or(false)
    }

    /// Check if this resource appears to be a font based on content-type
    pub fn is_font(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.starts_with("font/") || ct.contains("opentype") || ct.contains("truetype"))
            .unwrap_or(false)
    }

    /// Media type stripped of parameters such as `; charset=utf-8`
    pub fn media_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
            .filter(|ct| !ct.is_empty())
    }

    /// Interpret the bytes as UTF-8 text, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

// ============================================================================
// ResourceFetcher trait
// ============================================================================

/// Trait for fetching external resources
///
/// This abstraction allows different fetch implementations:
/// - [`HttpFetcher`]: Default HTTP implementation with timeouts
/// - Custom implementations for mocking, offline mode, etc.
///
/// URLs can be:
/// - `http://` or `https://` - fetch over network
/// - `file://` - read from filesystem
/// - `data:` - decode data URL inline
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across threads.
pub trait ResourceFetcher: Send + Sync {
    /// Fetch a resource from the given URL
    ///
    /// Returns `Ok(FetchedResource)` containing the bytes and optional
    /// content-type, or an error if the fetch fails. Caching is the caller's
    /// responsibility.
    fn fetch(&self, url: &str) -> Result<FetchedResource>;
}

// Allow Arc<dyn ResourceFetcher> to be used as ResourceFetcher
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
        (**self).fetch(url)
    }
}

// ============================================================================
// HttpFetcher - Default implementation
// ============================================================================

/// Default HTTP resource fetcher
///
/// Fetches resources over HTTP/HTTPS with configurable timeouts and user
/// agent. Also handles `file://` URLs and `data:` URLs. Binary content is
/// returned untouched, so font payloads survive the round trip.
///
/// # Example
///
/// ```rust,ignore
/// use fontembed::fetch::HttpFetcher;
/// use std::time::Duration;
///
/// let fetcher = HttpFetcher::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("MyApp/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
    accept_language: String,
    max_size: usize,
}

impl HttpFetcher {
    /// Create a new HttpFetcher with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the Accept-Language header
    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }

    /// Set the maximum response size in bytes
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Fetch from an HTTP/HTTPS URL
    fn fetch_http(&self, url: &str) -> Result<FetchedResource> {
        let config = ureq::Agent::config_builder().timeout_global(Some(self.timeout)).build();
        let agent: ureq::Agent = config.into();

        let mut current = url.to_string();
        for _ in 0..10 {
            let mut response = agent
                .get(&current)
                .header("User-Agent", &self.user_agent)
                .header("Accept-Language", &self.accept_language)
                .call()
                .map_err(|e| FetchError::RequestFailed {
                    url: current.clone(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if (300..400).contains(&status.as_u16()) {
                if let Some(loc) = response.headers().get("location").and_then(|h| h.to_str().ok()) {
                    let next = Url::parse(&current)
                        .ok()
                        .and_then(|base| base.join(loc).ok())
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| loc.to_string());
                    current = next;
                    continue;
                }
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string());

            let bytes = response
                .body_mut()
                .with_config()
                .limit(self.max_size as u64)
                .read_to_vec()
                .map_err(|e| FetchError::RequestFailed {
                    url: current.clone(),
                    reason: e.to_string(),
                })?;

            if bytes.is_empty() {
                return Err(FetchError::EmptyBody { url: current }.into());
            }
            return Ok(FetchedResource::new(bytes, content_type));
        }

        Err(FetchError::TooManyRedirects { url: url.to_string() }.into())
    }

    /// Fetch from a file:// URL
    fn fetch_file(&self, url: &str) -> Result<FetchedResource> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let bytes = std::fs::read(path).map_err(|e| FetchError::ReadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let content_type = guess_content_type_from_path(path);
        Ok(FetchedResource::new(bytes, content_type))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            max_size: 50 * 1024 * 1024, // 50MB default limit
        }
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
        if url.starts_with("data:") {
            decode_data_url(url)
        } else if url.starts_with("file://") {
            self.fetch_file(url)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url)
        } else {
            // Treat as local file path
            self.fetch_file(&format!("file://{}", url))
        }
    }
}

// ============================================================================
// Inline data helpers
// ============================================================================

/// Fetch a URL and return it as a self-describing inline `data:` string
///
/// The media type comes from the response content-type when present, else
/// from the URL's file extension, else `application/octet-stream`. A URL that
/// is already a `data:` URI is returned verbatim; it is permanently
/// substitutable as-is.
pub fn fetch_and_encode(fetcher: &dyn ResourceFetcher, url: &str) -> Result<String> {
    if url.starts_with("data:") {
        return Ok(url.to_string());
    }

    let resource = fetcher.fetch(url)?;
    let media_type = resource
        .media_type()
        .map(|ct| ct.to_string())
        .or_else(|| guess_content_type_from_path(url))
        .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string());

    Ok(encode_data_url(&resource.bytes, &media_type))
}

/// Encode raw bytes into a `data:<media-type>;base64,<payload>` string
pub fn encode_data_url(bytes: &[u8], media_type: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media_type, payload)
}

/// Guess content-type from file path extension
pub fn guess_content_type_from_path(path: &str) -> Option<String> {
    // Strip query/fragment so versioned font URLs still resolve an extension.
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let mime = match ext.as_str() {
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "svg" => "image/svg+xml",
        "css" => "text/css",
        "html" | "htm" => "text/html",
        _ => return None,
    };

    Some(mime.to_string())
}

/// Decode a data: URL into bytes
pub fn decode_data_url(url: &str) -> Result<FetchedResource> {
    let rest = url.strip_prefix("data:").ok_or_else(|| FetchError::InvalidDataUrl {
        reason: "URL does not start with 'data:'".to_string(),
    })?;

    let comma_pos = rest.find(',').ok_or_else(|| FetchError::InvalidDataUrl {
        reason: "Missing comma in data URL".to_string(),
    })?;

    let header = &rest[..comma_pos];
    let data = &rest[comma_pos + 1..];

    // Parse header: [mediatype][;base64]
    let is_base64 = header.ends_with(";base64") || header.contains(";base64;");
    let media_type = header
        .split(';')
        .next()
        .filter(|s| !s.is_empty() && s.contains('/'))
        .map(|s| s.to_string());

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| FetchError::InvalidDataUrl {
                reason: format!("Invalid base64: {}", e),
            })?
    } else {
        // URL-encoded
        percent_decode(data)?
    };

    Ok(FetchedResource::new(bytes, media_type))
}

/// Percent-decode a string to bytes
fn percent_decode(input: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err(FetchError::InvalidDataUrl {
                    reason: "Incomplete percent-escape".to_string(),
                }
                .into());
            }
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push(((hi << 4) | lo) as u8);
                    i += 3;
                }
                _ => {
                    return Err(FetchError::InvalidDataUrl {
                        reason: "Invalid percent-escape".to_string(),
                    }
                    .into())
                }
            }
        } else if bytes[i] == b'+' {
            out.push(b' ');
            i += 1;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
