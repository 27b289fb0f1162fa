//! Error types for fontembed
//!
//! Two failure families exist in this crate:
//! - Fetch errors (network, file read, data-URL decode) for font binaries and
//!   stylesheet text
//! - Sheet errors (a stylesheet whose rules cannot be enumerated)
//!
//! Both are recoverable by design: the embedding pipeline converts them into a
//! skip of the single resource, sheet, or rule that failed. All errors use the
//! `thiserror` crate for minimal boilerplate and proper error trait
//! implementations.

use thiserror::Error;

/// Result type alias for fontembed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fontembed
///
/// Each variant wraps a more specific error type for that subsystem.
#[derive(Error, Debug)]
pub enum Error {
  /// Resource fetching or encoding error
  #[error("Fetch error: {0}")]
  Fetch(#[from] FetchError),

  /// Stylesheet enumeration error
  #[error("Sheet error: {0}")]
  Sheet(#[from] SheetError),

  /// I/O error (file reading, network, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur while fetching or encoding a resource
///
/// These cover the network request itself, the binary read, and the inline
/// `data:` representations used for embedded payloads.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
  /// The HTTP request failed or the body could not be read
  #[error("Request for '{url}' failed: {reason}")]
  RequestFailed { url: String, reason: String },

  /// The server answered with an empty body
  #[error("Empty response body for '{url}'")]
  EmptyBody { url: String },

  /// Redirect chain exceeded the follow limit
  #[error("Too many redirects fetching '{url}'")]
  TooManyRedirects { url: String },

  /// A local file read failed
  #[error("Failed to read '{url}': {reason}")]
  ReadFailed { url: String, reason: String },

  /// A `data:` URL could not be decoded
  #[error("Invalid data URL: {reason}")]
  InvalidDataUrl { reason: String },
}

/// Errors raised when a stylesheet's rules cannot be enumerated
#[derive(Error, Debug, Clone)]
pub enum SheetError {
  /// The sheet's rules are not readable (e.g. an opaque cross-origin sheet)
  #[error("Cannot access rules of stylesheet '{href}'")]
  AccessDenied { href: String },
}
