//! # fontembed
//!
//! Produce a self-contained CSS representation of every custom web font a
//! rendered document references, so the document can be rasterized or
//! serialized without depending on network-hosted font files.
//!
//! The engine discovers font declarations across four structurally different
//! sources — inline `@import`s, link-backed stylesheets, materialized
//! `@font-face` rules, and dynamically registered fonts — resolves each
//! font's binary exactly once through a shared process-lifetime cache,
//! rewrites the CSS so references point at inline `data:` payloads, and
//! aggregates everything into one memoized CSS string.
//!
//! ```rust,ignore
//! use fontembed::{Document, EmbedOptions, FontEmbedder};
//!
//! let embedder = FontEmbedder::new();
//! let mut doc = Document::with_url("https://example.com/");
//! doc.add_style_block("@font-face{font-family:Body;src:url(fonts/body.woff2);}");
//!
//! let css = embedder.embed_custom_fonts(&mut doc, &EmbedOptions::default());
//! assert!(css.contains("data:font/woff2;base64,"));
//! ```

pub mod cache;
pub mod css;
pub mod debug;
pub mod document;
pub mod embed;
pub mod error;
pub mod fetch;
pub mod icon;

pub use cache::{EmbedCache, EMBED_CSS_KEY};
pub use document::{Document, FontStatus, RegisteredFont, StyleElement, StyleSheet};
pub use embed::{EmbedOptions, FontEmbedder, FontEmbedderBuilder, STYLE_MARKER_ATTR};
pub use error::{Error, FetchError, Result, SheetError};
pub use fetch::{FetchedResource, HttpFetcher, ResourceFetcher};
pub use icon::{IconFontClassifier, KeywordIconFonts};
