//! Snapshot document model
//!
//! The embedding engine does not walk a live DOM; it consumes a snapshot of
//! the style-bearing parts of a document, assembled by the surrounding
//! snapshot tool:
//!
//! - inline `<style>` block text (scanned for `@import`),
//! - the loaded stylesheet list, link-backed or inline, with materialized
//!   `@font-face` rules where the sheet's text is readable,
//! - the dynamic font registry (fonts registered at runtime with a private
//!   source URL recorded out of band).
//!
//! The engine writes back through [`Document::inject_style_element`] when the
//! caller asks for the aggregated CSS to be attached to the document.

use crate::css::font_face::{parse_font_faces, FontFaceDecl};
use crate::error::SheetError;

/// A loaded stylesheet as the snapshot saw it.
#[derive(Debug, Clone)]
pub struct StyleSheet {
  href: Option<String>,
  css_text: Option<String>,
  font_faces: Vec<FontFaceDecl>,
  from_link: bool,
}

impl StyleSheet {
  /// A `<link rel="stylesheet">` sheet whose text has not been captured.
  ///
  /// The external-links aggregator fetches its text by href.
  pub fn link(href: impl Into<String>) -> Self {
    Self {
      href: Some(href.into()),
      css_text: None,
      font_faces: Vec::new(),
      from_link: true,
    }
  }

  /// A link-backed sheet with captured text; rules are materialized eagerly.
  pub fn linked_with_text(href: impl Into<String>, css_text: impl Into<String>) -> Self {
    let css_text = css_text.into();
    let font_faces = parse_font_faces(&css_text);
    Self {
      href: Some(href.into()),
      css_text: Some(css_text),
      font_faces,
      from_link: true,
    }
  }

  /// An inline sheet (a `<style>` element's materialized rules).
  pub fn inline(css_text: impl Into<String>) -> Self {
    let css_text = css_text.into();
    let font_faces = parse_font_faces(&css_text);
    Self {
      href: None,
      css_text: Some(css_text),
      font_faces,
      from_link: false,
    }
  }

  /// A sheet whose rules cannot be read (e.g. an opaque cross-origin sheet).
  pub fn opaque(href: impl Into<String>) -> Self {
    Self {
      href: Some(href.into()),
      css_text: None,
      font_faces: Vec::new(),
      from_link: false,
    }
  }

  /// The sheet's href as authored, when link-backed or otherwise addressable
  pub fn href(&self) -> Option<&str> {
    self.href.as_deref()
  }

  /// The sheet's captured text, when readable
  pub fn css_text(&self) -> Option<&str> {
    self.css_text.as_deref()
  }

  /// Whether this sheet came from a `<link rel="stylesheet">` element
  pub fn is_link_backed(&self) -> bool {
    self.from_link
  }

  /// The sheet's materialized `@font-face` rules.
  ///
  /// Fails with [`SheetError::AccessDenied`] when the sheet's text was not
  /// readable; the caller logs and skips the sheet.
  pub fn font_faces(&self) -> std::result::Result<&[FontFaceDecl], SheetError> {
    if self.css_text.is_none() {
      return Err(SheetError::AccessDenied {
        href: self.href.clone().unwrap_or_else(|| "<inline>".to_string()),
      });
    }
    Ok(&self.font_faces)
  }
}

/// Load state of a dynamically registered font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStatus {
  Unloaded,
  Loading,
  Loaded,
  Error,
}

/// A font registered with the document at runtime.
///
/// The source URL is recorded out of band by whatever registered the font;
/// it is a raw string key, not a CSS reference, and is never resolved against
/// a base URL.
#[derive(Debug, Clone)]
pub struct RegisteredFont {
  pub family: String,
  pub style: Option<String>,
  pub weight: Option<String>,
  pub status: FontStatus,
  pub source_url: Option<String>,
}

impl RegisteredFont {
  /// A loaded font with a recorded source
  pub fn loaded(family: impl Into<String>, source_url: impl Into<String>) -> Self {
    Self {
      family: family.into(),
      style: None,
      weight: None,
      status: FontStatus::Loaded,
      source_url: Some(source_url.into()),
    }
  }

  pub fn with_style(mut self, style: impl Into<String>) -> Self {
    self.style = Some(style.into());
    self
  }

  pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
    self.weight = Some(weight.into());
    self
  }

  pub fn with_status(mut self, status: FontStatus) -> Self {
    self.status = status;
    self
  }
}

/// A style element attached to the document by the embedder.
#[derive(Debug, Clone)]
pub struct StyleElement {
  /// Attributes carried by the element (includes the embedder's marker)
  pub attributes: Vec<(String, String)>,
  /// The element's CSS text
  pub css: String,
}

/// The style-bearing snapshot of a document.
#[derive(Debug, Clone, Default)]
pub struct Document {
  url: Option<String>,
  style_blocks: Vec<String>,
  stylesheets: Vec<StyleSheet>,
  fonts: Vec<RegisteredFont>,
  injected_styles: Vec<StyleElement>,
}

impl Document {
  /// An empty document with no URL
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty document addressed by `url` (the base for relative references
  /// that have no owning stylesheet URL)
  pub fn with_url(url: impl Into<String>) -> Self {
    Self {
      url: Some(url.into()),
      ..Self::default()
    }
  }

  /// The document URL, when known
  pub fn url(&self) -> Option<&str> {
    self.url.as_deref()
  }

  /// Record an inline `<style>` block's literal text.
  ///
  /// The block is both scanned for `@import` during acquisition and
  /// materialized as an inline sheet for rule enumeration.
  pub fn add_style_block(&mut self, css: impl Into<String>) {
    let css = css.into();
    self.stylesheets.push(StyleSheet::inline(css.clone()));
    self.style_blocks.push(css);
  }

  /// Record a stylesheet.
  pub fn add_stylesheet(&mut self, sheet: StyleSheet) {
    self.stylesheets.push(sheet);
  }

  /// Register a dynamic font.
  pub fn register_font(&mut self, font: RegisteredFont) {
    self.fonts.push(font);
  }

  /// Whether a loaded stylesheet already carries exactly this URL
  pub fn has_stylesheet(&self, url: &str) -> bool {
    self.stylesheets.iter().any(|sheet| sheet.href() == Some(url))
  }

  pub fn style_blocks(&self) -> &[String] {
    &self.style_blocks
  }

  pub fn stylesheets(&self) -> &[StyleSheet] {
    &self.stylesheets
  }

  pub fn fonts(&self) -> &[RegisteredFont] {
    &self.fonts
  }

  /// Attach a style element to the document.
  pub fn inject_style_element(&mut self, css: impl Into<String>, attributes: Vec<(String, String)>) {
    self.injected_styles.push(StyleElement {
      attributes,
      css: css.into(),
    });
  }

  /// Style elements attached by the embedder
  pub fn injected_styles(&self) -> &[StyleElement] {
    &self.injected_styles
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn style_blocks_materialize_inline_sheets() {
    let mut doc = Document::with_url("https://x/page.html");
    doc.add_style_block("@font-face { font-family: A; src: url(a.woff2); }");

    assert_eq!(doc.style_blocks().len(), 1);
    assert_eq!(doc.stylesheets().len(), 1);
    let faces = doc.stylesheets()[0].font_faces().unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].family, "A");
  }

  #[test]
  fn opaque_sheets_deny_rule_access() {
    let sheet = StyleSheet::opaque("https://cdn.example.com/blocked.css");
    let err = sheet.font_faces().unwrap_err();
    assert!(matches!(err, SheetError::AccessDenied { .. }));
  }

  #[test]
  fn has_stylesheet_compares_exact_urls() {
    let mut doc = Document::new();
    doc.add_stylesheet(StyleSheet::link("https://x/a.css"));

    assert!(doc.has_stylesheet("https://x/a.css"));
    assert!(!doc.has_stylesheet("https://x/a.css?v=2"));
    assert!(!doc.has_stylesheet("https://x/b.css"));
  }

  #[test]
  fn registered_font_builder_defaults() {
    let font = RegisteredFont::loaded("Inter", "https://x/inter.woff2").with_weight("700");
    assert_eq!(font.status, FontStatus::Loaded);
    assert_eq!(font.style, None);
    assert_eq!(font.weight.as_deref(), Some("700"));
    assert_eq!(font.source_url.as_deref(), Some("https://x/inter.woff2"));
  }
}
