//! Icon-font classification
//!
//! Icon and glyph fonts (Font Awesome, Material Icons, and friends) are
//! excluded from embedding: they are large, widely cached, and their glyphs
//! are usually rendered separately by the snapshot tool. Classification is a
//! predicate over an identifier — a font family, a URL, or a whole block of
//! CSS text — so one classifier serves every discovery path.

use std::sync::Arc;

/// Predicate deciding whether an identifier names an icon font
///
/// Implementations must be `Send + Sync`; the classifier is shared across
/// every aggregator.
pub trait IconFontClassifier: Send + Sync {
  /// Returns true when `identifier` (a family name, URL, or CSS text)
  /// belongs to an icon font that must not be inlined.
  fn is_icon_font(&self, identifier: &str) -> bool;
}

impl<T: IconFontClassifier + ?Sized> IconFontClassifier for Arc<T> {
  fn is_icon_font(&self, identifier: &str) -> bool {
    (**self).is_icon_font(identifier)
  }
}

/// Default classifier matching well-known icon font markers
///
/// Matching is case-insensitive substring search, which is what the common
/// providers' family names and CDN paths reliably expose.
#[derive(Debug, Clone)]
pub struct KeywordIconFonts {
  keywords: Vec<String>,
}

impl KeywordIconFonts {
  /// Classifier with the built-in provider keywords
  pub fn new() -> Self {
    Self::default()
  }

  /// Classifier with a custom keyword set (case-insensitive)
  pub fn from_keywords<I, S>(keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      keywords: keywords.into_iter().map(|k| k.into().to_ascii_lowercase()).collect(),
    }
  }
}

impl Default for KeywordIconFonts {
  fn default() -> Self {
    Self::from_keywords([
      "fontawesome",
      "font-awesome",
      "font awesome",
      "fa-solid",
      "fa-brands",
      "glyphicon",
      "materialicons",
      "material-icons",
      "material icons",
      "material-symbols",
      "material symbols",
      "iconfont",
      "icomoon",
      "bootstrap-icons",
      "remixicon",
    ])
  }
}

impl IconFontClassifier for KeywordIconFonts {
  fn is_icon_font(&self, identifier: &str) -> bool {
    let identifier = identifier.to_ascii_lowercase();
    self.keywords.iter().any(|keyword| identifier.contains(keyword))
  }
}
