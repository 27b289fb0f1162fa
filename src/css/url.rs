//! URL resolution and extraction helpers for CSS text
//!
//! These utilities resolve possibly-relative references against a stylesheet
//! base URL and pull bare URLs out of CSS `url(...)` tokens. Extraction is
//! regex-based by design: the embedding pipeline only needs `url()` tokens,
//! not a CSS object model.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use url::Url;

fn regex(pattern: &'static str, desc: &'static str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

/// Matches a whole `url(...)` token, quoted or unquoted.
///
/// Quoted alternatives come first so a quoted body containing `)` is matched
/// in full before the bare form is tried.
pub(crate) fn url_token_regex() -> &'static Regex {
  static URL_TOKEN: OnceLock<Regex> = OnceLock::new();
  URL_TOKEN.get_or_init(|| {
    regex(
      "(?i)url\\(\\s*\"[^\"]*\"\\s*\\)|url\\(\\s*'[^']*'\\s*\\)|url\\([^)]*\\)",
      "url token",
    )
  })
}

/// Returns whether `s` is an inline `data:` URI
pub fn is_data_url(s: &str) -> bool {
  s.trim_start().starts_with("data:")
}

/// Pull the bare URL out of a CSS `url(...)` fragment.
///
/// Accepts quoted and unquoted forms. Returns `None` when the fragment holds
/// no extractable URL (empty token, no `url(` at all), in which case the
/// caller leaves the original text untouched.
pub fn extract_url(fragment: &str) -> Option<String> {
  static URL_BODY: OnceLock<Regex> = OnceLock::new();
  let re = URL_BODY.get_or_init(|| {
    regex(
      "(?i)url\\(\\s*(?:\"([^\"]*)\"|'([^']*)'|([^\"')][^)]*))?\\s*\\)",
      "url body",
    )
  });

  let caps = re.captures(fragment)?;
  let raw = caps
    .get(1)
    .or_else(|| caps.get(2))
    .or_else(|| caps.get(3))
    .map(|m| m.as_str().trim())?;
  if raw.is_empty() {
    return None;
  }
  Some(raw.to_string())
}

/// Resolve a possibly-relative `href` against a base URL.
///
/// Supports protocol-relative URLs (`//example.com`), `data:` URLs (returned
/// as-is), absolute URLs, and filesystem bases (`file://`) that may reference
/// directory paths. Script-ish schemes never resolve to fetchable resources
/// and yield `None`.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
  let href = href.trim();
  if href.is_empty() {
    return None;
  }

  // Fragment-only hrefs (e.g., "#glyph") don't name fetchable resources.
  if href.starts_with('#') {
    return None;
  }

  if is_data_url(href) {
    return Some(href.to_string());
  }

  let href_lower = href.to_ascii_lowercase();
  if href_lower.starts_with("javascript:")
    || href_lower.starts_with("vbscript:")
    || href_lower.starts_with("mailto:")
  {
    return None;
  }

  if let Ok(abs) = Url::parse(href) {
    return Some(abs.to_string());
  }

  let mut base_candidate = base.to_string();
  if base_candidate.starts_with("file://") {
    let path = &base_candidate["file://".len()..];
    if Path::new(path).is_dir() && !base_candidate.ends_with('/') {
      base_candidate.push('/');
    }
  }

  Url::parse(&base_candidate)
    .or_else(|_| {
      Url::from_file_path(&base_candidate).map_err(|()| url::ParseError::RelativeUrlWithoutBase)
    })
    .ok()?
    .join(href)
    .ok()
    .map(|u| u.to_string())
}

/// Resolve an href against an optional base, returning absolute URLs when possible.
///
/// When no base is provided, absolute URLs (including `data:`) are returned as-is
/// while relative URLs are ignored.
pub fn resolve_href_with_base(base: Option<&str>, href: &str) -> Option<String> {
  match base {
    Some(base) => resolve_href(base, href),
    None => resolve_href("", href),
  }
}

/// Deduplicate a list while preserving the order of first occurrence.
pub fn dedupe_preserving_order(mut urls: Vec<String>) -> Vec<String> {
  let mut seen: std::collections::HashSet<String> = std::collections::HashSet::with_capacity(urls.len());
  urls.retain(|url| seen.insert(url.clone()));
  urls
}
