//! CSS font-reference rewriting
//!
//! [`InlineEngine`] is the single resolve-and-inline primitive shared by
//! every source aggregator. Given CSS text and a base URL it finds each
//! `url(...)` token, resolves the reference, fetches and encodes the payload
//! at most once per URL (through the shared cache), and substitutes the
//! matched token with an inline `data:` form.
//!
//! Rewriting is pattern extraction plus literal substring replacement, never
//! a structural transform: only matched tokens change, and everything around
//! them stays byte-identical. Substitution is keyed by the exact matched
//! substring, so the result is independent of the order resolutions complete
//! in.

use crate::cache::EmbedCache;
use crate::css::url::{dedupe_preserving_order, extract_url, is_data_url, resolve_href_with_base, url_token_regex};
use crate::fetch::{fetch_and_encode, ResourceFetcher};
use crate::icon::IconFontClassifier;

/// Shared resolve-and-inline primitive
///
/// Borrowed views over the embedder's collaborators; constructed per call.
pub(crate) struct InlineEngine<'a> {
  pub fetcher: &'a dyn ResourceFetcher,
  pub cache: &'a EmbedCache,
  pub icons: &'a dyn IconFontClassifier,
}

impl<'a> InlineEngine<'a> {
  /// Rewrite every font-bearing `url(...)` reference in `css` to inline data.
  pub fn rewrite(&self, css: &str, base_url: Option<&str>) -> String {
    self.rewrite_with_diagnostics(css, base_url, &mut |_url, _reason| {})
  }

  /// Rewrite with diagnostics about skipped references.
  ///
  /// The callback receives `(url, reason)` for every reference that was not
  /// inlined: icon fonts, previously failed attempts, and fresh fetch
  /// failures.
  pub fn rewrite_with_diagnostics<D>(&self, css: &str, base_url: Option<&str>, diagnostics: &mut D) -> String
  where
    D: FnMut(&str, &str),
  {
    let tokens: Vec<String> = dedupe_preserving_order(
      url_token_regex().find_iter(css).map(|m| m.as_str().to_string()).collect(),
    );
    if tokens.is_empty() {
      return css.to_string();
    }

    let mut substitutions: Vec<(String, String)> = Vec::new();
    for token in tokens {
      let Some(raw) = extract_url(&token) else {
        continue;
      };
      // Already inline; permanently substitutable as-is.
      if is_data_url(&raw) {
        continue;
      }
      if let Some(inline) = self.resolve_and_inline(&raw, base_url, diagnostics) {
        substitutions.push((token, format!("url({})", inline)));
      }
    }

    // Matched tokens are unique substrings of the original text, so literal
    // replacement order cannot change the result.
    let mut out = css.to_string();
    for (token, replacement) in substitutions {
      out = out.replace(&token, &replacement);
    }
    out
  }

  /// Resolve a raw CSS reference against `base_url` and inline it.
  ///
  /// Applies the icon-font exclusion and the cache/attempt discipline.
  /// Returns the inline data on success, `None` for any skip.
  pub fn resolve_and_inline<D>(&self, raw_url: &str, base_url: Option<&str>, diagnostics: &mut D) -> Option<String>
  where
    D: FnMut(&str, &str),
  {
    let resolved = resolve_href_with_base(base_url, raw_url)?;
    if self.icons.is_icon_font(&resolved) {
      diagnostics(&resolved, "icon font");
      return None;
    }
    self.inline_keyed(&resolved, diagnostics)
  }

  /// Cache-or-fetch a payload under an exact cache key.
  ///
  /// A cache hit is substituted without fetching (and the key is marked as a
  /// known font resource so no other path attempts it). A key with a recorded
  /// failed attempt is never retried. Otherwise the payload is fetched,
  /// encoded, stored, and marked.
  pub fn inline_keyed<D>(&self, key: &str, diagnostics: &mut D) -> Option<String>
  where
    D: FnMut(&str, &str),
  {
    if let Some(cached) = self.cache.resource(key) {
      self.cache.mark_attempted(key);
      return Some(cached);
    }
    if self.cache.was_attempted(key) {
      diagnostics(key, "previous fetch attempt failed");
      return None;
    }

    self.cache.mark_attempted(key);
    match fetch_and_encode(self.fetcher, key) {
      Ok(inline) => {
        self.cache.store_resource(key, inline.clone());
        Some(inline)
      }
      Err(err) => {
        eprintln!("[fonts] failed to fetch {}: {}", key, err);
        diagnostics(key, "fetch failed");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{FetchError, Result};
  use crate::fetch::{encode_data_url, FetchedResource};
  use crate::icon::KeywordIconFonts;
  use std::collections::HashMap;
  use std::sync::Mutex;

  struct MapFetcher {
    map: HashMap<String, (Vec<u8>, Option<String>)>,
    calls: Mutex<Vec<String>>,
  }

  impl MapFetcher {
    fn new() -> Self {
      Self {
        map: HashMap::new(),
        calls: Mutex::new(Vec::new()),
      }
    }

    fn with_font(mut self, url: &str, bytes: &[u8], content_type: &str) -> Self {
      self
        .map
        .insert(url.to_string(), (bytes.to_vec(), Some(content_type.to_string())));
      self
    }

    fn fetch_count(&self, url: &str) -> usize {
      self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
  }

  impl ResourceFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
      self.calls.lock().unwrap().push(url.to_string());
      self
        .map
        .get(url)
        .map(|(bytes, content_type)| FetchedResource::new(bytes.clone(), content_type.clone()))
        .ok_or_else(|| {
          FetchError::RequestFailed {
            url: url.to_string(),
            reason: "missing resource".to_string(),
          }
          .into()
        })
    }
  }

  fn engine<'a>(
    fetcher: &'a MapFetcher,
    cache: &'a EmbedCache,
    icons: &'a KeywordIconFonts,
  ) -> InlineEngine<'a> {
    InlineEngine {
      fetcher,
      cache,
      icons,
    }
  }

  #[test]
  fn rewrites_only_the_matched_token() {
    let fetcher = MapFetcher::new().with_font("https://x/css/f.woff2", b"\0\0\0\0", "font/woff2");
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();

    let css = "@font-face{font-family:'X';src:url(f.woff2) format('woff2');}";
    let out = engine(&fetcher, &cache, &icons).rewrite(css, Some("https://x/css/a.css"));

    let inline = encode_data_url(b"\0\0\0\0", "font/woff2");
    assert_eq!(
      out,
      format!("@font-face{{font-family:'X';src:url({}) format('woff2');}}", inline)
    );
  }

  #[test]
  fn resolves_relative_references_against_the_sheet_url() {
    let fetcher = MapFetcher::new().with_font("https://x/fonts/f.woff2", b"abc", "font/woff2");
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();

    let css = "src:url(../fonts/f.woff2);";
    let out = engine(&fetcher, &cache, &icons).rewrite(css, Some("https://x/css/a.css"));
    assert!(out.contains("data:font/woff2;base64,"));
    assert_eq!(fetcher.fetch_count("https://x/fonts/f.woff2"), 1);
  }

  #[test]
  fn repeated_references_fetch_once() {
    let fetcher = MapFetcher::new().with_font("https://x/f.woff2", b"abc", "font/woff2");
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();
    let eng = engine(&fetcher, &cache, &icons);

    let css = "src:url(f.woff2);src:url('f.woff2');";
    let out = eng.rewrite(css, Some("https://x/a.css"));
    assert!(!out.contains("url(f.woff2)"));
    assert!(!out.contains("url('f.woff2')"));
    assert_eq!(fetcher.fetch_count("https://x/f.woff2"), 1);

    // A second text referencing the same URL is served from the cache.
    let out2 = eng.rewrite("src:url(https://x/f.woff2);", None);
    assert!(out2.contains("data:font/woff2;base64,"));
    assert_eq!(fetcher.fetch_count("https://x/f.woff2"), 1);
  }

  #[test]
  fn icon_font_urls_are_never_inlined() {
    let fetcher = MapFetcher::new().with_font("https://x/fontawesome/fa.woff2", b"abc", "font/woff2");
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();

    let css = "src:url(fontawesome/fa.woff2);";
    let mut skipped = Vec::new();
    let out = engine(&fetcher, &cache, &icons).rewrite_with_diagnostics(
      css,
      Some("https://x/a.css"),
      &mut |url, reason| skipped.push((url.to_string(), reason.to_string())),
    );

    assert_eq!(out, css);
    assert_eq!(fetcher.fetch_count("https://x/fontawesome/fa.woff2"), 0);
    assert!(skipped.iter().any(|(_, reason)| reason == "icon font"));
  }

  #[test]
  fn failed_fetches_are_isolated_and_not_retried() {
    let fetcher = MapFetcher::new().with_font("https://x/b.woff2", b"b", "font/woff2");
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();
    let eng = engine(&fetcher, &cache, &icons);

    let css = "src:url(a.woff2);src:url(b.woff2);";
    let out = eng.rewrite(css, Some("https://x/s.css"));

    // B is inlined, A's reference is left as authored.
    assert!(out.contains("url(a.woff2)"));
    assert!(out.contains("data:font/woff2;base64,"));
    assert!(cache.was_attempted("https://x/a.woff2"));
    assert!(!cache.has_resource("https://x/a.woff2"));

    // The failed attempt is permanent: no retry on a later rewrite.
    let out2 = eng.rewrite("src:url(https://x/a.woff2);", None);
    assert_eq!(out2, "src:url(https://x/a.woff2);");
    assert_eq!(fetcher.fetch_count("https://x/a.woff2"), 1);
  }

  #[test]
  fn data_urls_and_empty_tokens_are_left_untouched() {
    let fetcher = MapFetcher::new();
    let cache = EmbedCache::new();
    let icons = KeywordIconFonts::new();

    let css = "src:url(data:font/woff2;base64,AAAA);background:url();";
    let out = engine(&fetcher, &cache, &icons).rewrite(css, Some("https://x/a.css"));
    assert_eq!(out, css);
    assert!(fetcher.calls.lock().unwrap().is_empty());
  }

  #[test]
  fn cache_hit_substitutes_without_fetching() {
    let fetcher = MapFetcher::new();
    let cache = EmbedCache::new();
    cache.store_resource("https://x/f.woff2", "data:font/woff2;base64,AAAA");
    let icons = KeywordIconFonts::new();

    let out = engine(&fetcher, &cache, &icons).rewrite("src:url(f.woff2);", Some("https://x/a.css"));
    assert_eq!(out, "src:url(data:font/woff2;base64,AAAA);");
    assert!(fetcher.calls.lock().unwrap().is_empty());
    // The hit marks the URL as a known font resource.
    assert!(cache.was_attempted("https://x/f.woff2"));
  }
}
