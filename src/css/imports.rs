//! `@import` target extraction from inline style text
//!
//! The acquisition phase needs every `@import` URL that appears inside a
//! document's inline style blocks, so the imported sheets can be materialized
//! before stylesheet enumeration proceeds. A single pattern match over the
//! literal block text is sufficient here; media-query suffixes are ignored
//! because the embedding pass cares about the fonts a sheet declares, not
//! when it applies.

use regex::Regex;
use std::sync::OnceLock;

/// Matches `@import url(...)` and `@import "..."`/`@import '...'` forms.
fn import_regex() -> &'static Regex {
  static IMPORT: OnceLock<Regex> = OnceLock::new();
  IMPORT.get_or_init(|| {
    Regex::new(
      "(?i)@import\\s+(?:url\\(\\s*(?:\"([^\"]*)\"|'([^']*)'|([^\"')][^)]*))\\s*\\)|\"([^\"]*)\"|'([^']*)')",
    )
    .unwrap_or_else(|err| panic!("invalid @import regex: {err}"))
  })
}

/// Extract every `@import` target from a block of CSS text.
///
/// Returned targets are as authored (possibly relative) in document order.
pub fn extract_import_urls(css: &str) -> Vec<String> {
  import_regex()
    .captures_iter(css)
    .filter_map(|caps| {
      caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .or_else(|| caps.get(4))
        .or_else(|| caps.get(5))
        .map(|m| m.as_str().trim().to_string())
    })
    .filter(|target| !target.is_empty())
    .collect()
}
