use fontembed::fetch::{FetchedResource, ResourceFetcher};
use fontembed::{Document, EmbedCache, EmbedOptions, FetchError, FontEmbedder, StyleSheet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct RecordingFetcher {
  map: HashMap<String, (Vec<u8>, Option<String>)>,
  calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingFetcher {
  fn with_css(mut self, url: &str, css: &str) -> Self {
    self.map.insert(
      url.to_string(),
      (css.as_bytes().to_vec(), Some("text/css".to_string())),
    );
    self
  }

  fn with_font(mut self, url: &str, bytes: &[u8]) -> Self {
    self.map.insert(
      url.to_string(),
      (bytes.to_vec(), Some("font/woff2".to_string())),
    );
    self
  }

  fn count(&self, url: &str) -> usize {
    self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
  }
}

impl ResourceFetcher for RecordingFetcher {
  fn fetch(&self, url: &str) -> fontembed::Result<FetchedResource> {
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

fn embedder(fetcher: &RecordingFetcher) -> FontEmbedder {
  FontEmbedder::builder()
    .fetcher(Arc::new(fetcher.clone()))
    .cache(Arc::new(EmbedCache::new()))
    .build()
}

#[test]
fn imports_in_style_blocks_are_materialized_and_embedded() {
  let fetcher = RecordingFetcher::default()
    .with_css(
      "https://x/fonts.css",
      "@font-face{font-family:Imported;src:url(fonts/imported.woff2);}",
    )
    .with_font("https://x/fonts/imported.woff2", b"imported-bytes");

  let mut doc = Document::with_url("https://x/page.html");
  doc.add_style_block("@import url(fonts.css);\nbody { margin: 0; }");

  let css = embedder(&fetcher).embed_custom_fonts(&mut doc, &EmbedOptions::default());

  // The imported sheet became a loaded stylesheet and its font was inlined.
  assert!(doc.has_stylesheet("https://x/fonts.css"));
  assert!(css.contains("font-family:Imported"));
  assert!(css.contains("data:font/woff2;base64,"));
  assert_eq!(fetcher.count("https://x/fonts.css"), 1);
  assert_eq!(fetcher.count("https://x/fonts/imported.woff2"), 1);
}

#[test]
fn already_loaded_imports_are_not_fetched_again() {
  let fetcher = RecordingFetcher::default();

  let mut doc = Document::with_url("https://x/page.html");
  doc.add_stylesheet(StyleSheet::linked_with_text(
    "https://x/fonts.css",
    "@font-face{font-family:Preloaded;src:local(Preloaded);}",
  ));
  doc.add_style_block("@import url(fonts.css);");

  let css = embedder(&fetcher).embed_custom_fonts(&mut doc, &EmbedOptions::default());

  assert_eq!(fetcher.count("https://x/fonts.css"), 0);
  assert!(css.contains("font-family:Preloaded"));
  // Exactly one sheet carries the URL; acquisition did not add a duplicate.
  assert_eq!(
    doc
      .stylesheets()
      .iter()
      .filter(|sheet| sheet.href() == Some("https://x/fonts.css"))
      .count(),
    1
  );
}

#[test]
fn icon_font_imports_are_never_fetched() {
  let fetcher = RecordingFetcher::default();

  let mut doc = Document::with_url("https://x/page.html");
  doc.add_style_block("@import url(https://cdn.example.com/fontawesome/all.css);");

  let css = embedder(&fetcher).embed_custom_fonts(&mut doc, &EmbedOptions::default());

  assert!(css.is_empty());
  assert_eq!(fetcher.count("https://cdn.example.com/fontawesome/all.css"), 0);
}

#[test]
fn a_missing_import_settles_without_aborting_the_pipeline() {
  let fetcher = RecordingFetcher::default().with_font("https://x/fonts/body.woff2", b"body-bytes");

  let mut doc = Document::with_url("https://x/page.html");
  doc.add_style_block("@import url(missing.css);");
  doc.add_style_block("@font-face{font-family:Body;src:url(fonts/body.woff2);}");

  let css = embedder(&fetcher).embed_custom_fonts(&mut doc, &EmbedOptions::default());

  // The dead import was attempted once and simply skipped.
  assert_eq!(fetcher.count("https://x/missing.css"), 1);
  assert!(!doc.has_stylesheet("https://x/missing.css"));
  assert!(css.contains("font-family:Body"));
  assert!(css.contains("data:font/woff2;base64,"));
}

#[test]
fn string_form_imports_resolve_against_the_document_url() {
  let fetcher = RecordingFetcher::default().with_css(
    "https://x/nested/theme.css",
    "@font-face{font-family:Theme;src:local(Theme);}",
  );

  let mut doc = Document::with_url("https://x/nested/page.html");
  doc.add_style_block("@import \"theme.css\";");

  let css = embedder(&fetcher).embed_custom_fonts(&mut doc, &EmbedOptions::default());

  assert!(doc.has_stylesheet("https://x/nested/theme.css"));
  assert!(css.contains("font-family:Theme"));
}
