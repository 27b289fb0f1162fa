//! Embed orchestration
//!
//! This module coordinates the full pipeline: acquire `@import`ed sheets,
//! run the three source aggregators, concatenate their CSS, memoize the
//! result, and optionally attach it to the document.
//!
//! ```text
//! cache hit? ── yes ──► return cached
//!     │ no
//!     ▼
//! acquire imports ► linked sheets ► materialized rules ► registered fonts
//!     ▼
//! concat ► cache under "fonts-embed-css" ► (inject) ► return
//! ```
//!
//! Every failure inside the pipeline — a dead link, an unreadable sheet, a
//! missing font binary — is logged with the offending URL and converted into
//! a skip of that one unit of work. The entry point never fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use fontembed::{Document, EmbedOptions, FontEmbedder};
//!
//! let embedder = FontEmbedder::new();
//! let mut doc = Document::with_url("https://example.com/page.html");
//! doc.add_style_block("@font-face{font-family:Body;src:url(/fonts/body.woff2);}");
//!
//! let css = embedder.embed_custom_fonts(&mut doc, &EmbedOptions::default());
//! println!("{} bytes of embedded font CSS", css.len());
//! ```

use crate::cache::{EmbedCache, EMBED_CSS_KEY};
use crate::css::font_face::format_font_face;
use crate::css::imports::extract_import_urls;
use crate::css::rewrite::InlineEngine;
use crate::css::url::{is_data_url, resolve_href_with_base};
use crate::debug::runtime_toggles;
use crate::document::{Document, FontStatus};
use crate::fetch::{HttpFetcher, ResourceFetcher};
use crate::icon::{IconFontClassifier, KeywordIconFonts};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Marker attribute carried by the style element the embedder injects.
///
/// Downstream consumers (e.g. a snapshot serializer) use it to locate or
/// exclude framework-generated styles.
pub const STYLE_MARKER_ATTR: &str = "data-fontembed";

/// Options for a single embedding pass.
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    /// When set, the aggregated CSS is also attached to the document as a
    /// style element carrying [`STYLE_MARKER_ATTR`], in addition to being
    /// returned and cached.
    pub pre_cached: bool,
}

/// Font embedding engine
///
/// Holds the injected collaborators: the resource fetcher, the shared
/// process-lifetime cache, and the icon-font classifier. Construct with
/// [`FontEmbedder::new`] for defaults or [`FontEmbedder::builder`] to inject
/// your own.
///
/// # Thread Safety
///
/// `FontEmbedder` is `Send + Sync`; the shared cache uses interior
/// mutability, and writes to it are idempotent per URL.
pub struct FontEmbedder {
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Arc<EmbedCache>,
    icons: Arc<dyn IconFontClassifier>,
}

impl FontEmbedder {
    /// Embedder with an [`HttpFetcher`], a fresh cache, and the default
    /// icon-font classifier
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building an embedder with injected collaborators
    pub fn builder() -> FontEmbedderBuilder {
        FontEmbedderBuilder::default()
    }

    /// The shared cache this embedder writes through
    pub fn cache(&self) -> &Arc<EmbedCache> {
        &self.cache
    }

    /// Produce one self-contained CSS payload covering every custom font the
    /// document references.
    ///
    /// The first call runs discovery; the aggregated result is memoized under
    /// [`EMBED_CSS_KEY`] and later calls against the same cache return it
    /// verbatim without fetching anything. The returned string may be empty;
    /// this method never fails.
    pub fn embed_custom_fonts(&self, doc: &mut Document, options: &EmbedOptions) -> String {
        if let Some(cached) = self.cache.resource(EMBED_CSS_KEY) {
            return cached;
        }

        self.acquire_imports(doc);

        let engine = InlineEngine {
            fetcher: &self.fetcher,
            cache: &self.cache,
            icons: &self.icons,
        };

        let mut sections: Vec<String> = Vec::new();
        let covered = self.aggregate_linked_sheets(doc, &engine, &mut sections);
        self.aggregate_sheet_rules(doc, &engine, &covered, &mut sections);
        self.aggregate_registered_fonts(doc, &engine, &mut sections);

        let css = sections.join("\n");
        if !css.is_empty() {
            self.cache.store_resource(EMBED_CSS_KEY, css.clone());
            if options.pre_cached {
                doc.inject_style_element(
                    css.clone(),
                    vec![(STYLE_MARKER_ATTR.to_string(), "true".to_string())],
                );
            }
        }
        css
    }

    /// Materialize every `@import` target found in inline style blocks as a
    /// loaded stylesheet, so rule enumeration sees the imported fonts.
    ///
    /// Each import settles independently: icon-font targets and already
    /// loaded URLs are skipped, and a failed fetch logs and moves on.
    fn acquire_imports(&self, doc: &mut Document) {
        let debug = runtime_toggles().truthy("FONTEMBED_LOG_FONTS");
        let targets: Vec<String> = doc
            .style_blocks()
            .iter()
            .flat_map(|block| extract_import_urls(block))
            .collect();

        for target in targets {
            let Some(resolved) = resolve_href_with_base(doc.url(), &target) else {
                continue;
            };
            if self.icons.is_icon_font(&resolved) {
                if debug {
                    eprintln!("[fonts] skipping icon-font import: {}", resolved);
                }
                continue;
            }
            if doc.has_stylesheet(&resolved) {
                continue;
            }
            match self.fetcher.fetch(&resolved) {
                Ok(resource) => {
                    if debug {
                        eprintln!("[fonts] materialized @import: {}", resolved);
                    }
                    doc.add_stylesheet(crate::document::StyleSheet::linked_with_text(
                        resolved,
                        resource.text(),
                    ));
                }
                Err(err) => {
                    eprintln!("[fonts] failed to load @import {}: {}", resolved, err);
                }
            }
        }
    }

    /// Aggregate fonts from link-backed sheets, rewriting each sheet's text
    /// with the link URL as the base for relative references.
    ///
    /// Returns the set of resolved link URLs this pass covered, so the rules
    /// pass does not enumerate the same sheets again.
    fn aggregate_linked_sheets(
        &self,
        doc: &Document,
        engine: &InlineEngine<'_>,
        sections: &mut Vec<String>,
    ) -> FxHashSet<String> {
        let debug = runtime_toggles().truthy("FONTEMBED_LOG_FONTS");
        let mut covered = FxHashSet::default();

        for sheet in doc.stylesheets() {
            if !sheet.is_link_backed() {
                continue;
            }
            let Some(href) = sheet.href() else {
                continue;
            };
            let Some(resolved) = resolve_href_with_base(doc.url(), href) else {
                continue;
            };
            covered.insert(resolved.clone());

            if self.icons.is_icon_font(&resolved) {
                if debug {
                    eprintln!("[fonts] skipping icon-font sheet: {}", resolved);
                }
                continue;
            }

            let text = match sheet.css_text() {
                Some(text) => text.to_string(),
                None => match self.fetcher.fetch(&resolved) {
                    Ok(resource) => resource.text(),
                    Err(err) => {
                        eprintln!("[fonts] failed to fetch stylesheet {}: {}", resolved, err);
                        continue;
                    }
                },
            };
            if self.icons.is_icon_font(&text) {
                if debug {
                    eprintln!("[fonts] skipping icon-font sheet by content: {}", resolved);
                }
                continue;
            }

            sections.push(engine.rewrite(&text, Some(&resolved)));
        }

        covered
    }

    /// Aggregate `@font-face` rules from sheets the linked pass did not
    /// cover, enumerating materialized rules directly.
    fn aggregate_sheet_rules(
        &self,
        doc: &Document,
        engine: &InlineEngine<'_>,
        covered: &FxHashSet<String>,
        sections: &mut Vec<String>,
    ) {
        let debug = runtime_toggles().truthy("FONTEMBED_LOG_FONTS");

        for sheet in doc.stylesheets() {
            let resolved_href = sheet
                .href()
                .and_then(|href| resolve_href_with_base(doc.url(), href));
            if let Some(resolved) = &resolved_href {
                if covered.contains(resolved) {
                    continue;
                }
            }

            let faces = match sheet.font_faces() {
                Ok(faces) => faces,
                Err(err) => {
                    eprintln!("[fonts] skipping inaccessible stylesheet: {}", err);
                    continue;
                }
            };

            let base = resolved_href.as_deref().or(doc.url());
            for face in faces {
                if face.src.trim().is_empty() {
                    continue;
                }
                if self.icons.is_icon_font(face.family_name()) {
                    if debug {
                        eprintln!("[fonts] skipping icon-font family: {}", face.family_name());
                    }
                    continue;
                }

                let src = if face.has_url_source() {
                    engine.rewrite(&face.src, base)
                } else {
                    // local()-only sources need no fetch; preserve verbatim.
                    face.src.clone()
                };
                sections.push(format_font_face(
                    &face.family,
                    &src,
                    face.style.as_deref(),
                    face.weight.as_deref(),
                ));
            }
        }
    }

    /// Aggregate dynamically registered fonts, synthesizing a `@font-face`
    /// rule per loaded font with a recorded source.
    fn aggregate_registered_fonts(
        &self,
        doc: &Document,
        engine: &InlineEngine<'_>,
        sections: &mut Vec<String>,
    ) {
        let debug = runtime_toggles().truthy("FONTEMBED_LOG_FONTS");

        for font in doc.fonts() {
            if font.status != FontStatus::Loaded {
                continue;
            }
            let Some(source) = font.source_url.as_deref() else {
                continue;
            };
            if self.icons.is_icon_font(&font.family) {
                if debug {
                    eprintln!("[fonts] skipping icon-font registration: {}", font.family);
                }
                continue;
            }

            // The recorded source is a raw key, not a CSS reference; it is
            // cached and fetched under the exact string.
            let inline = if is_data_url(source) {
                source.to_string()
            } else {
                match engine.inline_keyed(source, &mut |_url, _reason| {}) {
                    Some(inline) => inline,
                    None => continue,
                }
            };

            sections.push(format_font_face(
                &font.family,
                &format!("url({})", inline),
                font.style.as_deref(),
                font.weight.as_deref(),
            ));
        }
    }
}

impl Default for FontEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`FontEmbedder`]
///
/// Unset collaborators fall back to the defaults: [`HttpFetcher`], a fresh
/// [`EmbedCache`], and [`KeywordIconFonts`].
#[derive(Default)]
pub struct FontEmbedderBuilder {
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    cache: Option<Arc<EmbedCache>>,
    icons: Option<Arc<dyn IconFontClassifier>>,
}

impl FontEmbedderBuilder {
    /// Use a custom resource fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Share an existing cache (e.g. across documents or embedders)
    pub fn cache(mut self, cache: Arc<EmbedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a custom icon-font classifier
    pub fn icon_fonts(mut self, icons: Arc<dyn IconFontClassifier>) -> Self {
        self.icons = Some(icons);
        self
    }

    /// Build the embedder
    pub fn build(self) -> FontEmbedder {
        FontEmbedder {
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new())),
            cache: self.cache.unwrap_or_default(),
            icons: self.icons.unwrap_or_else(|| Arc::new(KeywordIconFonts::new())),
        }
    }
}
