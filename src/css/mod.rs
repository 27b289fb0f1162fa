//! CSS text utilities: URL resolution/extraction, `@import` discovery,
//! `@font-face` scanning, and the font-reference rewriter.

pub mod font_face;
pub mod imports;
pub(crate) mod rewrite;
pub mod url;

pub use font_face::{format_font_face, parse_font_faces, FontFaceDecl};
pub use imports::extract_import_urls;
pub use url::{extract_url, is_data_url, resolve_href, resolve_href_with_base};
