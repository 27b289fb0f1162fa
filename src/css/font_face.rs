//! `@font-face` rule scanning and synthesis
//!
//! The embedding pipeline works on a reduced view of `@font-face` rules: the
//! family, the raw `src` value, and the optional style/weight descriptors.
//! Scanning is a string- and comment-aware walk over the literal CSS text, so
//! a `@font-face` inside a comment or a string never produces a rule, and a
//! `data:` URL inside `src` (which contains `;`) never splits a declaration.

/// A logical `@font-face` record, reduced to what embedding needs.
///
/// Ephemeral: constructed from a stylesheet or the font registry, rewritten,
/// and discarded per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceDecl {
  /// `font-family` value as authored (quotes preserved)
  pub family: String,
  /// Raw `src` descriptor value
  pub src: String,
  /// `font-style` value, when declared
  pub style: Option<String>,
  /// `font-weight` value, when declared
  pub weight: Option<String>,
}

impl FontFaceDecl {
  /// Family name with any surrounding quotes stripped, for predicate matching
  pub fn family_name(&self) -> &str {
    self.family.trim().trim_matches(|c| c == '"' || c == '\'')
  }

  /// Whether the `src` descriptor references at least one `url(...)` source
  pub fn has_url_source(&self) -> bool {
    crate::css::url::url_token_regex().is_match(&self.src)
  }
}

/// Serialize a compact `@font-face` rule from its parts.
///
/// Style and weight default to `normal` when absent, matching what a loaded
/// font reports for undeclared descriptors.
pub fn format_font_face(family: &str, src: &str, style: Option<&str>, weight: Option<&str>) -> String {
  format!(
    "@font-face{{font-family:{};src:{};font-style:{};font-weight:{};}}",
    family,
    src,
    style.unwrap_or("normal"),
    weight.unwrap_or("normal"),
  )
}

#[derive(PartialEq)]
enum ScanState {
  Normal,
  Single,
  Double,
  Comment,
}

/// Scan CSS text for `@font-face` blocks and extract their descriptors.
///
/// Blocks appear in document order. Rules without a `font-family` are dropped
/// (nothing could ever reference them); a missing `src` is preserved as empty
/// so callers can apply their own skip rule.
pub fn parse_font_faces(css: &str) -> Vec<FontFaceDecl> {
  let mut out = Vec::new();
  let bytes = css.as_bytes();
  let mut state = ScanState::Normal;
  let mut i = 0usize;

  while i < bytes.len() {
    match state {
      ScanState::Normal => {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
          state = ScanState::Comment;
          i += 2;
          continue;
        }
        if bytes[i] == b'\'' {
          state = ScanState::Single;
          i += 1;
          continue;
        }
        if bytes[i] == b'"' {
          state = ScanState::Double;
          i += 1;
          continue;
        }

        if bytes[i] == b'@' && bytes.len() - i >= 10 && bytes[i + 1..i + 10].eq_ignore_ascii_case(b"font-face") {
          if let Some(open_rel) = css[i..].find('{') {
            let body_start = i + open_rel + 1;
            if let Some(body_end) = find_block_end(css, body_start) {
              if let Some(decl) = parse_block(&css[body_start..body_end]) {
                out.push(decl);
              }
              i = body_end + 1;
              continue;
            }
          }
          // Malformed block (no braces): nothing usable past this point.
          break;
        }

        i += 1;
      }
      ScanState::Single => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'\'' {
          state = ScanState::Normal;
        }
        i += 1;
      }
      ScanState::Double => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'"' {
          state = ScanState::Normal;
        }
        i += 1;
      }
      ScanState::Comment => {
        if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
          state = ScanState::Normal;
          i += 2;
        } else {
          i += 1;
        }
      }
    }
  }

  out
}

/// Find the `}` closing the block whose body starts at `start`.
fn find_block_end(css: &str, start: usize) -> Option<usize> {
  let bytes = css.as_bytes();
  let mut state = ScanState::Normal;
  let mut depth = 1usize;
  let mut i = start;

  while i < bytes.len() {
    match state {
      ScanState::Normal => match bytes[i] {
        b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
          state = ScanState::Comment;
          i += 1;
        }
        b'\'' => state = ScanState::Single,
        b'"' => state = ScanState::Double,
        b'{' => depth += 1,
        b'}' => {
          depth -= 1;
          if depth == 0 {
            return Some(i);
          }
        }
        _ => {}
      },
      ScanState::Single => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'\'' {
          state = ScanState::Normal;
        }
      }
      ScanState::Double => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'"' {
          state = ScanState::Normal;
        }
      }
      ScanState::Comment => {
        if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
          state = ScanState::Normal;
          i += 1;
        }
      }
    }
    i += 1;
  }

  None
}

fn parse_block(body: &str) -> Option<FontFaceDecl> {
  let mut family: Option<String> = None;
  let mut src: Option<String> = None;
  let mut style: Option<String> = None;
  let mut weight: Option<String> = None;

  for declaration in split_declarations(body) {
    let Some((property, value)) = declaration.split_once(':') else {
      continue;
    };
    let property = property.trim().to_ascii_lowercase();
    let value = value.trim();
    if value.is_empty() {
      continue;
    }
    match property.as_str() {
      "font-family" => family = Some(value.to_string()),
      "src" => src = Some(value.to_string()),
      "font-style" => style = Some(value.to_string()),
      "font-weight" => weight = Some(value.to_string()),
      _ => {}
    }
  }

  Some(FontFaceDecl {
    family: family?,
    src: src.unwrap_or_default(),
    style,
    weight,
  })
}

/// Split a declaration block on `;`, ignoring separators inside strings,
/// comments, and parentheses (a `data:` URL in `src` carries its own `;`).
fn split_declarations(body: &str) -> Vec<String> {
  let mut out = Vec::new();
  let bytes = body.as_bytes();
  let mut state = ScanState::Normal;
  let mut paren_depth = 0usize;
  let mut segment_start = 0usize;
  let mut i = 0usize;

  while i < bytes.len() {
    match state {
      ScanState::Normal => match bytes[i] {
        b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
          state = ScanState::Comment;
          i += 1;
        }
        b'\'' => state = ScanState::Single,
        b'"' => state = ScanState::Double,
        b'(' => paren_depth += 1,
        b')' => paren_depth = paren_depth.saturating_sub(1),
        b';' if paren_depth == 0 => {
          out.push(body[segment_start..i].to_string());
          segment_start = i + 1;
        }
        _ => {}
      },
      ScanState::Single => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'\'' {
          state = ScanState::Normal;
        }
      }
      ScanState::Double => {
        if bytes[i] == b'\\' {
          i += 2;
          continue;
        }
        if bytes[i] == b'"' {
          state = ScanState::Normal;
        }
      }
      ScanState::Comment => {
        if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
          state = ScanState::Normal;
          i += 1;
        }
      }
    }
    i += 1;
  }

  if segment_start < body.len() {
    out.push(body[segment_start..].to_string());
  }
  out
}
