//! Runtime diagnostic toggles sourced from `FONTEMBED_*` environment variables.
//!
//! Values are captured once and reused for the process lifetime. Callers can
//! also construct instances manually to override environment-derived behavior
//! when embedding the library.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

/// Parsed diagnostic toggles.
#[derive(Debug, Clone, Default)]
pub struct RuntimeToggles {
  raw: HashMap<String, String>,
}

impl RuntimeToggles {
  /// Parse all `FONTEMBED_*` environment variables into a toggle map.
  pub fn from_env() -> Self {
    let raw = std::env::vars()
      .filter(|(k, _)| k.starts_with("FONTEMBED_"))
      .collect::<HashMap<_, _>>();
    Self { raw }
  }

  /// Construct a toggle set from a provided map of key/value pairs.
  pub fn from_map(raw: HashMap<String, String>) -> Self {
    Self { raw }
  }

  /// Returns the raw string value for a toggle, if set.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.raw.get(key).map(String::as_str)
  }

  /// Returns true when the toggle is present and truthy (`!= 0`/`false`/`off`).
  pub fn truthy(&self, key: &str) -> bool {
    self
      .get(key)
      .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | ""))
      .unwrap_or(false)
  }
}

/// Process-wide toggles, captured from the environment on first use.
pub fn runtime_toggles() -> &'static Arc<RuntimeToggles> {
  static TOGGLES: OnceLock<Arc<RuntimeToggles>> = OnceLock::new();
  TOGGLES.get_or_init(|| Arc::new(RuntimeToggles::from_env()))
}
