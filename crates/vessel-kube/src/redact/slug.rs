//! Slugs used as store keys

use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("static regex"));

/// Derive a store key from a display name
///
/// Spaces become hyphens, then every character outside `[A-Za-z0-9_-]` is
/// dropped. Case is preserved.
pub fn slugify(name: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&name.replace(' ', "-"), "")
        .into_owned()
}
