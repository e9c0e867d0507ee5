//! Script entries

use std::borrow::Cow;

use crate::section::is_loader_section;

/// Encoding declaration every script file starts with
pub const ENCODING_PRAGMA: &str = "# encoding: utf-8";

/// A single script of a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Unique identity within the bundle
    pub section: i64,
    /// Display name
    pub name: String,
    /// Decompressed script body
    pub code: String,
}

impl ScriptEntry {
    pub fn new(section: i64, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            section,
            name: name.into(),
            code: code.into(),
        }
    }

    /// Whether this entry is the generated loader script
    pub fn is_loader(&self) -> bool {
        is_loader_section(self.section)
    }
}

/// Check for the encoding pragma on the first line (ASCII case-insensitive)
pub fn has_encoding_pragma(code: &str) -> bool {
    let code = code.strip_prefix('\u{feff}').unwrap_or(code);
    code.len() >= ENCODING_PRAGMA.len()
        && code.as_bytes()[..ENCODING_PRAGMA.len()].eq_ignore_ascii_case(ENCODING_PRAGMA.as_bytes())
}

/// Prepend the encoding pragma unless the code already starts with it
///
/// # Example
/// ```
/// use rgss_scripts::script::ensure_encoding_pragma;
/// assert_eq!(ensure_encoding_pragma("p 1"), "# encoding: utf-8\np 1");
/// assert_eq!(ensure_encoding_pragma("# encoding: utf-8\np 1"), "# encoding: utf-8\np 1");
/// ```
pub fn ensure_encoding_pragma(code: &str) -> Cow<'_, str> {
    if has_encoding_pragma(code) {
        Cow::Borrowed(code)
    } else {
        Cow::Owned(format!("{}\n{}", ENCODING_PRAGMA, code))
    }
}
