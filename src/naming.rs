//! Script file naming
//!
//! Scripts are written to disk as `"0001 - Name.rb"`: a zero padded ordering
//! prefix, the display name with filesystem-hostile characters removed, and
//! the `.rb` extension. [`deformat_script_name`] recovers the display name.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Extension of script files
pub const SCRIPT_EXTENSION: &str = "rb";

/// Characters never allowed in a script file name
///
/// The usual Windows/Unix path specials, plus `#` which the loader treats as
/// a comment marker in the load order file.
pub const INVALID_CHARACTERS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '#'];

/// Name used when nothing is left of the display name after filtering
pub const UNTITLED_SCRIPT: &str = "Untitled";

fn deformat_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d+ - )?(.+?)(?i:\.rb)?$").expect("deformat pattern is valid")
    })
}

/// Remove invalid characters and leading whitespace from a display name
pub fn sanitize_script_name(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| !INVALID_CHARACTERS.contains(c) && !c.is_control())
        .collect();
    filtered.trim_start().to_string()
}

/// Build the on-disk file name for a script
///
/// # Example
/// ```
/// use rgss_scripts::naming::format_script_name;
/// assert_eq!(format_script_name("Scene_Map", 12), "0012 - Scene_Map.rb");
/// assert_eq!(format_script_name(" Win/Lose?", 3), "0003 - WinLose.rb");
/// ```
pub fn format_script_name(name: &str, index: usize) -> String {
    let mut name = sanitize_script_name(name);
    if name.is_empty() {
        name = UNTITLED_SCRIPT.to_string();
    }

    let mut file_name = format!("{:04} - {}", index, name);
    if !file_name.ends_with(".rb") {
        file_name.push_str(".rb");
    }
    file_name
}

/// Recover the display name from a script file name or path
///
/// Strips the `"<digits> - "` prefix and the `.rb` extension. Names that do
/// not fit the pattern are returned unchanged.
pub fn deformat_script_name(file: impl AsRef<Path>) -> String {
    let path = file.as_ref();
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    match deformat_regex().captures(&base) {
        Some(caps) => caps[1].to_string(),
        None => base,
    }
}

/// Check whether a path names a script file (extension match, any case)
pub fn is_script_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
        .unwrap_or(false)
}
