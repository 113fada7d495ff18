const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const FALLBACK_NAME: &str = "track";

/// Turns a track title into a file name usable on every common filesystem.
///
/// Strips characters Windows forbids and control characters, trims
/// surrounding whitespace and dots, and suffixes reserved device names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let stem = cleaned.split('.').next().unwrap_or(cleaned);
    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem.trim_end()))
    {
        return format!("{cleaned}_");
    }
    cleaned.to_string()
}
