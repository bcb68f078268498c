//! Test name normalization.
//!
//! Names are used as map keys and as path segments in subtest names
//! (`parent/child`), so separators and unprintable characters must not survive.

/// Replacement for path separators.
const SEPARATOR_REPLACEMENT: char = '_';

/// Normalizes a user-supplied test or subtest name.
///
/// Path separators (`/` and `\`) become `_`. Whitespace control characters
/// (tabs, newlines) become a plain space, and any other non-printable
/// character is dropped.
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter_map(map_char).collect()
}

fn map_char(c: char) -> Option<char> {
    match c {
        '/' | '\\' => Some(SEPARATOR_REPLACEMENT),
        c if c.is_whitespace() && c.is_control() => Some(' '),
        c if c.is_control() || is_invisible(c) => None,
        c => Some(c),
    }
}

// Format characters that render as nothing but would make two names look equal.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}
