//! Utilities for sanitizing error messages and file names.
//!
//! Removes control characters from failure reasons before storing them in the
//! database, and reduces remote file names to something safe to write inside
//! the namespace directory.

/// Sanitizes an error message by removing control characters.
///
/// Control characters (0x00-0x1F, except newline/tab/carriage return) can cause
/// issues when stored in databases or displayed in logs.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 // Printable ASCII starts at 0x20 (space)
                || code == 0x09 // Tab
                || code == 0x0A // Newline
                || code == 0x0D // Carriage return
        })
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH`.
///
/// Truncation happens on a character boundary and appends an indicator with
/// the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);

    if sanitized.len() > crate::config::MAX_ERROR_MESSAGE_LENGTH {
        // Leave room for the truncation message
        let mut truncate_len = crate::config::MAX_ERROR_MESSAGE_LENGTH
            .saturating_sub(50)
            .min(sanitized.len());
        while !sanitized.is_char_boundary(truncate_len) {
            truncate_len -= 1;
        }
        format!(
            "{}... (truncated, original length: {} chars)",
            &sanitized[..truncate_len],
            sanitized.len()
        )
    } else {
        sanitized
    }
}

/// Reduces a remote file name to characters safe in a local file name.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// An empty or dot-only name becomes `index.js`. Names longer than
/// `MAX_LOCAL_FILE_NAME_LENGTH` bytes are shortened, keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "index.js".to_string()
    } else {
        truncate_file_name(cleaned, crate::config::MAX_LOCAL_FILE_NAME_LENGTH)
    }
}

fn truncate_file_name(name: String, max_len: usize) -> String {
    if name.len() <= max_len {
        return name;
    }
    // Extensions longer than a quarter of the budget are treated as part of the stem
    let extension = name
        .rfind('.')
        .filter(|&i| i > 0 && name.len() - i <= max_len / 4)
        .map_or("", |i| &name[i..]);
    let mut stem_len = max_len - extension.len();
    while !name.is_char_boundary(stem_len) {
        stem_len -= 1;
    }
    format!("{}{}", &name[..stem_len], extension)
}
