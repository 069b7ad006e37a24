//! Session title derivation from the first user message.

/// Maximum characters kept from the user message.
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended when the message was cut.
pub const TITLE_ELLIPSIS: &str = "...";

/// Derive a session title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters (not bytes) and appends
/// [`TITLE_ELLIPSIS`] only when something was cut.
pub fn derive_title(first_user_message: &str) -> String {
    match first_user_message.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{TITLE_ELLIPSIS}", &first_user_message[..cut]),
        None => first_user_message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_message_is_truncated_with_ellipsis() {
        let title = derive_title("Hello world, this is a long test message");
        assert_eq!(title, "Hello world, this is a long te...");
    }

    #[test]
    fn test_short_message_is_kept_verbatim() {
        assert_eq!(derive_title("Quick question"), "Quick question");
    }

    #[test]
    fn test_exactly_thirty_chars_has_no_ellipsis() {
        let msg = "a".repeat(30);
        assert_eq!(derive_title(&msg), msg);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let msg = "é".repeat(31);
        let title = derive_title(&msg);
        assert_eq!(title, format!("{}...", "é".repeat(30)));
    }
}
