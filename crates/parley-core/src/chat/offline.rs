//! Canned replies used when the language-model backend fails.
//!
//! The reply is picked from keywords in the user's message so the
//! conversation stays readable while the backend is down.

/// Greeting when the user says hello.
pub const OFFLINE_GREETING: &str = "Hello! I am currently working in offline mode because the \
    language model is unavailable. How can I help you locally?";

/// Answer to "who are you".
pub const OFFLINE_IDENTITY: &str = "I am a simple chatbot.";

/// Farewell.
pub const OFFLINE_FAREWELL: &str = "Goodbye! Have a nice day.";

/// Fallback for anything else.
pub const OFFLINE_DEFAULT: &str = "I am currently offline. I can't generate smart answers right \
    now, but I can hear you! Please check the language model configuration.";

/// Pick the offline reply for a user message (case-insensitive keyword match).
pub fn offline_reply(user_text: &str) -> &'static str {
    let text = user_text.to_lowercase();
    if text.contains("hello") || text.contains("hi") {
        OFFLINE_GREETING
    } else if text.contains("who are you") {
        OFFLINE_IDENTITY
    } else if text.contains("bye") {
        OFFLINE_FAREWELL
    } else {
        OFFLINE_DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_keywords() {
        assert_eq!(offline_reply("hi"), OFFLINE_GREETING);
        assert_eq!(offline_reply("HELLO there"), OFFLINE_GREETING);
    }

    #[test]
    fn test_identity_and_farewell() {
        assert_eq!(offline_reply("Who are you?"), OFFLINE_IDENTITY);
        assert_eq!(offline_reply("ok bye"), OFFLINE_FAREWELL);
    }

    #[test]
    fn test_default_is_non_empty() {
        let reply = offline_reply("what's the weather");
        assert_eq!(reply, OFFLINE_DEFAULT);
        assert!(!reply.is_empty());
    }
}
