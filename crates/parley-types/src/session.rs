//! Chat session domain types.
//!
//! A [`Session`] is the unit persisted in the document store: one
//! conversation, its title, flags and timestamps. Timestamps are written as
//! RFC 3339 with fixed microsecond precision so that string order and time
//! order agree, which lets stores sort on `updated_at` without parsing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::document::Document;
use crate::error::StoreError;
use crate::llm::Message;

/// Title every session carries until its first user message arrives.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Persona seeded as the first turn of every new session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful chatbot.";

/// Document field names, shared by the service and the stores.
pub mod fields {
    pub const SESSION_ID: &str = "session_id";
    pub const TITLE: &str = "title";
    pub const MESSAGES: &str = "messages";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const IS_PINNED: &str = "is_pinned";
    pub const IS_ARCHIVED: &str = "is_archived";
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_archived: bool,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Session {
    /// Create a fresh session seeded with a single system turn.
    pub fn new(system_prompt: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::now_v7().to_string(),
            title: default_title(),
            messages: vec![Message::system(system_prompt)],
            created_at: now,
            updated_at: now,
            is_pinned: false,
            is_archived: false,
        }
    }

    /// True while the title is still the default sentinel.
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Serialize into a store document.
    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Serialization(format!(
                "session serialized to non-object: {other}"
            ))),
        }
    }

    /// Deserialize from a store document.
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// Sidebar entry: just enough to render and select a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
}

impl SessionSummary {
    /// Read a summary from a raw document. Returns `None` without a string key.
    pub fn from_document(document: &Document) -> Option<Self> {
        let session_id = document.get(fields::SESSION_ID)?.as_str()?.to_string();
        let title = document
            .get(fields::TITLE)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        Some(Self { session_id, title })
    }
}

/// The three sidebar lists. A session may appear in both `pinned` and
/// `archived`, never in `recent` when either flag is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidebar {
    pub recent: Vec<SessionSummary>,
    pub pinned: Vec<SessionSummary>,
    pub archived: Vec<SessionSummary>,
}

/// Format a timestamp the way stored documents carry it.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serde adapter writing timestamps with [`format_timestamp`].
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
