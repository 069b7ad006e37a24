//! Session service orchestrating session lifecycle and chat turns.
//!
//! SessionService coordinates the DocumentStore and the LlmProvider to manage
//! the full conversation lifecycle: creating sessions, appending turns,
//! deriving titles, toggling flags, deleting, and listing the sidebar.
//!
//! A chat turn never fails outward. When the store is down the turn runs on
//! an unpersisted session; when the backend fails the reply is an offline
//! message that is persisted like any other assistant turn.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use parley_types::config::ChatSettings;
use parley_types::document::{Filter, SortDirection, Update};
use parley_types::error::{SessionError, StoreError};
use parley_types::llm::{CompletionRequest, LlmError, Message, MessageRole};
use parley_types::session::{
    fields, format_timestamp, Session, SessionSummary, Sidebar, DEFAULT_TITLE,
};

use crate::chat::offline::offline_reply;
use crate::chat::title::derive_title;
use crate::llm::provider::LlmProvider;
use crate::store::DocumentStore;

/// How the reply of a chat turn was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The backend answered.
    Generated,
    /// The backend failed; the reply is a canned offline message.
    Offline { error: LlmError },
}

impl ReplyOutcome {
    pub fn is_offline(&self) -> bool {
        matches!(self, ReplyOutcome::Offline { .. })
    }
}

/// Result of [`SessionService::run_turn`].
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub session_id: String,
    pub reply: String,
    pub outcome: ReplyOutcome,
}

/// Orchestrates chat sessions on top of a document store and an LLM provider.
///
/// Generic over `DocumentStore` and `LlmProvider` to maintain clean
/// architecture (parley-core never depends on parley-infra).
pub struct SessionService<S: DocumentStore, P: LlmProvider> {
    store: S,
    provider: P,
    settings: ChatSettings,
}

impl<S: DocumentStore, P: LlmProvider> SessionService<S, P> {
    /// Create a new session service.
    pub fn new(store: S, provider: P, settings: ChatSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    /// Access the document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the LLM provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    // --- Session lifecycle ---

    /// Create and persist a fresh session.
    ///
    /// Never fails: if the store rejects the insert, the session is returned
    /// anyway and simply will not persist.
    pub async fn create_session(&self) -> Session {
        let session = Session::new(&self.settings.system_prompt);

        let persisted = match session.to_document() {
            Ok(document) => self.store.insert_one(document).await,
            Err(e) => Err(e),
        };

        match persisted {
            Ok(()) => info!(session_id = %session.session_id, "Session created"),
            Err(e) => warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to persist new session; continuing without history"
            ),
        }

        session
    }

    /// Resolve a session by ID, creating a new one if the ID is absent,
    /// empty, or unknown.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> Session {
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            match self.get_session(id).await {
                Ok(Some(session)) => return session,
                Ok(None) => debug!(session_id = %id, "Unknown session, creating a new one"),
                Err(e) => warn!(session_id = %id, error = %e, "Session lookup failed, creating a new one"),
            }
        }
        self.create_session().await
    }

    /// Get a session by ID.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, SessionError> {
        match self.store.find_one(&Filter::by_key(session_id)).await? {
            Some(document) => Ok(Some(Session::from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Append turns to a session's conversation and refresh `updated_at`.
    ///
    /// While the title is still the default, the first user turn in the batch
    /// also sets the title, in the same update. Returns whether the session
    /// existed.
    pub async fn append_turns(
        &self,
        session_id: &str,
        turns: &[Message],
    ) -> Result<bool, SessionError> {
        let values = turns
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(StoreError::from)?;

        let update = Update::new()
            .push_each(fields::MESSAGES, values)
            .set(fields::UPDATED_AT, format_timestamp(&Utc::now()));

        if let Some(first_user) = turns.iter().find(|t| t.role == MessageRole::User) {
            let title = derive_title(&first_user.content);
            let untitled = Filter::by_key(session_id).eq(fields::TITLE, DEFAULT_TITLE);
            let titled_update = update.clone().set(fields::TITLE, title.clone());

            if self.store.update_one(&untitled, &titled_update).await? {
                info!(session_id = %session_id, title = %title, "Session title set");
                return Ok(true);
            }
        }

        Ok(self.store.update_one(&Filter::by_key(session_id), &update).await?)
    }

    /// Run one chat turn: resolve the session, record the user message, ask
    /// the backend, record and return the reply.
    pub async fn run_turn(&self, session_id: Option<&str>, user_text: &str) -> TurnResult {
        let mut session = self.get_or_create(session_id).await;
        let session_id = session.session_id.clone();

        let user_turn = Message::user(user_text);
        if let Err(e) = self
            .append_turns(&session_id, std::slice::from_ref(&user_turn))
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to persist user turn");
        }
        session.messages.push(user_turn);

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: session.messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            session_id = %session_id,
        );

        let (reply, outcome) = match self.provider.complete(&request).instrument(span).await {
            Ok(response) => {
                debug!(
                    session_id = %session_id,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    stop_reason = %response.stop_reason,
                    "Backend replied"
                );
                (response.content, ReplyOutcome::Generated)
            }
            Err(error) => {
                warn!(session_id = %session_id, error = %error, "Backend failed, replying offline");
                (offline_reply(user_text).to_string(), ReplyOutcome::Offline { error })
            }
        };

        if let Err(e) = self
            .append_turns(&session_id, &[Message::assistant(reply.clone())])
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to persist assistant turn");
        }

        TurnResult {
            session_id,
            reply,
            outcome,
        }
    }

    /// Full conversation of a session, in order.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>, SessionError> {
        self.get_session(session_id)
            .await?
            .map(|session| session.messages)
            .ok_or(SessionError::NotFound)
    }

    /// Flip `is_pinned` and return the new value.
    pub async fn toggle_pin(&self, session_id: &str) -> Result<bool, SessionError> {
        self.toggle_flag(session_id, fields::IS_PINNED).await
    }

    /// Flip `is_archived` and return the new value.
    pub async fn toggle_archive(&self, session_id: &str) -> Result<bool, SessionError> {
        self.toggle_flag(session_id, fields::IS_ARCHIVED).await
    }

    async fn toggle_flag(&self, session_id: &str, field: &str) -> Result<bool, SessionError> {
        let filter = Filter::by_key(session_id);
        let document = self
            .store
            .find_one(&filter)
            .await?
            .ok_or(SessionError::NotFound)?;

        let value = !document.get(field).and_then(Value::as_bool).unwrap_or(false);
        let update = Update::new()
            .set(field, value)
            .set(fields::UPDATED_AT, format_timestamp(&Utc::now()));

        if !self.store.update_one(&filter, &update).await? {
            return Err(SessionError::NotFound);
        }

        info!(session_id = %session_id, field, value, "Session flag toggled");
        Ok(value)
    }

    /// Delete a session. Deleting an unknown ID is not an error.
    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let removed = self.store.delete_one(&Filter::by_key(session_id)).await?;
        if removed {
            info!(session_id = %session_id, "Session deleted");
        } else {
            debug!(session_id = %session_id, "Delete of unknown session ignored");
        }
        Ok(())
    }

    // --- Sidebar ---

    /// Recent (neither pinned nor archived, capped), pinned, and archived
    /// sessions, each newest first by `updated_at`.
    pub async fn sidebar(&self) -> Result<Sidebar, SessionError> {
        let recent = self
            .store
            .find(
                Filter::all()
                    .ne(fields::IS_ARCHIVED, true)
                    .ne(fields::IS_PINNED, true),
            )
            .sort(fields::UPDATED_AT, SortDirection::Descending)
            .limit(self.settings.recent_limit)
            .into_documents()
            .await?;

        let pinned = self
            .store
            .find(Filter::all().eq(fields::IS_PINNED, true))
            .sort(fields::UPDATED_AT, SortDirection::Descending)
            .into_documents()
            .await?;

        let archived = self
            .store
            .find(Filter::all().eq(fields::IS_ARCHIVED, true))
            .sort(fields::UPDATED_AT, SortDirection::Descending)
            .into_documents()
            .await?;

        let summarize = |documents: Vec<_>| -> Vec<SessionSummary> {
            documents
                .iter()
                .filter_map(SessionSummary::from_document)
                .collect()
        };

        Ok(Sidebar {
            recent: summarize(recent),
            pinned: summarize(pinned),
            archived: summarize(archived),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Duration;
    use parley_types::document::{Document, FindQuery};
    use parley_types::llm::{CompletionResponse, StopReason, Usage};

    use crate::chat::offline::OFFLINE_GREETING;
    use crate::store::memory::MemoryDocumentStore;

    /// Replies "echo: <last message>" and records every request.
    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingProvider {
        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<parley_types::llm::CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: format!("echo: {last}"),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }
    }

    struct FailingProvider;

    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::QuotaExceeded("no credits".to_string()))
        }
    }

    /// A store whose every operation fails, as if the database vanished.
    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn backend(&self) -> &str {
            "broken"
        }

        async fn find_one(&self, _filter: &Filter) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn insert_one(&self, _document: Document) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn update_one(&self, _filter: &Filter, _update: &Update) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn delete_one(&self, _filter: &Filter) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn fetch(&self, _query: &FindQuery) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    fn service() -> SessionService<MemoryDocumentStore, RecordingProvider> {
        SessionService::new(
            MemoryDocumentStore::new(),
            RecordingProvider::default(),
            ChatSettings::default(),
        )
    }

    fn offline_service() -> SessionService<MemoryDocumentStore, FailingProvider> {
        SessionService::new(MemoryDocumentStore::new(), FailingProvider, ChatSettings::default())
    }

    #[tokio::test]
    async fn test_get_or_create_without_id_seeds_system_turn() {
        let svc = service();
        let session = svc.get_or_create(None).await;

        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::System);
        assert_eq!(session.messages[0].content, "You are a helpful chatbot.");
        assert!(!session.is_pinned);
        assert!(!session.is_archived);
        assert_eq!(session.title, DEFAULT_TITLE);
        assert_eq!(svc.store().len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_with_empty_or_unknown_id_creates() {
        let svc = service();
        let a = svc.get_or_create(Some("")).await;
        let b = svc.get_or_create(Some("does-not-exist")).await;

        assert_ne!(b.session_id, "does-not-exist");
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(svc.store().len(), 2);
    }

    #[tokio::test]
    async fn test_get_or_create_resolves_existing() {
        let svc = service();
        let created = svc.create_session().await;
        let resolved = svc.get_or_create(Some(&created.session_id)).await;

        assert_eq!(resolved.session_id, created.session_id);
        assert_eq!(svc.store().len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_survives_broken_store() {
        let svc = SessionService::new(BrokenStore, FailingProvider, ChatSettings::default());
        let session = svc.get_or_create(Some("whatever")).await;

        assert!(uuid::Uuid::parse_str(&session.session_id).is_ok());
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_long_first_message_sets_truncated_title() {
        let svc = service();
        let session = svc.create_session().await;
        svc.append_turns(
            &session.session_id,
            &[Message::user("Hello world, this is a long test message")],
        )
        .await
        .unwrap();

        let stored = svc.get_session(&session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Hello world, this is a long te...");
    }

    #[tokio::test]
    async fn test_short_first_message_is_title_and_derived_once() {
        let svc = service();
        let session = svc.create_session().await;
        let id = session.session_id.as_str();

        svc.append_turns(id, &[Message::user("Short question")]).await.unwrap();
        svc.append_turns(id, &[Message::assistant("answer")]).await.unwrap();
        svc.append_turns(id, &[Message::user("A different second message")])
            .await
            .unwrap();

        let stored = svc.get_session(id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Short question");
        assert_eq!(stored.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_append_turns_refreshes_updated_at() {
        let svc = service();
        let session = svc.create_session().await;
        let before = svc.get_session(&session.session_id).await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        svc.append_turns(&session.session_id, &[Message::assistant("x")])
            .await
            .unwrap();

        let after = svc.get_session(&session.session_id).await.unwrap().unwrap();
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_is_noop() {
        let svc = service();
        let existed = svc
            .append_turns("missing", &[Message::user("hi")])
            .await
            .unwrap();
        assert!(!existed);
        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn test_history_round_trip_preserves_order() {
        let svc = service();
        let session = svc.create_session().await;
        let turns = vec![
            Message::user("first"),
            Message::assistant("second"),
            Message::user("third  with  spaces\n"),
            Message::assistant("fourth"),
        ];
        svc.append_turns(&session.session_id, &turns[..2]).await.unwrap();
        svc.append_turns(&session.session_id, &turns[2..]).await.unwrap();

        let history = svc.history(&session.session_id).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(&history[1..], turns.as_slice());
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_is_not_found() {
        let svc = service();
        assert_eq!(svc.history("nope").await.unwrap_err(), SessionError::NotFound);
    }

    #[tokio::test]
    async fn test_run_turn_sends_full_history_and_persists_reply() {
        let svc = service();
        let first = svc.run_turn(None, "hello").await;
        assert_eq!(first.reply, "echo: hello");
        assert_eq!(first.outcome, ReplyOutcome::Generated);

        let second = svc.run_turn(Some(&first.session_id), "again").await;
        assert_eq!(second.session_id, first.session_id);

        let requests = svc.provider().requests();
        assert_eq!(requests.len(), 2);
        let roles: Vec<MessageRole> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(requests[1].model, "gpt-4o-mini");

        let history = svc.history(&first.session_id).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[4], Message::assistant("echo: again"));
    }

    #[tokio::test]
    async fn test_run_turn_with_failing_backend_persists_offline_reply() {
        let svc = offline_service();
        let result = svc.run_turn(Some(""), "hi").await;

        assert!(!result.reply.is_empty());
        assert_eq!(result.reply, OFFLINE_GREETING);
        assert!(result.outcome.is_offline());
        assert!(uuid::Uuid::parse_str(&result.session_id).is_ok());

        let history = svc.history(&result.session_id).await.unwrap();
        let n = history.len();
        assert_eq!(history[n - 2], Message::user("hi"));
        assert_eq!(history[n - 1], Message::assistant(OFFLINE_GREETING));
    }

    #[tokio::test]
    async fn test_run_turn_with_broken_store_still_replies() {
        let svc = SessionService::new(BrokenStore, RecordingProvider::default(), ChatSettings::default());
        let result = svc.run_turn(None, "anyone there?").await;

        assert_eq!(result.reply, "echo: anyone there?");
        assert_eq!(svc.provider().requests()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_pin_and_archive() {
        let svc = service();
        let session = svc.create_session().await;
        let id = session.session_id.as_str();

        assert!(svc.toggle_pin(id).await.unwrap());
        assert!(!svc.toggle_pin(id).await.unwrap());
        assert!(svc.toggle_archive(id).await.unwrap());

        let stored = svc.get_session(id).await.unwrap().unwrap();
        assert!(!stored.is_pinned);
        assert!(stored.is_archived);
    }

    #[tokio::test]
    async fn test_toggle_unknown_session_is_not_found() {
        let svc = service();
        assert_eq!(svc.toggle_pin("nope").await.unwrap_err(), SessionError::NotFound);
        assert_eq!(svc.toggle_archive("nope").await.unwrap_err(), SessionError::NotFound);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let svc = service();
        let session = svc.create_session().await;

        assert!(svc.delete(&session.session_id).await.is_ok());
        assert!(svc.delete(&session.session_id).await.is_ok());
        assert!(svc.delete("never-existed").await.is_ok());
        assert!(svc.get_session(&session.session_id).await.unwrap().is_none());
    }

    async fn insert_session(
        svc: &SessionService<MemoryDocumentStore, RecordingProvider>,
        title: &str,
        minutes: i64,
        pinned: bool,
        archived: bool,
    ) -> String {
        let mut session = Session::new("persona");
        session.title = title.to_string();
        session.updated_at = session.created_at + Duration::minutes(minutes);
        session.is_pinned = pinned;
        session.is_archived = archived;
        let id = session.session_id.clone();
        svc.store()
            .insert_one(session.to_document().unwrap())
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_sidebar_partition() {
        let svc = service();
        let plain = insert_session(&svc, "plain", 1, false, false).await;
        let pinned = insert_session(&svc, "pinned", 2, true, false).await;
        let both = insert_session(&svc, "both", 3, true, true).await;
        let archived = insert_session(&svc, "archived", 4, false, true).await;

        let sidebar = svc.sidebar().await.unwrap();
        let ids = |list: &[SessionSummary]| -> Vec<String> {
            list.iter().map(|s| s.session_id.clone()).collect()
        };

        assert_eq!(ids(&sidebar.recent), vec![plain]);
        assert_eq!(ids(&sidebar.pinned), vec![both.clone(), pinned]);
        assert_eq!(ids(&sidebar.archived), vec![archived, both]);
    }

    #[tokio::test]
    async fn test_sidebar_recent_capped_and_newest_first() {
        let svc = service();
        for i in 0..20 {
            insert_session(&svc, &format!("chat {i}"), i, false, false).await;
        }

        let sidebar = svc.sidebar().await.unwrap();
        assert_eq!(sidebar.recent.len(), 15);
        assert_eq!(sidebar.recent[0].title, "chat 19");
        assert_eq!(sidebar.recent[14].title, "chat 5");
        assert!(sidebar.pinned.is_empty());
        assert!(sidebar.archived.is_empty());
    }

    #[tokio::test]
    async fn test_sidebar_propagates_store_failure() {
        let svc = SessionService::new(BrokenStore, FailingProvider, ChatSettings::default());
        assert!(matches!(
            svc.sidebar().await.unwrap_err(),
            SessionError::Store(StoreError::Unavailable)
        ));
    }
}
