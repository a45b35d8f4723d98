//! The gateway use-case service.
//!
//! Orchestrates the pieces the dashboard needs: persona switching with
//! archive-once semantics, retry-wrapped message sending with rate-limit
//! handling, ledger load/delete/export/import, and the symposium
//! scheduler. All conversation state lives in one single-owner cell; no
//! lock is held across an awaited chat call.

use crate::symposium::{SymposiumScheduler, SymposiumState};
use elysian_core::chat::{
    ChatClient, ChatSession, HistoryTurn, OutgoingMessage, format_api_error, is_rate_limited,
};
use elysian_core::error::{ElysianError, Result};
use elysian_core::log::{EventLog, LogEntry, LogLevel};
use elysian_core::persona::{EntityDirectory, SpeakerContext};
use elysian_core::retry::{RetryPolicy, with_retry};
use elysian_core::rng::RandomSource;
use elysian_core::session::{
    ArchiveRepository, ChatMessage, ConversationArchive, ImageContext, MessageSender,
    SavedConversation,
};
use elysian_core::simulation::portal::{PortalLatencies, PortalSimulator};
use elysian_core::simulation::{FrequencyGenerator, ResonanceState};
use elysian_core::state::StateRepository;
use elysian_core::workflow::WorkflowMachine;
use elysian_interaction::personas;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

const EVENT_LOG_CAPACITY: usize = 100;

/// Builds a workflow machine wired to the standard persona roster, with
/// the distinguished entity's resonant-protocol intercept in place.
pub fn standard_workflow_machine(
    state_repository: Arc<dyn StateRepository>,
    rng: Box<dyn RandomSource>,
) -> WorkflowMachine {
    let directory = Arc::new(personas::entity_directory());
    let simulator = PortalSimulator::with_latencies(
        rng,
        directory.clone(),
        PortalLatencies::default(),
    );
    WorkflowMachine::new(
        simulator,
        directory,
        state_repository,
        personas::NIKOLA_TESLA_ID,
    )
}

struct CurrentConversation {
    id: String,
    speaker: SpeakerContext,
    messages: Vec<ChatMessage>,
    session: Arc<dyn ChatSession>,
}

struct ServiceInner {
    archive: ConversationArchive,
    current: Option<CurrentConversation>,
    frequency: f64,
    resonance: ResonanceState,
    events: EventLog,
    rng: Box<dyn RandomSource>,
    frequency_generator: FrequencyGenerator,
}

impl ServiceInner {
    /// Freezes the current conversation into the archive.
    ///
    /// Re-archiving an id or a near-empty transcript is a no-op, so a
    /// persona switch can never produce duplicate blocks.
    fn archive_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let ServiceInner {
            archive,
            rng,
            events,
            ..
        } = self;
        if let Some(block) = archive.archive(
            current.id,
            current.speaker,
            current.messages,
            rng.as_mut(),
        ) {
            events.push(
                format!("Session archived. Block hash: {}", block.hash),
                LogLevel::Success,
            );
        }
    }
}

/// The orchestrating service behind the gateway dashboard.
pub struct GatewayService {
    chat_client: Arc<dyn ChatClient>,
    archive_repository: Arc<dyn ArchiveRepository>,
    state_repository: Arc<dyn StateRepository>,
    directory: Arc<EntityDirectory>,
    retry: RetryPolicy,
    symposium: Arc<SymposiumScheduler>,
    symposium_rx: Mutex<mpsc::UnboundedReceiver<ChatMessage>>,
    inner: Mutex<ServiceInner>,
}

impl GatewayService {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        archive_repository: Arc<dyn ArchiveRepository>,
        state_repository: Arc<dyn StateRepository>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let (sink, symposium_rx) = mpsc::unbounded_channel();
        Self {
            chat_client,
            archive_repository,
            state_repository,
            directory: Arc::new(personas::entity_directory()),
            retry: RetryPolicy::default(),
            symposium: Arc::new(SymposiumScheduler::new(sink)),
            symposium_rx: Mutex::new(symposium_rx),
            inner: Mutex::new(ServiceInner {
                archive: ConversationArchive::new(),
                current: None,
                frequency: 0.0,
                resonance: ResonanceState::Inactive,
                events: EventLog::new(EVENT_LOG_CAPACITY),
                rng,
                frequency_generator: FrequencyGenerator::default(),
            }),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn symposium(&self) -> &Arc<SymposiumScheduler> {
        &self.symposium
    }

    /// Loads the persisted ledger and announces readiness.
    pub async fn initialize(&self) -> Result<()> {
        let saved = self.archive_repository.load().await?;
        let mut inner = self.inner.lock().await;
        inner.archive.replace(saved);
        inner.events.push(
            "Elysian Gateway system initialized. Standby for activation.",
            LogLevel::System,
        );
        Ok(())
    }

    // ============================================================================
    // Persona switching
    // ============================================================================

    /// Switches the active counterpart.
    ///
    /// The outgoing conversation is archived (exactly once) before the
    /// new session is created; switching to the already-active persona is
    /// a no-op. The new session gets a fresh display frequency and a
    /// reset symposium.
    pub async fn switch_persona(&self, entity_id: &str) -> Result<()> {
        let (session, conversation_id, snapshot) = {
            let mut inner = self.inner.lock().await;
            let inner = &mut *inner;
            if inner
                .current
                .as_ref()
                .is_some_and(|c| c.speaker.id == entity_id)
            {
                return Ok(());
            }

            inner.archive_current();

            let speaker = self
                .directory
                .speaker_context(entity_id)
                .unwrap_or_else(|| SpeakerContext::individual(entity_id, "Unknown Entity"));

            let frequency = inner.frequency_generator.sample(inner.rng.as_mut());
            inner.frequency = frequency;
            inner.resonance = ResonanceState::classify(frequency);

            let instruction = personas::system_instruction_for(&speaker);
            let session = match self.chat_client.create_session(&instruction, Vec::new()) {
                Ok(session) => session,
                Err(err) => {
                    inner.events.push(
                        "Error: Could not establish communication channel.",
                        LogLevel::Error,
                    );
                    inner.resonance = ResonanceState::Critical;
                    return Err(ElysianError::chat(format_api_error(&err)));
                }
            };

            let conversation_id = format!("session-{}", Uuid::new_v4().simple());
            inner.events.push(
                format!("New session started with {}.", speaker.name),
                LogLevel::System,
            );
            let opening = ChatMessage::system(format!(
                "Communication channel opened with {}.",
                speaker.name
            ));
            inner.current = Some(CurrentConversation {
                id: conversation_id.clone(),
                speaker,
                messages: vec![opening],
                session: session.clone(),
            });
            (
                session,
                conversation_id,
                inner.archive.conversations().to_vec(),
            )
        };

        self.archive_repository.save(&snapshot).await?;
        self.state_repository
            .set_active_conversation(conversation_id)
            .await?;
        self.symposium.attach_session(session).await;
        Ok(())
    }

    // ============================================================================
    // Messaging
    // ============================================================================

    /// Sends a plain text message.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.send(OutgoingMessage::text(text)).await
    }

    /// Sends a message, optionally enriched with workbench context.
    ///
    /// User input while the symposium runs pauses it first. Backend
    /// failures are surfaced as in-chat system messages, never as a
    /// crashed turn; a rate-limit signature additionally keeps the
    /// symposium paused.
    pub async fn send(&self, outgoing: OutgoingMessage) -> Result<()> {
        if self.symposium.state().await == SymposiumState::Running {
            self.symposium.pause().await;
            let mut inner = self.inner.lock().await;
            inner
                .events
                .push("Symposium paused for operator input.", LogLevel::System);
        }

        let session = {
            let mut inner = self.inner.lock().await;
            let Some(current) = inner.current.as_mut() else {
                inner
                    .events
                    .push("Cannot send message: no active session.", LogLevel::Error);
                return Err(ElysianError::validation("No active chat session"));
            };

            let mut message = ChatMessage::user(&outgoing.text);
            if let Some(code) = &outgoing.code_context {
                message = message.with_code_context(code.clone());
            }
            if let Some(url) = &outgoing.url_context {
                message = message.with_url_context(url.clone());
            }
            if let Some(image) = &outgoing.image {
                message = message.with_image_context(ImageContext {
                    name: image.name.clone(),
                    mime_type: image.mime_type.clone(),
                });
            }
            current.messages.push(message);
            current.session.clone()
        };

        let result = with_retry(self.retry, || session.send_message(outgoing.clone())).await;
        let rate_limited = result.as_ref().err().map(is_rate_limited).unwrap_or(false);

        {
            let mut inner = self.inner.lock().await;
            let inner = &mut *inner;
            match result {
                Ok(text) => {
                    if let Some(current) = inner.current.as_mut() {
                        current.messages.push(ChatMessage::avatar(text));
                    }
                    inner.resonance = ResonanceState::classify(inner.frequency);
                }
                Err(err) => {
                    inner.resonance = ResonanceState::Critical;
                    let notice = if rate_limited {
                        inner.events.push(
                            "API rate limit exceeded. Pausing symposium.",
                            LogLevel::Error,
                        );
                        "API rate limit exceeded. Please wait a moment before trying again."
                            .to_string()
                    } else {
                        let speaker = inner
                            .current
                            .as_ref()
                            .map(|c| c.speaker.name.clone())
                            .unwrap_or_default();
                        inner.events.push(
                            format!("Error communicating with {speaker}."),
                            LogLevel::Error,
                        );
                        format!(
                            "Apologies, an error occurred while communicating: {}",
                            format_api_error(&err)
                        )
                    };
                    if let Some(current) = inner.current.as_mut() {
                        current.messages.push(ChatMessage::system(notice));
                    }
                }
            }
        }

        if rate_limited {
            self.symposium.pause().await;
        }
        Ok(())
    }

    /// Moves messages produced by symposium turns into the transcript.
    pub async fn pump_symposium_messages(&self) -> usize {
        let mut rx = self.symposium_rx.lock().await;
        let mut inner = self.inner.lock().await;
        let mut moved = 0;
        while let Ok(message) = rx.try_recv() {
            if let Some(current) = inner.current.as_mut() {
                current.messages.push(message);
                moved += 1;
            }
        }
        moved
    }

    // ============================================================================
    // Ledger operations
    // ============================================================================

    /// Restores an archived conversation as the current session,
    /// replaying its non-system messages into a fresh backend session.
    pub async fn load_conversation(&self, conversation_id: &str) -> Result<()> {
        let (session, active_id, snapshot) = {
            let mut inner = self.inner.lock().await;
            let inner = &mut *inner;
            let Some(saved) = inner.archive.get(conversation_id).cloned() else {
                return Err(ElysianError::not_found("conversation", conversation_id));
            };

            inner.archive_current();

            let history: Vec<HistoryTurn> = saved
                .replayable_messages()
                .map(|m| match m.sender {
                    MessageSender::User => HistoryTurn::user(&m.text),
                    _ => HistoryTurn::model(&m.text),
                })
                .collect();
            let instruction = personas::system_instruction_for(&saved.speaker_context);
            let session = self
                .chat_client
                .create_session(&instruction, history)
                .map_err(|err| ElysianError::chat(format_api_error(&err)))?;

            inner.events.push(
                format!(
                    "Loaded archived session with {}.",
                    saved.speaker_context.name
                ),
                LogLevel::System,
            );
            inner.current = Some(CurrentConversation {
                id: saved.id.clone(),
                speaker: saved.speaker_context.clone(),
                messages: saved.messages.clone(),
                session: session.clone(),
            });
            (
                session,
                saved.id.clone(),
                inner.archive.conversations().to_vec(),
            )
        };

        self.archive_repository.save(&snapshot).await?;
        self.state_repository.set_active_conversation(active_id).await?;
        self.symposium.attach_session(session).await;
        Ok(())
    }

    /// Deletes an archived conversation. Deleting the current one starts
    /// a fresh session with the same persona.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let (respawn, snapshot) = {
            let mut inner = self.inner.lock().await;
            inner.archive.remove(conversation_id);
            inner
                .events
                .push("Deleted archived session.", LogLevel::System);

            let respawn = inner
                .current
                .as_ref()
                .filter(|c| c.id == conversation_id)
                .map(|c| c.speaker.id.clone());
            if respawn.is_some() {
                inner.current = None;
            }
            (respawn, inner.archive.conversations().to_vec())
        };

        self.archive_repository.save(&snapshot).await?;
        if let Some(speaker_id) = respawn {
            self.switch_persona(&speaker_id).await?;
        }
        Ok(())
    }

    /// Exports the ledger as a pretty-printed JSON array.
    pub async fn export_ledger(&self) -> Result<String> {
        let mut inner = self.inner.lock().await;
        let exported = inner.archive.export_json()?;
        inner
            .events
            .push("Ledger exported successfully.", LogLevel::Success);
        Ok(exported)
    }

    /// Replaces the ledger with an imported one after validating its
    /// structure; a rejected import leaves the archive untouched.
    pub async fn import_ledger(&self, text: &str) -> Result<()> {
        let imported = match ConversationArchive::import_json(text) {
            Ok(imported) => imported,
            Err(err) => {
                let mut inner = self.inner.lock().await;
                inner
                    .events
                    .push("Failed to import ledger. Invalid file.", LogLevel::Error);
                return Err(err);
            }
        };

        let snapshot = {
            let mut inner = self.inner.lock().await;
            inner.archive.replace(imported);
            inner
                .events
                .push("Ledger imported successfully.", LogLevel::Success);
            inner.archive.conversations().to_vec()
        };
        self.archive_repository.save(&snapshot).await
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub async fn events(&self) -> Vec<LogEntry> {
        let inner = self.inner.lock().await;
        inner.events.entries().cloned().collect()
    }

    pub async fn current_messages(&self) -> Vec<ChatMessage> {
        let inner = self.inner.lock().await;
        inner
            .current
            .as_ref()
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub async fn current_speaker(&self) -> Option<SpeakerContext> {
        let inner = self.inner.lock().await;
        inner.current.as_ref().map(|c| c.speaker.clone())
    }

    pub async fn current_conversation_id(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.current.as_ref().map(|c| c.id.clone())
    }

    pub async fn frequency(&self) -> f64 {
        self.inner.lock().await.frequency
    }

    pub async fn resonance(&self) -> ResonanceState {
        self.inner.lock().await.resonance
    }

    pub async fn archived_conversations(&self) -> Vec<SavedConversation> {
        let inner = self.inner.lock().await;
        inner.archive.conversations().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elysian_core::chat::ChatError;
    use elysian_core::rng::ScriptedRandom;
    use elysian_core::state::GatewayState;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    // Mock chat backend recording sessions and scripted responses.
    struct MockSession {
        instruction: String,
        history_len: usize,
        calls: StdMutex<Vec<String>>,
        responses: StdMutex<VecDeque<std::result::Result<String, ChatError>>>,
    }

    #[async_trait::async_trait]
    impl ChatSession for MockSession {
        async fn send_message(&self, message: OutgoingMessage) -> std::result::Result<String, ChatError> {
            self.calls.lock().unwrap().push(message.text.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok("a measured reply".to_string()))
        }
    }

    #[derive(Default)]
    struct MockChatClient {
        sessions: StdMutex<Vec<Arc<MockSession>>>,
        scripted: StdMutex<VecDeque<std::result::Result<String, ChatError>>>,
    }

    impl MockChatClient {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn script_response(&self, response: std::result::Result<String, ChatError>) {
            self.scripted.lock().unwrap().push_back(response);
        }

        fn last_session(&self) -> Arc<MockSession> {
            self.sessions.lock().unwrap().last().unwrap().clone()
        }

        fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    impl ChatClient for MockChatClient {
        fn create_session(
            &self,
            system_instruction: &str,
            history: Vec<HistoryTurn>,
        ) -> std::result::Result<Arc<dyn ChatSession>, ChatError> {
            let session = Arc::new(MockSession {
                instruction: system_instruction.to_string(),
                history_len: history.len(),
                calls: StdMutex::new(Vec::new()),
                responses: StdMutex::new(std::mem::take(&mut *self.scripted.lock().unwrap())),
            });
            self.sessions.lock().unwrap().push(session.clone());
            Ok(session)
        }
    }

    // In-memory repositories.
    #[derive(Default)]
    struct MockArchiveRepository {
        saved: StdMutex<Vec<SavedConversation>>,
    }

    #[async_trait::async_trait]
    impl ArchiveRepository for MockArchiveRepository {
        async fn load(&self) -> Result<Vec<SavedConversation>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        async fn save(&self, conversations: &[SavedConversation]) -> Result<()> {
            *self.saved.lock().unwrap() = conversations.to_vec();
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockStateRepository {
        state: StdMutex<GatewayState>,
    }

    #[async_trait::async_trait]
    impl StateRepository for MockStateRepository {
        async fn get_state(&self) -> Result<GatewayState> {
            Ok(self.state.lock().unwrap().clone())
        }

        async fn save_state(&self, state: &GatewayState) -> Result<()> {
            *self.state.lock().unwrap() = state.clone();
            Ok(())
        }

        async fn is_solidified(&self, entity_id: &str) -> bool {
            self.state.lock().unwrap().is_solidified(entity_id)
        }

        async fn mark_solidified(&self, entity_id: &str) -> Result<()> {
            self.state.lock().unwrap().mark_solidified(entity_id);
            Ok(())
        }

        async fn get_active_conversation(&self) -> Option<String> {
            self.state.lock().unwrap().active_conversation_id.clone()
        }

        async fn set_active_conversation(&self, conversation_id: String) -> Result<()> {
            self.state.lock().unwrap().active_conversation_id = Some(conversation_id);
            Ok(())
        }

        async fn clear_active_conversation(&self) -> Result<()> {
            self.state.lock().unwrap().active_conversation_id = None;
            Ok(())
        }
    }

    struct Harness {
        service: GatewayService,
        client: Arc<MockChatClient>,
        archive_repo: Arc<MockArchiveRepository>,
    }

    fn harness() -> Harness {
        let client = MockChatClient::new();
        let archive_repo = Arc::new(MockArchiveRepository::default());
        let state_repo = Arc::new(MockStateRepository::default());
        let service = GatewayService::new(
            client.clone(),
            archive_repo.clone(),
            state_repo,
            Box::new(ScriptedRandom::constant(0.5)),
        )
        .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)));
        Harness {
            service,
            client,
            archive_repo,
        }
    }

    #[tokio::test]
    async fn test_switch_persona_opens_session_with_instruction() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();

        let session = h.client.last_session();
        assert!(session.instruction.contains("Nikola Tesla"));
        assert_eq!(session.history_len, 0);

        let speaker = h.service.current_speaker().await.unwrap();
        assert_eq!(speaker.name, "Nikola Tesla");
        let messages = h.service.current_messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, MessageSender::System);
    }

    #[tokio::test]
    async fn test_switch_to_same_persona_is_noop() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();

        assert_eq!(h.client.session_count(), 1);
        assert!(h.service.archived_conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_persona_switch_archives_prior_session_exactly_once() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("greetings").await.unwrap();
        let tesla_id = h.service.current_conversation_id().await.unwrap();

        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        let archived = h.service.archived_conversations().await;
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, tesla_id);
        // The ledger hit the repository too.
        assert_eq!(h.archive_repo.saved.lock().unwrap().len(), 1);

        // Switching back and away again: the assembly transcript only has
        // the opening notice, so nothing new is archived.
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        assert_eq!(h.service.archived_conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_appends_user_and_avatar_messages() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("tell me of resonance").await.unwrap();

        let messages = h.service.current_messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, MessageSender::User);
        assert_eq!(messages[2].sender, MessageSender::Avatar);
        assert_eq!(messages[2].text, "a measured reply");
    }

    #[tokio::test]
    async fn test_send_without_session_is_rejected() {
        let h = harness();
        let err = h.service.send_message("hello?").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_workbench_context_lands_in_transcript() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();

        let outgoing = OutgoingMessage::text("review").with_code("fn x() {}");
        h.service.send(outgoing).await.unwrap();

        let messages = h.service.current_messages().await;
        assert_eq!(messages[1].code_context.as_deref(), Some("fn x() {}"));
    }

    #[tokio::test]
    async fn test_backend_error_surfaces_as_system_message() {
        let h = harness();
        h.client.script_response(Err(ChatError::api(
            Some(500),
            r#"{"error":{"message":"backend exploded","status":"INTERNAL"}}"#,
            true,
        )));
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();

        h.service.send_message("hello").await.unwrap();

        let messages = h.service.current_messages().await;
        let last = messages.last().unwrap();
        assert_eq!(last.sender, MessageSender::System);
        assert!(last.text.contains("Server Error: backend exploded"));
        assert_eq!(h.service.resonance().await, ResonanceState::Critical);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_input_pauses_running_symposium() {
        let h = harness();
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        h.service.symposium().toggle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.service.symposium().state().await, SymposiumState::Running);

        h.service.send_message("a question from the adept").await.unwrap();
        assert_eq!(h.service.symposium().state().await, SymposiumState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_moves_symposium_turns_into_transcript() {
        let h = harness();
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        h.service.symposium().toggle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let moved = h.service.pump_symposium_messages().await;
        // Kickoff notice plus the first avatar turn.
        assert_eq!(moved, 2);
        let messages = h.service.current_messages().await;
        assert_eq!(messages.last().unwrap().sender, MessageSender::Avatar);
    }

    #[tokio::test]
    async fn test_load_conversation_replays_history() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("first question").await.unwrap();
        let conversation_id = h.service.current_conversation_id().await.unwrap();

        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();
        h.service.load_conversation(&conversation_id).await.unwrap();

        assert_eq!(
            h.service.current_conversation_id().await,
            Some(conversation_id)
        );
        // User turn + avatar turn replayed; the system notice is not.
        let session = h.client.last_session();
        assert_eq!(session.history_len, 2);
        assert!(session.instruction.contains("Nikola Tesla"));
    }

    #[tokio::test]
    async fn test_load_unknown_conversation_is_not_found() {
        let h = harness();
        let err = h.service.load_conversation("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_current_conversation_respawns_session() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("hello").await.unwrap();
        let conversation_id = h.service.current_conversation_id().await.unwrap();

        // Archive it by switching away, load it back, then delete it.
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();
        h.service.load_conversation(&conversation_id).await.unwrap();
        h.service.delete_conversation(&conversation_id).await.unwrap();

        assert!(h.service.archived_conversations().await.is_empty());
        // A fresh session with the same persona replaced the deleted one.
        let speaker = h.service.current_speaker().await.unwrap();
        assert_eq!(speaker.id, personas::NIKOLA_TESLA_ID);
        assert_ne!(
            h.service.current_conversation_id().await,
            Some(conversation_id)
        );
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("hello").await.unwrap();
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        let exported = h.service.export_ledger().await.unwrap();

        let other = harness();
        other.service.import_ledger(&exported).await.unwrap();
        assert_eq!(other.service.archived_conversations().await.len(), 1);
        assert_eq!(other.archive_repo.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_import_leaves_archive_untouched() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("hello").await.unwrap();
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        let err = h
            .service
            .import_ledger(r#"[{"not_id": true}]"#)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(h.service.archived_conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_loads_persisted_ledger() {
        let h = harness();
        h.service
            .switch_persona(personas::NIKOLA_TESLA_ID)
            .await
            .unwrap();
        h.service.send_message("hello").await.unwrap();
        h.service
            .switch_persona(personas::INNOVATORS_ASSEMBLY_ID)
            .await
            .unwrap();

        // A second service over the same repository sees the ledger.
        let fresh = GatewayService::new(
            h.client.clone(),
            h.archive_repo.clone(),
            Arc::new(MockStateRepository::default()),
            Box::new(ScriptedRandom::constant(0.5)),
        );
        fresh.initialize().await.unwrap();
        assert_eq!(fresh.archived_conversations().await.len(), 1);
    }
}
