//! Active-conversation state and the send/regenerate protocol.
//!
//! The session owns the authoritative in-memory message log for the
//! conversation on screen. Methods take `&self`; state sits behind a mutex
//! that is never held across an await, so the completion call suspends
//! without blocking event handling. At most one completion request is in
//! flight per session; a second send or regenerate is rejected.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::completion::CompletionClient;
use crate::core::error::{CompletionError, SessionError};
use crate::core::message::{derive_title, ConversationId, Message, Sender};
use crate::events::{Event, EventBus};
use crate::storage::ConversationStore;

/// Placeholder text shown while a first reply is fetched.
pub const THINKING_PLACEHOLDER: &str = "Thinking…";
/// Placeholder text shown while a reply is regenerated.
pub const RETHINKING_PLACEHOLDER: &str = "Rethinking…";
/// Fixed text left in the log when a send fails.
pub const SEND_ERROR_TEXT: &str = "Error: Unable to fetch response. Please try again.";
/// Fixed text left in the log when a regenerate fails.
pub const REGENERATE_ERROR_TEXT: &str = "Error: Unable to regenerate response. Please try again.";

struct SessionState {
    conversation_id: Option<ConversationId>,
    messages: Vec<Message>,
    started: bool,
    in_flight: bool,
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            conversation_id: None,
            messages: Vec::new(),
            started: false,
            in_flight: false,
            generation: 0,
        }
    }
}

/// Ticket for one in-flight completion, captured before the await point.
/// Resolution only applies while the session still matches the ticket;
/// new-chat and selection both bump the generation, so a reply landing
/// after navigation is discarded instead of corrupting the loaded log.
#[derive(Debug, Clone, Copy)]
struct RequestTicket {
    index: usize,
    conversation_id: ConversationId,
    generation: u64,
}

pub struct ChatSession {
    state: Mutex<SessionState>,
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn ConversationStore>,
    bus: EventBus,
}

impl ChatSession {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn ConversationStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            client,
            store,
            bus,
        }
    }

    /// Append a user message, an optimistic assistant placeholder, and fetch
    /// the reply. On the session's first message this mints a conversation
    /// id, freezes the title and announces the conversation on the bus.
    ///
    /// Whitespace-only text is rejected without any state change, as is a
    /// send while another request is in flight. A completion failure is not
    /// an error here: it becomes an error-status message in the log.
    pub async fn send_message(&self, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (ticket, prompt) = {
            let mut state = self.state.lock().await;
            if state.in_flight {
                return Err(SessionError::RequestInFlight);
            }

            let id = match state.conversation_id {
                Some(id) => id,
                None => {
                    let id = ConversationId::mint();
                    let title = derive_title(text);
                    state.conversation_id = Some(id);
                    state.started = true;
                    tracing::info!(
                        "[ChatSession] Created conversation '{}' titled '{}'",
                        id,
                        title
                    );
                    self.bus.publish(Event::ConversationCreated { id, title });
                    id
                }
            };

            state.messages.push(Message::user(text));
            self.publish_log(&state);

            state.messages.push(Message::pending(THINKING_PLACEHOLDER));
            let index = state.messages.len() - 1;
            self.publish_log(&state);

            // The prompt reflects the log as it stands, pending placeholder
            // included.
            let prompt = joined_prompt(&state.messages);
            state.in_flight = true;

            (
                RequestTicket {
                    index,
                    conversation_id: id,
                    generation: state.generation,
                },
                prompt,
            )
        };

        let result = self.client.complete(&prompt).await;
        self.resolve(ticket, result, SEND_ERROR_TEXT).await;
        Ok(())
    }

    /// Replace the last assistant message with a fresh completion built from
    /// everything before it. Silently does nothing when the log holds no
    /// assistant message.
    pub async fn regenerate(&self) -> Result<(), SessionError> {
        let (ticket, prompt) = {
            let mut state = self.state.lock().await;
            if state.in_flight {
                return Err(SessionError::RequestInFlight);
            }

            let index = match state
                .messages
                .iter()
                .rposition(|message| message.sender == Sender::Assistant)
            {
                Some(index) => index,
                None => return Ok(()),
            };
            let id = match state.conversation_id {
                Some(id) => id,
                None => return Ok(()),
            };

            state.messages[index] = Message::pending(RETHINKING_PLACEHOLDER);
            self.publish_log(&state);

            let prompt = joined_prompt(&state.messages[..index]);
            state.in_flight = true;

            (
                RequestTicket {
                    index,
                    conversation_id: id,
                    generation: state.generation,
                },
                prompt,
            )
        };

        let result = self.client.complete(&prompt).await;
        self.resolve(ticket, result, REGENERATE_ERROR_TEXT).await;
        Ok(())
    }

    /// React to bus traffic: new-chat resets, selections load from storage.
    pub async fn handle_event(&self, event: Event) {
        match event {
            Event::NewChatRequested => self.reset().await,
            Event::ConversationSelected { id } => self.load_conversation(id).await,
            Event::ConversationCreated { .. } | Event::LogChanged { .. } => {}
        }
    }

    /// Return to the empty, unstarted state. An in-flight request is not
    /// cancelled; its resolution no longer matches this generation and is
    /// discarded on arrival.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = SessionState::new();
        state.generation = generation;
        tracing::info!("[ChatSession] Reset to an empty session");
    }

    async fn load_conversation(&self, id: ConversationId) {
        let record = match self.store.load(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("[ChatSession] Ignoring select for unknown conversation '{}'", id);
                return;
            }
            Err(err) => {
                tracing::warn!("[ChatSession] Failed to load conversation '{}': {:#}", id, err);
                return;
            }
        };

        let mut state = self.state.lock().await;
        state.conversation_id = Some(record.id);
        state.messages = record.messages;
        state.started = true;
        state.in_flight = false;
        state.generation += 1;
        tracing::info!(
            "[ChatSession] Loaded conversation '{}' with {} messages",
            record.id,
            state.messages.len()
        );
    }

    async fn resolve(
        &self,
        ticket: RequestTicket,
        result: Result<String, CompletionError>,
        error_text: &str,
    ) {
        let mut state = self.state.lock().await;
        if state.generation != ticket.generation
            || state.conversation_id != Some(ticket.conversation_id)
        {
            tracing::info!(
                "[ChatSession] Discarding late completion for conversation '{}'",
                ticket.conversation_id
            );
            return;
        }

        state.in_flight = false;
        state.messages[ticket.index] = match result {
            Ok(reply) => Message::assistant(reply),
            Err(err) => {
                tracing::warn!("[ChatSession] Completion failed: {}", err);
                Message::error(error_text)
            }
        };
        self.publish_log(&state);
    }

    // Nothing to persist before the first message mints an id.
    fn publish_log(&self, state: &SessionState) {
        if let Some(id) = state.conversation_id {
            self.bus.publish(Event::LogChanged {
                id,
                messages: state.messages.clone(),
            });
        }
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn conversation_id(&self) -> Option<ConversationId> {
        self.state.lock().await.conversation_id
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.started
    }

    pub async fn is_idle(&self) -> bool {
        !self.state.lock().await.in_flight
    }
}

fn joined_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| message.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
