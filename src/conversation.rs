//! Client-side conversation state: history, single-flight sending, widget modes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Compact,
    Expanded,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Compact => DisplayMode::Expanded,
            DisplayMode::Expanded => DisplayMode::Compact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub is_open: bool,
    pub display_mode: DisplayMode,
    pub is_loading: bool,
    pub draft_input: String,
}

/// Anything that can turn a user message into an assistant reply.
///
/// Implementations never fail: errors come back as reply text.
pub trait ReplySource {
    fn reply(&self, message: &str) -> impl Future<Output = String> + Send;
}

pub fn greeting(subject: &str) -> String {
    format!(
        "Hi! I'm {0} AI. Ask me about {0}'s background, skills, projects, or how to contact them.",
        subject
    )
}

pub fn cleared_greeting(subject: &str) -> String {
    format!("Chat cleared. Ask me anything about {}.", subject)
}

pub fn suggestions(subject: &str) -> Vec<String> {
    vec![
        format!("Tell me about {}", subject),
        "What skills do they have?".to_string(),
        "What roles are they looking for?".to_string(),
        "Show projects".to_string(),
        "How can I contact them?".to_string(),
    ]
}

/// Handle to one widget's conversation. Clones share the same state.
///
/// The lock is only held for short synchronous updates, never across the
/// network wait, so the widget can be closed or resized while a reply is
/// pending.
#[derive(Debug, Clone)]
pub struct Conversation {
    subject: Arc<str>,
    state: Arc<Mutex<ConversationState>>,
}

impl Conversation {
    pub fn new(subject: &str) -> Self {
        let state = ConversationState {
            messages: vec![Message::assistant(greeting(subject))],
            is_open: false,
            display_mode: DisplayMode::Compact,
            is_loading: false,
            draft_input: String::new(),
        };
        Self {
            subject: Arc::from(subject),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn snapshot(&self) -> ConversationState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    /// Opening always starts compact.
    pub fn open(&self) {
        let mut state = self.lock();
        if !state.is_open {
            state.is_open = true;
            state.display_mode = DisplayMode::Compact;
        }
    }

    pub fn close(&self) {
        self.lock().is_open = false;
    }

    /// Allowed while a reply is pending. Ignored while closed.
    pub fn toggle_size(&self) -> DisplayMode {
        let mut state = self.lock();
        if state.is_open {
            state.display_mode = state.display_mode.toggled();
        }
        state.display_mode
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().draft_input = text.into();
    }

    /// Resets history to a single greeting. Refused while a reply is pending.
    pub fn clear(&self) -> bool {
        let mut state = self.lock();
        if state.is_loading {
            debug!("Ignoring clear while a reply is pending");
            return false;
        }
        state.messages = vec![Message::assistant(cleared_greeting(&self.subject))];
        true
    }

    /// Sends `text` and waits for the reply. Returns `false` when the send was
    /// ignored: blank text, widget closed, or another send in flight.
    pub async fn send<S: ReplySource>(&self, source: &S, text: &str) -> bool {
        let text = text.trim();
        let Some(turn) = self.begin_turn(text) else {
            return false;
        };
        let reply = source.reply(text).await;
        turn.finish(reply);
        true
    }

    pub async fn send_draft<S: ReplySource>(&self, source: &S) -> bool {
        let draft = self.lock().draft_input.clone();
        self.send(source, &draft).await
    }

    /// Sends one of [`suggestions`] by index.
    pub async fn send_suggestion<S: ReplySource>(&self, source: &S, index: usize) -> bool {
        match suggestions(&self.subject).get(index) {
            Some(suggestion) => self.send(source, suggestion).await,
            None => false,
        }
    }

    fn begin_turn(&self, text: &str) -> Option<InFlight> {
        if text.is_empty() {
            return None;
        }
        let mut state = self.lock();
        if state.is_loading || !state.is_open {
            debug!(loading = state.is_loading, open = state.is_open, "Ignoring send");
            return None;
        }
        state.messages.push(Message::user(text));
        state.draft_input.clear();
        state.is_loading = true;
        Some(InFlight {
            state: Arc::clone(&self.state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<ConversationState>) -> MutexGuard<'_, ConversationState> {
    // State stays consistent between statements, so a poisoned lock is still usable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held for the duration of one send. Dropping it clears `is_loading`,
/// whether the turn finished or the send future was cancelled.
struct InFlight {
    state: Arc<Mutex<ConversationState>>,
}

impl InFlight {
    fn finish(self, reply: String) {
        lock_state(&self.state).messages.push(Message::assistant(reply));
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock_state(&self.state).is_loading = false;
    }
}
