//! Grounded profile chat.
//!
//! Answers questions about a single profile document: the question and the
//! profile are composed into one prompt, sent to a hosted model under a
//! deadline, and the reply is flattened into display text. A client-side
//! [`conversation::Conversation`] drives the chat widget on top of that.

pub mod client;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod web_server;

pub use conversation::{Conversation, ConversationState, DisplayMode, Message, ReplySource, Role};
pub use error::{ChatError, GenerationError};
pub use profile::{Profile, ProfileDocument};
pub use provider::{GenerationRequest, GenerationResult, ProviderConfig};
pub use service::{ChatService, ConfigSource};
