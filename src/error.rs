use thiserror::Error;

/// Why a generation request produced no payload.
///
/// The `Display` text is what the user sees as the assistant's reply, so
/// every variant reads as a chat message rather than a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("The chat service is misconfigured (no API key). Please contact the site operator.")]
    MissingCredential,
    #[error("Gemini error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Gemini request timed out. Try again.")]
    Timeout,
    /// Detail is for logs only; the user gets a generic retry message.
    #[error("Server error. Please try again.")]
    Transport(String),
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Please type a question.")]
    EmptyQuestion,
}
