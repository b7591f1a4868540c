// Settings shared by the chat service, loaded from the environment or fixed.

use std::env;
use std::time::Duration;

/// Environment variable holding the provider API key. Read on every request.
pub const API_KEY_VAR: &str = "GOOGLE_GENERATIVE_AI_API_KEY";
/// Environment variable selecting the model. Read on every request.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Low temperature keeps answers close to the profile.
pub const TEMPERATURE: f32 = 0.3;
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(12);
/// Questions longer than this are cut to the first `MAX_QUESTION_CHARS` characters.
pub const MAX_QUESTION_CHARS: usize = 2000;

pub const DEFAULT_PORT: u16 = 3000;

// Startup-scoped settings. Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    pub static ref PROVIDER_BASE_URL: String = env::var("GEMINI_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref PROFILE_PATH: String = env::var("PROFILE_PATH")
        .unwrap_or_else(|_| "data/profile.json".to_string());
}
