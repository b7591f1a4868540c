//! Builds the grounded prompt sent to the model.

use crate::constants::MAX_QUESTION_CHARS;
use crate::profile::Profile;

/// What the model must say when the profile has no answer.
pub const NO_INFO_ANSWER: &str = "I don’t have that information yet.";

pub const PRIVACY_RULES: [&str; 4] = [
    "Only answer using the PROFILE JSON.",
    "Do not invent facts. If not in profile, say: \"I don’t have that information yet.\"",
    "Do not share sensitive/private info (passwords, API keys, exact address).",
    "Visa/employer: answer only what is in profile.",
];

/// Cuts a question to its first `MAX_QUESTION_CHARS` characters.
pub fn truncate_question(question: &str) -> &str {
    match question.char_indices().nth(MAX_QUESTION_CHARS) {
        Some((byte_idx, _)) => &question[..byte_idx],
        None => question,
    }
}

/// Composes the prompt for one question. Pure: same inputs, same prompt.
pub fn compose(profile: &Profile, question: &str) -> String {
    let rules = PRIVACY_RULES
        .iter()
        .map(|rule| format!("- {}", rule))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the personal website assistant for {name}.\n\
         Answer using ONLY the PROFILE JSON below.\n\
         If the answer is not in PROFILE, say: \"{no_info}\"\n\
         \n\
         Be concise, friendly, and structured. Use bullet points when helpful.\n\
         \n\
         PRIVACY RULES:\n\
         {rules}\n\
         \n\
         \n\
         PROFILE JSON:\n\
         {profile}\n\
         \n\
         USER QUESTION:\n\
         {question}",
        name = profile.name(),
        no_info = NO_INFO_ANSWER,
        rules = rules,
        profile = profile.rendered_json(),
        question = question,
    )
}
