//! Turns provider payloads and failures into the text shown to the user.

use serde::Deserialize;
use tracing::debug;

use crate::provider::GenerationResult;

/// Shown instead of an empty reply.
pub const NO_TEXT_FALLBACK: &str = "Gemini returned no text. Try a different model name.";

// Only the fields we read; everything else in the payload is ignored.
#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize, Debug, Default)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

/// Joins the text parts of the first candidate, or returns [`NO_TEXT_FALLBACK`].
pub fn extract(payload: &serde_json::Value) -> String {
    // A payload of the wrong shape counts as "no text", same as zero candidates.
    let response = GenerateContentResponse::deserialize(payload).unwrap_or_default();

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        debug!("Provider payload carried no usable text");
        NO_TEXT_FALLBACK.to_string()
    } else {
        text.to_string()
    }
}

/// The assistant reply for any outcome: extracted text, or the failure's wording.
pub fn reply_for(result: &GenerationResult) -> String {
    match result {
        Ok(payload) => extract(payload),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use serde_json::json;

    #[test]
    fn test_extract_single_part() {
        let payload = json!({"candidates":[{"content":{"parts":[{"text":"- SQL\n- AWS"}]}}]});
        assert_eq!(extract(&payload), "- SQL\n- AWS");
    }

    #[test]
    fn test_extract_joins_parts_and_trims() {
        let payload = json!({"candidates":[{"content":{"parts":[
            {"text":"  First line"},
            {"inlineData":{"mimeType":"image/png"}},
            {"text":""},
            {"text":"Second line \n"}
        ]}}]});
        assert_eq!(extract(&payload), "First line\nSecond line");
    }

    #[test]
    fn test_extract_uses_only_first_candidate() {
        let payload = json!({"candidates":[
            {"content":{"parts":[{"text":"one"}]}},
            {"content":{"parts":[{"text":"two"}]}}
        ]});
        assert_eq!(extract(&payload), "one");
    }

    #[test]
    fn test_extract_fallbacks() {
        let cases = [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
            json!({"candidates": [{"content": {"parts": [{"text": "   "}, {"text": "\n"}]}}]}),
            json!({"candidates": "not a list"}),
            json!("just a string"),
        ];
        for payload in cases {
            assert_eq!(extract(&payload), NO_TEXT_FALLBACK, "payload: {}", payload);
        }
    }

    #[test]
    fn test_reply_for_errors() {
        let provider = Err(GenerationError::Provider {
            status: 429,
            message: "quota exceeded".into(),
        });
        let reply = reply_for(&provider);
        assert!(reply.contains("429"));
        assert!(reply.contains("quota exceeded"));

        assert!(reply_for(&Err(GenerationError::Timeout)).contains("timed out"));
        assert_eq!(
            reply_for(&Err(GenerationError::Transport("connection reset".into()))),
            "Server error. Please try again."
        );
        assert!(reply_for(&Err(GenerationError::MissingCredential)).contains("misconfigured"));
    }
}
