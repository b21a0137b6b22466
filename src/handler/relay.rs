//! Prompt relay module
//!
//! Validates the inbound generation request, makes exactly one provider
//! call, and maps the outcome to an HTTP response. Provider failure detail
//! never leaks into the response body.

use crate::config::AppState;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::sync::Arc;

/// Error payload for a missing or invalid prompt
pub const PROMPT_REQUIRED: &str = "Prompt is required.";

/// Error payload for any provider failure
pub const GENERATION_FAILED: &str = "Failed to generate content from AI.";

/// Handle `POST /api/generate`
///
/// Validation failures answer 400 without touching the provider; a valid
/// prompt makes one `generate()` call and answers 200 with the text or a
/// generic 500 on failure.
pub async fn handle_generate<B>(req: hyper::Request<B>, state: &Arc<AppState>) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_json_error(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    let Some(prompt) = extract_prompt(&body) else {
        return http::build_json_error(StatusCode::BAD_REQUEST, PROMPT_REQUIRED);
    };

    match state.generator.generate(&prompt).await {
        Ok(text) => http::build_json_response(StatusCode::OK, &serde_json::json!({ "text": text })),
        Err(e) => {
            logger::log_provider_failure(&e);
            http::build_json_error(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED)
        }
    }
}

/// Extract a usable prompt from the request body
///
/// The `prompt` field must be a string with non-whitespace content; any
/// other shape (absent field, wrong type, unparseable JSON) is a
/// validation error, not a provider call.
fn extract_prompt(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let prompt = value.get("prompt")?.as_str()?;
    if prompt.trim().is_empty() {
        return None;
    }
    Some(prompt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_valid_prompt() {
        assert_eq!(
            extract_prompt(br#"{"prompt":"write a haiku"}"#).as_deref(),
            Some("write a haiku")
        );
    }

    #[test]
    fn test_extract_rejects_missing_prompt() {
        assert!(extract_prompt(br#"{}"#).is_none());
        assert!(extract_prompt(br#"{"other":"field"}"#).is_none());
    }

    #[test]
    fn test_extract_rejects_empty_and_whitespace() {
        assert!(extract_prompt(br#"{"prompt":""}"#).is_none());
        assert!(extract_prompt(br#"{"prompt":"   \n\t"}"#).is_none());
    }

    #[test]
    fn test_extract_rejects_wrong_type() {
        assert!(extract_prompt(br#"{"prompt":0}"#).is_none());
        assert!(extract_prompt(br#"{"prompt":null}"#).is_none());
        assert!(extract_prompt(br#"{"prompt":["a"]}"#).is_none());
    }

    #[test]
    fn test_extract_rejects_malformed_json() {
        assert!(extract_prompt(b"not json").is_none());
        assert!(extract_prompt(b"").is_none());
    }
}
