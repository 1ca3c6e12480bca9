//! Helpers shared by the clients of OpenAI-compatible HTTP APIs.

use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Describe a non-success response as `API returned <status>: <detail>`.
///
/// The detail is the `error.message` field of an OpenAI-style error body,
/// or the raw body when it has another shape.
pub(crate) async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    };
    format!("API returned {status}: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_parses_openai_shape() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"message":"Rate limit reached","type":"tokens","code":"rate_limit_exceeded"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.message, "Rate limit reached");
    }
}
