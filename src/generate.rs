//! Validated generation.
//!
//! Asks the model to answer inside a fixed `{"output": ...}` JSON envelope,
//! parses that envelope out of whatever the model actually sent, and retries
//! until a caller-supplied validator accepts the output or the attempt
//! budget runs out.

use std::time::Duration;

use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::error::{AttemptFailure, Error, Result};
use crate::retry::RetryPolicy;

/// Inputs for one safe-generate call.
#[derive(Debug, Clone)]
pub struct SafeGenerateRequest {
    pub prompt: String,
    /// Example value placed in the envelope shown to the model.
    pub example_output: String,
    /// Extra instruction appended to the envelope request.
    pub instruction: String,
    pub timeout: Duration,
    pub policy: RetryPolicy,
}

/// Run the generate-and-validate loop.
///
/// Each attempt dispatches the augmented prompt, extracts the envelope's
/// `output`, and hands it to `validate`; the first accepted output is
/// returned through `cleanup`. A failed dispatch counts as a spent attempt,
/// as does unparseable output or a rejection. Exhaustion yields
/// [`Error::ValidationExhausted`] carrying which of those three ways the
/// final attempt failed.
pub fn safe_generate<T, V, C>(
    dispatcher: &Dispatcher,
    request: &SafeGenerateRequest,
    validate: V,
    cleanup: C,
) -> Result<T>
where
    V: Fn(&Value, &str) -> bool,
    C: Fn(&Value, &str) -> T,
{
    let prompt = envelope_prompt(&request.prompt, &request.instruction, &request.example_output);
    let attempts = request.policy.max_attempts.max(1);
    let mut last_failure = AttemptFailure::Backend;

    for attempt in 1..=attempts {
        let response = match dispatcher.dispatch(&prompt, request.timeout, &request.policy) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(attempt, error = %err, "backend call failed during safe generation");
                last_failure = AttemptFailure::Backend;
                continue;
            }
        };

        let output = match parse_envelope(&response) {
            Some(output) => output,
            None => {
                tracing::warn!(attempt, "response carried no parseable output envelope");
                last_failure = AttemptFailure::Parse;
                continue;
            }
        };

        if validate(&output, &prompt) {
            return Ok(cleanup(&output, &prompt));
        }
        tracing::debug!(attempt, "validator rejected generated output");
        last_failure = AttemptFailure::Rejected;
    }

    Err(Error::ValidationExhausted {
        attempts,
        last_failure,
    })
}

/// Build the augmented prompt that pins the response to the JSON envelope.
fn envelope_prompt(prompt: &str, instruction: &str, example_output: &str) -> String {
    format!(
        "\"\"\"\n{prompt}\n\"\"\"\n\
         Output the response to the prompt above in json. {instruction}\n\
         Example output json:\n\
         {{\"output\": \"{example_output}\"}}"
    )
}

/// Extract the envelope's `output` field, tolerating commentary before the
/// outermost `{` and after the last `}`.
pub(crate) fn parse_envelope(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    let parsed: Value = serde_json::from_str(&trimmed[start..=end]).ok()?;
    parsed.get("output").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_survives_surrounding_junk() {
        let raw = r#"prefix {"output":"GOOD"} trailing junk"#;
        assert_eq!(parse_envelope(raw), Some(json!("GOOD")));
    }

    #[test]
    fn envelope_ignores_extra_keys() {
        let raw = r#"{"output": [1, 2], "note": "ignored"}"#;
        assert_eq!(parse_envelope(raw), Some(json!([1, 2])));
    }

    #[test]
    fn malformed_or_missing_envelope_is_none() {
        assert_eq!(parse_envelope("not a json"), None);
        assert_eq!(parse_envelope(r#"{"output": }"#), None);
        assert_eq!(parse_envelope(r#"{"result": "x"}"#), None);
        assert_eq!(parse_envelope("} backwards {"), None);
        assert_eq!(parse_envelope(""), None);
    }

    #[test]
    fn prompt_carries_instruction_and_example() {
        let prompt = envelope_prompt("What next?", "Answer in one word.", "sleep");
        assert!(prompt.starts_with("\"\"\"\nWhat next?\n\"\"\"\n"));
        assert!(prompt.contains("Output the response to the prompt above in json. Answer in one word.\n"));
        assert!(prompt.ends_with("{\"output\": \"sleep\"}"));
    }
}
