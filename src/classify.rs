//! Maps raw upstream responses and transport failures to an ErrorKind

use serde::Deserialize;
use log::{debug, trace};
use crate::error::ErrorKind;
use crate::providers::openai::ChatCompletionResponse;

const BILLING_MARKERS: [&str; 4]
  = ["insufficient", "quota", "billing", "payment"];

/// A single failed attempt, before retry policy is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure
{   pub kind: ErrorKind
  , pub message: String
}

impl UpstreamFailure
{   pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self
    {   UpstreamFailure
        {   kind
          , message: message.into()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope
{   error: Option<ErrorBody>
}

#[derive(Debug, Deserialize)]
struct ErrorBody
{   #[serde(default)]
    message: Option<String>
  , #[serde(default)]
    code: Option<serde_json::Value>
  , #[serde(default, rename = "type")]
    error_type: Option<String>
}

/// Pull `error.message` / `error.code` out of a body, falling back
/// to the raw text when it is not the usual JSON envelope
fn error_details(body: &str) -> (String, String)
{   let parsed = serde_json::from_str::<ErrorEnvelope>(body)
      .ok()
      .and_then(|env| env.error);
    match parsed
    {   Some(err) => {
          let message = err.message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.to_string());
          let code = match err.code
          {   Some(serde_json::Value::String(s)) => s
            , Some(serde_json::Value::Null) | None => {
                err.error_type.unwrap_or_default()
              }
            , Some(other) => other.to_string()
          };
          (message, code)
        }
      , None => (body.to_string(), String::new())
    }
}

fn mentions_billing(text: &str) -> bool
{   let lower = text.to_lowercase();
    BILLING_MARKERS.iter().any(|m| lower.contains(m))
}

fn mentions_missing_model(message: &str) -> bool
{   let lower = message.to_lowercase();
    lower.contains("model")
      && (lower.contains("not found")
          || lower.contains("does not exist"))
}

/// Classify a non-success HTTP response. Pure: the same
/// (status, body) pair always yields the same kind.
pub fn classify_response(status: u16, body: &str) -> UpstreamFailure
{   let (message, code) = error_details(body);
    trace!(
      "Classifying status {} code '{}' message '{}'",
      status, code, message
    );

    let kind = if status == 402
      || status == 403
      || mentions_billing(&message)
      || mentions_billing(&code)
    {   ErrorKind::Billing
    } else if status == 401
    {   ErrorKind::InvalidCredential
    } else if status == 404 || mentions_missing_model(&message)
    {   ErrorKind::ModelNotFound
    } else if status == 429
    {   ErrorKind::RateLimited
    } else
    {   ErrorKind::UnexpectedFormat
    };

    debug!("HTTP {} classified as {}", status, kind);
    UpstreamFailure::new(kind, format!("HTTP {}: {}", status, message))
}

/// Classify a failure that never produced an HTTP status
pub fn classify_transport(err: &reqwest::Error) -> UpstreamFailure
{   let kind = if err.is_timeout()
    {   ErrorKind::Timeout
    } else
    {   ErrorKind::NetworkError
    };
    debug!("Transport error classified as {}: {}", kind, err);
    UpstreamFailure::new(kind, err.to_string())
}

/// Extract the completion text of a 2xx body; anything unusable is a
/// ParseError so it falls under the retry policy
pub fn parse_completion(body: &str) -> Result<String, UpstreamFailure>
{   let response: ChatCompletionResponse = serde_json::from_str(body)
      .map_err(|e| {
        UpstreamFailure::new(
          ErrorKind::ParseError
        , format!("Undecodable completion body: {}", e)
        )
      })?;

    let choice = response.choices.into_iter().next()
      .ok_or_else(|| {
        UpstreamFailure::new(
          ErrorKind::ParseError
        , "Completion contained no choices"
        )
      })?;

    match choice.message.and_then(|m| m.content)
    {   Some(content) if !content.trim().is_empty() => Ok(content)
      , _ => Err(UpstreamFailure::new(
          ErrorKind::ParseError
        , "Empty completion content"
        ))
    }
}
