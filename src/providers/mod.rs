//! Inference service transports

use async_trait::async_trait;
use crate::classify::UpstreamFailure;
use crate::request::InferenceRequest;

pub mod openai;

// Re-export for convenience
pub use openai::OpenAiTransport;

/// Status and body of one HTTP round-trip, success or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse
{   pub status: u16
  , pub body: String
}

impl RawResponse
{   pub fn new(status: u16, body: impl Into<String>) -> Self
    {   RawResponse
        {   status
          , body: body.into()
        }
    }

    pub fn is_success(&self) -> bool
    {   (200..300).contains(&self.status)
    }
}

/// One attempt against the inference service. Implementations return
/// `Err` only when no HTTP status was obtained (timeout, connect, missing
/// key); every status, good or bad, comes back as a `RawResponse`.
#[async_trait]
pub trait Transport: Send + Sync
{   async fn send(
      &self
    , request: &InferenceRequest
    ) -> Result<RawResponse, UpstreamFailure>;
}
