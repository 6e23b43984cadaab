//! Single logical inference request with classified retry

use std::sync::Arc;
use log::{debug, error, info, warn};
use crate::classify::{classify_response, parse_completion, UpstreamFailure};
use crate::error::Error;
use crate::failover::RetryPolicy;
use crate::providers::Transport;
use crate::request::InferenceRequest;

/// Sends requests through a transport, absorbing retryable failures
/// up to the policy limit
#[derive(Clone)]
pub struct RequestDispatcher
{   transport: Arc<dyn Transport>
  , policy: RetryPolicy
}

impl RequestDispatcher
{   pub fn new(
      transport: Arc<dyn Transport>
    , policy: RetryPolicy
    ) -> Self
    {   debug!(
          "Creating RequestDispatcher (max_retries={}, unit={:?})",
          policy.max_retries, policy.backoff_unit
        );
        RequestDispatcher
        {   transport
          , policy
        }
    }

    pub fn policy(&self) -> &RetryPolicy
    {   &self.policy
    }

    /// Dispatch with the configured attempt budget
    pub async fn dispatch(
      &self
    , request: &InferenceRequest
    ) -> Result<String, Error>
    {   self.dispatch_with_retries(request, self.policy.max_retries)
          .await
    }

    /// Dispatch with an explicit attempt budget. Runs to completion:
    /// success, a fatal kind, or retries exhausted.
    pub async fn dispatch_with_retries(
      &self
    , request: &InferenceRequest
    , max_retries: usize
    ) -> Result<String, Error>
    {   let policy = self.policy.with_max_retries(max_retries);
        let mut attempt = 1;

        loop
        {   debug!(
              "Dispatching to {} (attempt {}/{})",
              request.model(), attempt, policy.max_retries
            );

            let failure = match self.attempt(request).await
            {   Ok(content) => {
                  if attempt > 1
                  {   info!("Request succeeded on attempt {}", attempt);
                  }
                  return Ok(content);
                }
              , Err(failure) => failure
            };

            if !failure.kind.is_retryable()
            {   error!(
                  "Fatal {} on attempt {}: {}",
                  failure.kind, attempt, failure.message
                );
                return Err(Error::fatal(
                  failure.kind
                , failure.message
                , attempt
                ));
            }

            if !policy.has_next(attempt)
            {   error!(
                  "Giving up after {} attempts, last error {}: {}",
                  attempt, failure.kind, failure.message
                );
                return Err(Error::fatal(
                  failure.kind
                , format!(
                    "No usable response after {} attempts: {}",
                    attempt, failure.message
                  )
                , attempt
                ));
            }

            let delay = policy.backoff_for_attempt(attempt);
            warn!(
              "{} on attempt {}/{}, retrying in {:?}: {}",
              failure.kind, attempt, policy.max_retries,
              delay, failure.message
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
      &self
    , request: &InferenceRequest
    ) -> Result<String, UpstreamFailure>
    {   let raw = self.transport.send(request).await?;
        if raw.is_success()
        {   parse_completion(&raw.body)
        } else
        {   Err(classify_response(raw.status, &raw.body))
        }
    }
}
