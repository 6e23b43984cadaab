//! Retry policy and fallback outcomes

use std::time::Duration;
use log::debug;
use crate::error::Error;

/// Retry policy for failed requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub backoff_unit: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_retries: usize
    , backoff_unit_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_retries: max_retries.max(1)
          , backoff_unit: Duration::from_millis(backoff_unit_ms)
        }
    }

    pub fn from_config(config: &crate::config::RetryConfig) -> Self
    {   RetryPolicy::new(config.max_retries, config.backoff_unit_ms)
    }

    /// Same policy with a different attempt budget
    pub fn with_max_retries(&self, max_retries: usize) -> Self
    {   RetryPolicy
        {   max_retries: max_retries.max(1)
          , backoff_unit: self.backoff_unit
        }
    }

    /// Linear backoff: attempt 1 waits one unit, attempt 2 two units
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   debug!("Calculating backoff for attempt {}", attempt);
        self.backoff_unit * attempt as u32
    }

    /// Whether another attempt follows the given one
    pub fn has_next(&self, attempt: usize) -> bool
    {   attempt < self.max_retries
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(3, 1000)
    }
}

/// Result of a call that may degrade to a substitute value
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T>
{   /// Primary path produced the value
    Ok(T)
  , /// Primary path failed for `reason`; the value is a substitute
    Fallback(T, Error)
  , /// Nothing usable
    Fatal(Error)
}

impl<T> Outcome<T>
{   pub fn is_fallback(&self) -> bool
    {   matches!(self, Outcome::Fallback(..))
    }

    pub fn into_result(self) -> Result<T, Error>
    {   match self
        {   Outcome::Ok(value) | Outcome::Fallback(value, _) => Ok(value)
          , Outcome::Fatal(err) => Err(err)
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U>
    {   match self
        {   Outcome::Ok(value) => Outcome::Ok(f(value))
          , Outcome::Fallback(value, reason) => {
              Outcome::Fallback(f(value), reason)
            }
          , Outcome::Fatal(err) => Outcome::Fatal(err)
        }
    }
}
