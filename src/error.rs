use std::fmt;

/// Classified failure of a call to the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind
{   /// Account balance or quota exhausted
    Billing
  , /// API key rejected or missing
    InvalidCredential
  , /// Requested model does not exist
    ModelNotFound
  , /// Upstream throttled the request (HTTP 429)
    RateLimited
  , /// Attempt exceeded its time budget
    Timeout
  , /// Connect/reset or other transport failure
    NetworkError
  , /// Successful status but unusable completion body
    ParseError
  , /// Any other 4xx/5xx response
    UnexpectedFormat
}

impl ErrorKind
{   /// Whether the dispatcher may try again after this kind
    pub fn is_retryable(&self) -> bool
    {   matches!(
          self
        , ErrorKind::RateLimited
          | ErrorKind::Timeout
          | ErrorKind::NetworkError
          | ErrorKind::ParseError
        )
    }

    pub fn as_str(&self) -> &'static str
    {   match self
        {   ErrorKind::Billing => "billing"
          , ErrorKind::InvalidCredential => "invalid_credential"
          , ErrorKind::ModelNotFound => "model_not_found"
          , ErrorKind::RateLimited => "rate_limited"
          , ErrorKind::Timeout => "timeout"
          , ErrorKind::NetworkError => "network_error"
          , ErrorKind::ParseError => "parse_error"
          , ErrorKind::UnexpectedFormat => "unexpected_format"
        }
    }
}

impl fmt::Display for ErrorKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// Custom error type for gymlens operations
/// Implements Clone for sending through reply channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Upstream failure the caller has to deal with
    Fatal
    {   kind: ErrorKind
      , message: String
      , attempts: usize
    }
  , /// Reading an uploaded image failed
    Io(String)
  , /// Store collaborator failed
    Store(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Backend task is gone
    Disconnected
  , /// Generic error
    Other(String)
}

impl Error
{   pub fn fatal(
      kind: ErrorKind
    , message: impl Into<String>
    , attempts: usize
    ) -> Self
    {   Error::Fatal
        {   kind
          , message: message.into()
          , attempts
        }
    }

    /// Upstream kind, if this error came from the inference service
    pub fn kind(&self) -> Option<ErrorKind>
    {   match self
        {   Error::Fatal { kind, .. } => Some(*kind)
          , _ => None
        }
    }

    pub fn is_billing(&self) -> bool
    {   self.kind() == Some(ErrorKind::Billing)
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Fatal { kind, message, attempts } => {
              write!(f,
                "Inference failed ({}) after {} attempt(s): {}",
                kind, attempts, message
              )
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::Store(msg) => {
              write!(f, "Store error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Disconnected => {
              write!(f, "Backend disconnected")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
