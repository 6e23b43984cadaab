//! Configuration for the inference provider, retries, cache and usage

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use log::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig
{   /// API base URL
    pub api_base: String
  , /// API key; requests fail with InvalidCredential when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>
  , /// Per-attempt request timeout in seconds
    pub timeout_secs: u64
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig
        {   api_base: DEFAULT_API_BASE.to_string()
          , api_key: None
          , timeout_secs: 120
        }
    }
}

impl ProviderConfig
{   pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }
}

/// Models used per task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig
{   pub text_model: String
  , pub vision_model: String
}

impl Default for ModelConfig
{   fn default() -> Self
    {   ModelConfig
        {   text_model: "gpt-3.5-turbo".to_string()
          , vision_model: "gpt-4o-mini".to_string()
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Max attempts per logical request
    pub max_retries: usize
  , /// Linear backoff unit in milliseconds
    pub backoff_unit_ms: u64
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_retries: 3
          , backoff_unit_ms: 1000
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig
{   pub ttl_hours: i64
}

impl Default for CacheConfig
{   fn default() -> Self
    {   CacheConfig { ttl_hours: DEFAULT_TTL_HOURS }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig
{   /// Advisory daily request limit per user
    pub daily_limit: u32
}

impl Default for UsageConfig
{   fn default() -> Self
    {   UsageConfig { daily_limit: 10 }
    }
}

/// gymlens configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig
{   pub provider: ProviderConfig
  , pub models: ModelConfig
  , pub retry: RetryConfig
  , pub cache: CacheConfig
  , pub usage: UsageConfig
  , /// Owner of the single stored profile
    pub user_id: i64
  , pub default_locale: String
  , /// Answer from rules and canned text without calling the model.
    /// `CoachService::from_config` also switches it on when no API key
    /// is configured.
    pub offline: bool
}

impl Default for CoachConfig
{   fn default() -> Self
    {   CoachConfig
        {   provider: ProviderConfig::default()
          , models: ModelConfig::default()
          , retry: RetryConfig::default()
          , cache: CacheConfig::default()
          , usage: UsageConfig::default()
          , user_id: 1
          , default_locale: "ru".to_string()
          , offline: false
        }
    }
}

impl CoachConfig
{   /// Defaults overlaid with OPENAI_* environment variables
    pub fn from_env() -> Self
    {   let mut config = CoachConfig::default();
        config.apply_env();
        config
    }

    /// Load a JSON config file, then overlay the environment
    pub fn from_json_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let mut config: CoachConfig = serde_json::from_str(&raw)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self)
    {   if let Ok(key) = std::env::var("OPENAI_API_KEY")
        {   if !key.trim().is_empty()
            {   self.provider.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(base) = std::env::var("OPENAI_API_BASE")
        {   self.provider.api_base = base;
        }
        if let Some(secs) = std::env::var("OPENAI_TIMEOUT_SECS")
          .ok()
          .and_then(|s| s.parse::<u64>().ok())
        {   self.provider.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.retry.max_retries == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "retry.max_retries must be at least 1".to_string()
            ));
        }
        if self.cache.ttl_hours <= 0
          || chrono::Duration::try_hours(self.cache.ttl_hours).is_none()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "cache.ttl_hours must be a positive number of hours chrono can represent".to_string()
            ));
        }
        if self.provider.timeout_secs == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "provider.timeout_secs must be positive".to_string()
            ));
        }
        Ok(())
    }
}
