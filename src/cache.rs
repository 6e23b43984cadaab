//! In-memory TTL cache for generated guidance

use std::collections::HashMap;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use log::{debug, warn};
use crate::config::DEFAULT_TTL_HOURS;

#[derive(Debug, Clone)]
pub struct CacheEntry<T>
{   pub payload: T
  , pub inserted_at: DateTime<Utc>
}

impl<T> CacheEntry<T>
{   pub fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool
    {   now - self.inserted_at < ttl
    }
}

/// Memo keyed by (subject, locale), both case-normalized.
/// Stale entries are evicted when read, never swept. Concurrent puts
/// to one key resolve last-write-wins.
pub struct ResponseCache<T>
{   entries: Mutex<HashMap<String, CacheEntry<T>>>
  , ttl: Duration
}

pub fn cache_key(subject: &str, locale: &str) -> String
{   format!(
      "{}_{}",
      subject.trim().to_lowercase(),
      locale.trim().to_lowercase()
    )
}

impl<T: Clone> ResponseCache<T>
{   pub fn new(ttl: Duration) -> Self
    {   ResponseCache
        {   entries: Mutex::new(HashMap::new())
          , ttl
        }
    }

    /// TTLs that are not positive or overflow `Duration` fall back to
    /// the default of 24 hours
    pub fn with_ttl_hours(hours: i64) -> Self
    {   let ttl = Duration::try_hours(hours)
          .filter(|ttl| *ttl > Duration::zero())
          .unwrap_or_else(|| {
            warn!(
              "Cache TTL of {} hours is out of range, using {}",
              hours, DEFAULT_TTL_HOURS
            );
            Duration::hours(DEFAULT_TTL_HOURS)
          });
        ResponseCache::new(ttl)
    }

    pub fn ttl(&self) -> Duration
    {   self.ttl
    }

    pub fn get(&self, subject: &str, locale: &str) -> Option<T>
    {   self.get_at(subject, locale, Utc::now())
    }

    pub fn get_at(
      &self
    , subject: &str
    , locale: &str
    , now: DateTime<Utc>
    ) -> Option<T>
    {   let key = cache_key(subject, locale);
        let mut entries = self.entries.lock();
        match entries.get(&key)
        {   Some(entry) if entry.is_valid(now, self.ttl) => {
              debug!("Cache hit for key: {}", key);
              Some(entry.payload.clone())
            }
          , Some(_) => {
              debug!("Cache expired for key: {}", key);
              entries.remove(&key);
              None
            }
          , None => None
        }
    }

    pub fn put(&self, subject: &str, locale: &str, payload: T)
    {   self.put_at(subject, locale, payload, Utc::now())
    }

    pub fn put_at(
      &self
    , subject: &str
    , locale: &str
    , payload: T
    , inserted_at: DateTime<Utc>
    )
    {   let key = cache_key(subject, locale);
        debug!("Cache saved for key: {}", key);
        self.entries.lock().insert(
          key
        , CacheEntry
          {   payload
            , inserted_at
          }
        );
    }

    /// Stored entries, stale ones included until they are read
    pub fn len(&self) -> usize
    {   self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool
    {   self.len() == 0
    }
}
