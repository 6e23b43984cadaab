//! Advisory per-user daily request counter

use std::collections::HashMap;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo
{   pub used: u32
  , pub limit: u32
  , pub remaining: u32
}

/// Counts requests per (user, calendar day). The day is part of the
/// key, so counts reset at midnight without any expiry. Nothing here
/// blocks a request; callers only read it.
pub struct UsageTracker
{   counts: Mutex<HashMap<(i64, NaiveDate), u32>>
  , daily_limit: u32
}

impl UsageTracker
{   pub fn new(daily_limit: u32) -> Self
    {   UsageTracker
        {   counts: Mutex::new(HashMap::new())
          , daily_limit
        }
    }

    pub fn daily_limit(&self) -> u32
    {   self.daily_limit
    }

    pub fn record_use(&self, user_id: i64)
    {   self.record_use_on(user_id, today())
    }

    pub fn record_use_on(&self, user_id: i64, date: NaiveDate)
    {   let mut counts = self.counts.lock();
        let count = counts.entry((user_id, date)).or_insert(0);
        *count = count.saturating_add(1);
        debug!(
          "User {} usage on {}: {}/{}",
          user_id, date, count, self.daily_limit
        );
    }

    pub fn remaining(&self, user_id: i64) -> u32
    {   self.usage_on(user_id, today()).remaining
    }

    pub fn usage(&self, user_id: i64) -> UsageInfo
    {   self.usage_on(user_id, today())
    }

    pub fn usage_on(&self, user_id: i64, date: NaiveDate) -> UsageInfo
    {   let used = self.counts
          .lock()
          .get(&(user_id, date))
          .copied()
          .unwrap_or(0);
        UsageInfo
        {   used
          , limit: self.daily_limit
          , remaining: self.daily_limit.saturating_sub(used)
        }
    }
}

fn today() -> NaiveDate
{   Local::now().date_naive()
}
