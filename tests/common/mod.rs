#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use gymlens::classify::UpstreamFailure;
use gymlens::config::CoachConfig;
use gymlens::providers::{RawResponse, Transport};
use gymlens::request::InferenceRequest;
use gymlens::{CoachService, Equipment, Error, ErrorKind, Exercise, Profile, Store};

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// Chat-completion body carrying `content`
pub fn completion(content: &str) -> String
{   serde_json::json!({
      "choices": [{ "message": { "role": "assistant", "content": content } }]
    }).to_string()
}

pub fn ok(content: &str) -> Result<RawResponse, UpstreamFailure>
{   Ok(RawResponse::new(200, completion(content)))
}

pub fn status(code: u16, message: &str) -> Result<RawResponse, UpstreamFailure>
{   Ok(RawResponse::new(
      code
    , serde_json::json!({ "error": { "message": message } }).to_string()
    ))
}

/// Transport that plays back queued responses. Once the queue is
/// empty it keeps returning `exhausted`.
pub struct ScriptedTransport
{   script: Mutex<VecDeque<Result<RawResponse, UpstreamFailure>>>
  , exhausted: Result<RawResponse, UpstreamFailure>
  , pub requests: Mutex<Vec<InferenceRequest>>
}

impl ScriptedTransport
{   pub fn new(script: Vec<Result<RawResponse, UpstreamFailure>>) -> Arc<Self>
    {   Arc::new(ScriptedTransport
        {   script: Mutex::new(script.into())
          , exhausted: Err(UpstreamFailure::new(
              ErrorKind::NetworkError
            , "script exhausted"
            ))
          , requests: Mutex::new(Vec::new())
        })
    }

    /// Every call gets the same response
    pub fn always(response: Result<RawResponse, UpstreamFailure>) -> Arc<Self>
    {   Arc::new(ScriptedTransport
        {   script: Mutex::new(VecDeque::new())
          , exhausted: response
          , requests: Mutex::new(Vec::new())
        })
    }

    pub fn attempts(&self) -> usize
    {   self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport
{   async fn send(
      &self
    , request: &InferenceRequest
    ) -> Result<RawResponse, UpstreamFailure>
    {   self.requests.lock().push(request.clone());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.exhausted.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore
{   pub profile: Mutex<Option<Profile>>
  , pub equipment: Vec<Equipment>
  , pub exercises: Vec<Exercise>
  , pub saved_plans: Mutex<Vec<(i64, String, serde_json::Value)>>
  , pub fail_catalog: bool
  , pub fail_save: bool
}

impl MemoryStore
{   pub fn with_catalog(equipment: &[(i64, &str)], exercises: &[(i64, i64, &str)]) -> Self
    {   MemoryStore
        {   equipment: equipment
              .iter()
              .map(|(id, name)| Equipment { id: *id, name: name.to_string() })
              .collect()
          , exercises: exercises
              .iter()
              .map(|(id, equipment_id, name)| Exercise
              {   id: *id
                , equipment_id: *equipment_id
                , name: name.to_string()
              })
              .collect()
          , ..MemoryStore::default()
        }
    }

    pub fn saved(&self) -> usize
    {   self.saved_plans.lock().len()
    }
}

#[async_trait]
impl Store for MemoryStore
{   async fn get_profile(&self) -> Result<Option<Profile>, Error>
    {   Ok(self.profile.lock().clone())
    }

    async fn list_equipment(&self) -> Result<Vec<Equipment>, Error>
    {   if self.fail_catalog
        {   return Err(Error::Store("catalog offline".into()));
        }
        Ok(self.equipment.clone())
    }

    async fn list_exercises(
      &self
    , equipment_id: Option<i64>
    ) -> Result<Vec<Exercise>, Error>
    {   Ok(self.exercises
          .iter()
          .filter(|e| equipment_id.map_or(true, |id| e.equipment_id == id))
          .cloned()
          .collect())
    }

    async fn save_plan(
      &self
    , user_id: i64
    , plan_text: String
    , plan_data: serde_json::Value
    ) -> Result<(), Error>
    {   if self.fail_save
        {   return Err(Error::Store("disk full".into()));
        }
        self.saved_plans.lock().push((user_id, plan_text, plan_data));
        Ok(())
    }
}

pub fn service(
  transport: Arc<ScriptedTransport>
, store: Arc<MemoryStore>
) -> CoachService
{   init_logging();
    CoachService::new(CoachConfig::default(), transport, store)
}
