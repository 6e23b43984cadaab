//! Persistent store collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::plan::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment
{   pub id: i64
  , pub name: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise
{   pub id: i64
  , pub equipment_id: i64
  , pub name: String
}

/// The slice of the data store the core reads and writes. Implementors
/// provide their own serialization.
#[async_trait]
pub trait Store: Send + Sync
{   async fn get_profile(&self) -> Result<Option<Profile>, Error>;

    /// Opaque equipment catalog
    async fn list_equipment(&self) -> Result<Vec<Equipment>, Error>;

    async fn list_exercises(
      &self
    , equipment_id: Option<i64>
    ) -> Result<Vec<Exercise>, Error>;

    async fn save_plan(
      &self
    , user_id: i64
    , plan_text: String
    , plan_data: serde_json::Value
    ) -> Result<(), Error>;
}
