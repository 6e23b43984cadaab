use serde::{Deserialize, Serialize};
use crate::error::{Error, ErrorKind};
use crate::schema::{strip_code_fence, Scalar, TextOrList};
use super::profile::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanExercise
{   pub name: String
  , pub sets: String
  , pub reps: String
  , pub rest: String
  , #[serde(default)]
    pub muscles: Vec<String>
  , #[serde(default)]
    pub instructions: String
  , #[serde(default)]
    pub technique_tips: Vec<String>
}

/// A workout plan before the store persists it. The model and the
/// rule-based generator both produce this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDraft
{   pub equipment: String
  , pub goal: String
  , pub level: String
  , pub recommendation: Vec<PlanExercise>
  , pub safety_notes: Vec<String>
  , pub technique_tips: Vec<String>
}

impl PlanDraft
{   /// Pretty JSON for the store's plan text column
    pub fn to_plan_text(&self) -> Result<String, Error>
    {   serde_json::to_string_pretty(self)
          .map_err(|e| Error::Other(format!("Plan serialization failed: {}", e)))
    }

    pub fn to_plan_data(&self) -> Result<serde_json::Value, Error>
    {   serde_json::to_value(self)
          .map_err(|e| Error::Other(format!("Plan serialization failed: {}", e)))
    }
}

// ===== Model reply schema =====

#[derive(Debug, Deserialize)]
struct PlanReply
{   #[serde(default)]
    equipment: Option<String>
  , #[serde(default)]
    recommendation: Vec<ExerciseReply>
  , #[serde(default)]
    safety_notes: Option<TextOrList>
  , #[serde(default)]
    technique_tips: Option<TextOrList>
}

#[derive(Debug, Deserialize)]
struct ExerciseReply
{   #[serde(default)]
    name: Option<String>
  , #[serde(default)]
    sets: Option<Scalar>
  , #[serde(default)]
    reps: Option<Scalar>
  , #[serde(default)]
    rest: Option<Scalar>
  , #[serde(default)]
    muscles: Option<TextOrList>
  , #[serde(default)]
    instructions: Option<TextOrList>
  , #[serde(default)]
    technique_tips: Option<TextOrList>
}

fn text_or(field: Option<Scalar>, default: &str) -> String
{   field
      .map(Scalar::into_text)
      .filter(|s| !s.is_empty())
      .unwrap_or_else(|| default.to_string())
}

impl From<ExerciseReply> for PlanExercise
{   fn from(ex: ExerciseReply) -> Self
    {   PlanExercise
        {   name: ex.name
              .map(|n| n.trim().to_string())
              .filter(|n| !n.is_empty())
              .unwrap_or_else(|| "Exercise".to_string())
          , sets: text_or(ex.sets, "3")
          , reps: text_or(ex.reps, "10-12")
          , rest: text_or(ex.rest, "60s")
          , muscles: ex.muscles
              .map(TextOrList::into_split_list)
              .unwrap_or_default()
          , instructions: ex.instructions
              .map(|i| i.into_joined("\n"))
              .unwrap_or_default()
          , technique_tips: ex.technique_tips
              .map(TextOrList::into_list)
              .unwrap_or_default()
        }
    }
}

/// Validate the model's plan JSON and normalize it into a `PlanDraft`.
/// Not JSON, wrong shape, or no exercises at all is a ParseError.
pub fn parse_plan(
  content: &str
, profile: &Profile
, primary_equipment: &str
) -> Result<PlanDraft, Error>
{   let reply: PlanReply = serde_json::from_str(strip_code_fence(content))
      .map_err(|e| {
        Error::fatal(
          ErrorKind::ParseError
        , format!("Plan reply does not match schema: {}", e)
        , 1
        )
      })?;

    if reply.recommendation.is_empty()
    {   return Err(Error::fatal(
          ErrorKind::ParseError
        , "Plan reply contains no exercises"
        , 1
        ));
    }

    Ok(PlanDraft
    {   equipment: reply.equipment
          .map(|e| e.trim().to_string())
          .filter(|e| !e.is_empty())
          .unwrap_or_else(|| primary_equipment.to_string())
      , goal: profile.goal_or_default().to_string()
      , level: profile.level_or_default().to_string()
      , recommendation: reply.recommendation
          .into_iter()
          .map(PlanExercise::from)
          .collect()
      , safety_notes: reply.safety_notes
          .map(TextOrList::into_list)
          .unwrap_or_default()
      , technique_tips: reply.technique_tips
          .map(TextOrList::into_list)
          .unwrap_or_default()
    })
}
