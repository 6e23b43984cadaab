use serde::{Deserialize, Deserializer, Serialize};

/// Fields whose change makes a stored plan stale
pub const PLAN_RELEVANT_FIELDS: [&str; 9] = [
  "goal"
, "level"
, "workouts_per_week"
, "workout_type"
, "available_equipment"
, "injuries_limitations"
, "favorite_muscle_groups"
, "height_cm"
, "weight_kg"
];

pub const DEFAULT_GOAL: &str = "muscle_gain";
pub const DEFAULT_LEVEL: &str = "beginner";

/// Stored rows may carry `null` where a list or flag was never set
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>
, T: Default + Deserialize<'de>
{   Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// User profile as read from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile
{   pub age: Option<u32>
  , pub sex: Option<String>
  , pub gender: Option<String>
  , pub height_cm: Option<f64>
  , pub weight_kg: Option<f64>
  , /// beginner | intermediate | advanced
    pub level: Option<String>
  , /// fat_loss | muscle_gain | strength | endurance | rehab
    pub goal: Option<String>
  , /// e.g. knee_pain, lower_back_pain
    #[serde(deserialize_with = "null_as_default")]
    pub health_flags: Vec<String>
  , pub workouts_per_week: Option<u32>
  , pub goal_timeline: Option<String>
  , pub diet_type: Option<String>
  , pub workout_experience: Option<String>
  , #[serde(deserialize_with = "null_as_default")]
    pub workout_type: Vec<String>
  , #[serde(deserialize_with = "null_as_default")]
    pub available_equipment: Vec<String>
  , pub workout_duration: Option<String>
  , pub preferred_time: Option<String>
  , pub injuries_limitations: Option<String>
  , pub activity_level: Option<String>
  , pub intensity_preference: Option<String>
  , #[serde(deserialize_with = "null_as_default")]
    pub favorite_muscle_groups: Vec<String>
  , #[serde(alias = "desiredWeight")]
    pub desired_weight: Option<f64>
  , #[serde(deserialize_with = "null_as_default")]
    pub onboarding_completed: bool
}

fn non_empty(value: &Option<String>) -> Option<&str>
{   value.as_deref()
      .map(str::trim)
      .filter(|v| !v.is_empty())
}

impl Profile
{   pub fn goal_or_default(&self) -> &str
    {   non_empty(&self.goal).unwrap_or(DEFAULT_GOAL)
    }

    pub fn level_or_default(&self) -> &str
    {   non_empty(&self.level).unwrap_or(DEFAULT_LEVEL)
    }

    pub fn sex_or_gender(&self) -> Option<&str>
    {   non_empty(&self.sex).or_else(|| non_empty(&self.gender))
    }

    /// Injuries worth steering the plan; "None" placeholders are ignored
    pub fn injuries(&self) -> Option<&str>
    {   non_empty(&self.injuries_limitations)
          .filter(|v| !v.eq_ignore_ascii_case("none"))
    }

    /// First listed equipment, else a barbell for strength work and
    /// dumbbells for everything else
    pub fn primary_equipment(&self) -> String
    {   self.available_equipment
          .iter()
          .map(|e| e.trim())
          .find(|e| !e.is_empty())
          .map(str::to_string)
          .unwrap_or_else(|| {
            if self.goal_or_default() == "strength"
            {   "Barbell".to_string()
            } else
            {   "Dumbbell".to_string()
            }
          })
    }

    /// Plan-relevant fields that differ between `self` and `updated`
    pub fn changed_plan_fields(&self, updated: &Profile) -> Vec<&'static str>
    {   let changed = [
          self.goal != updated.goal
        , self.level != updated.level
        , self.workouts_per_week != updated.workouts_per_week
        , self.workout_type != updated.workout_type
        , self.available_equipment != updated.available_equipment
        , self.injuries_limitations != updated.injuries_limitations
        , self.favorite_muscle_groups != updated.favorite_muscle_groups
        , self.height_cm != updated.height_cm
        , self.weight_kg != updated.weight_kg
        ];
        PLAN_RELEVANT_FIELDS
          .iter()
          .zip(changed)
          .filter(|(_, differs)| *differs)
          .map(|(name, _)| *name)
          .collect()
    }
}
