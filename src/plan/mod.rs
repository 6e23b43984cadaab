//! Workout plan generation and regeneration on profile change

use std::sync::Arc;
use log::{debug, error, info, warn};
use crate::dispatch::RequestDispatcher;
use crate::error::{Error, ErrorKind};
use crate::failover::Outcome;
use crate::locale::Locale;
use crate::store::Store;

mod draft;
mod profile;
pub mod prompt;
pub mod rules;

pub use draft::{parse_plan, PlanDraft, PlanExercise};
pub use profile::{Profile, DEFAULT_GOAL, DEFAULT_LEVEL, PLAN_RELEVANT_FIELDS};
pub use rules::{equipment_rep_scheme, fallback_plan, plan_from_guidance, rep_scheme, RepScheme};

/// Kinds the rule-based generator stands in for. Everything else is
/// the caller's problem.
fn absorbs(kind: Option<ErrorKind>) -> bool
{   matches!(kind, Some(ErrorKind::Billing) | Some(ErrorKind::ParseError))
}

pub struct PlanOrchestrator
{   dispatcher: RequestDispatcher
  , store: Arc<dyn Store>
  , model: String
  , user_id: i64
  , locale: Locale
  , offline: bool
}

impl PlanOrchestrator
{   pub fn new(
      dispatcher: RequestDispatcher
    , store: Arc<dyn Store>
    , model: impl Into<String>
    , user_id: i64
    , locale: Locale
    ) -> Self
    {   PlanOrchestrator
        {   dispatcher
          , store
          , model: model.into()
          , user_id
          , locale
          , offline: false
        }
    }

    /// Offline orchestrators never call the model; every plan is the
    /// rule-based one
    pub fn with_offline(mut self, offline: bool) -> Self
    {   self.offline = offline;
        self
    }

    pub async fn generate_plan(
      &self
    , profile: &Profile
    , locale: Locale
    ) -> Result<PlanDraft, Error>
    {   self.generate_plan_outcome(profile, locale)
          .await
          .into_result()
    }

    /// Model plan, or the rule-based plan on billing and parse failures
    pub async fn generate_plan_outcome(
      &self
    , profile: &Profile
    , locale: Locale
    ) -> Outcome<PlanDraft>
    {   let equipment = profile.primary_equipment();
        if self.offline
        {   debug!("Offline, using rule-based plan for {}", equipment);
            return Outcome::Fallback(
              fallback_plan(profile, &equipment, locale)
            , Error::fatal(
                ErrorKind::InvalidCredential
              , "Offline mode: no API key configured"
              , 0
              )
            );
        }
        let request = prompt::plan_request(&self.model, profile, locale);

        let result = match self.dispatcher.dispatch(&request).await
        {   Ok(content) => parse_plan(&content, profile, &equipment)
          , Err(e) => Err(e)
        };

        match result
        {   Ok(plan) => {
              info!(
                "Generated plan with {} exercises for {}",
                plan.recommendation.len(), plan.equipment
              );
              Outcome::Ok(plan)
            }
          , Err(reason) if absorbs(reason.kind()) => {
              warn!("Using rule-based plan: {}", reason);
              Outcome::Fallback(fallback_plan(profile, &equipment, locale), reason)
            }
          , Err(reason) => {
              error!("Plan generation failed: {}", reason);
              Outcome::Fatal(reason)
            }
        }
    }

    /// Regenerates and stores a plan when a plan-relevant field changed
    /// on a profile that finished onboarding. Never fails; returns the
    /// stored plan, or None when nothing was stored.
    pub async fn maybe_regenerate(
      &self
    , old: Option<&Profile>
    , new: &Profile
    ) -> Option<PlanDraft>
    {   let old = old?;
        let changed = old.changed_plan_fields(new);
        if changed.is_empty() || !new.onboarding_completed
        {   debug!(
              "Plan kept (changed: {:?}, onboarding_completed: {})",
              changed, new.onboarding_completed
            );
            return None;
        }
        info!("Regenerating plan, changed fields: {:?}", changed);

        let plan = match self.generate_plan(new, self.locale).await
        {   Ok(plan) => plan
          , Err(e) => {
              warn!("Plan regeneration failed: {}", e);
              return None;
            }
        };

        match self.persist(&plan).await
        {   Ok(()) => Some(plan)
          , Err(e) => {
              warn!("Regenerated plan could not be saved: {}", e);
              None
            }
        }
    }

    async fn persist(&self, plan: &PlanDraft) -> Result<(), Error>
    {   let plan_text = plan.to_plan_text()?;
        let plan_data = plan.to_plan_data()?;
        self.store
          .save_plan(self.user_id, plan_text, plan_data)
          .await
    }
}
