//! Operations exposed to the route layer

use std::sync::Arc;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use crate::cache::ResponseCache;
use crate::config::CoachConfig;
use crate::dispatch::RequestDispatcher;
use crate::error::Error;
use crate::failover::RetryPolicy;
use crate::guidance::{
  chat_request, guidance_request, offline_chat_reply, offline_guidance
, parse_guidance, ChatContext, Guidance
};
use crate::locale::Locale;
use crate::plan::{plan_from_guidance, PlanDraft, PlanOrchestrator, Profile};
use crate::providers::{OpenAiTransport, Transport};
use crate::recognition::{Candidate, ImageUpload, RecognitionFallbackChain};
use crate::store::Store;
use crate::usage::{UsageInfo, UsageTracker};

/// Owns the dispatcher, cache, usage tracker and the fallback chains.
/// Share it behind an `Arc`; every operation takes `&self`.
pub struct CoachService
{   config: CoachConfig
  , dispatcher: RequestDispatcher
  , store: Arc<dyn Store>
  , guidance_cache: ResponseCache<Guidance>
  , usage: UsageTracker
  , recognition: RecognitionFallbackChain
  , plans: PlanOrchestrator
}

impl CoachService
{   pub fn new(
      config: CoachConfig
    , transport: Arc<dyn Transport>
    , store: Arc<dyn Store>
    ) -> Self
    {   let dispatcher = RequestDispatcher::new(
          transport
        , RetryPolicy::from_config(&config.retry)
        );
        let recognition = RecognitionFallbackChain::new(
          dispatcher.clone()
        , store.clone()
        , config.models.vision_model.clone()
        ).with_offline(config.offline);
        let plans = PlanOrchestrator::new(
          dispatcher.clone()
        , store.clone()
        , config.models.text_model.clone()
        , config.user_id
        , Locale::from_tag(&config.default_locale)
        ).with_offline(config.offline);
        if config.offline
        {   info!("CoachService running offline, answers come from rules and canned text");
        }
        info!(
          "CoachService ready (text model {}, vision model {})",
          config.models.text_model, config.models.vision_model
        );

        CoachService
        {   guidance_cache: ResponseCache::with_ttl_hours(config.cache.ttl_hours)
          , usage: UsageTracker::new(config.usage.daily_limit)
          , config
          , dispatcher
          , store
          , recognition
          , plans
        }
    }

    /// Service speaking to the configured OpenAI-compatible endpoint.
    /// Without an API key it runs offline.
    pub fn from_config(
      mut config: CoachConfig
    , store: Arc<dyn Store>
    ) -> Result<Self, Error>
    {   config.validate()?;
        let transport = OpenAiTransport::new(&config.provider)?;
        if !transport.has_api_key() && !config.offline
        {   warn!("OPENAI_API_KEY is not set, switching to offline mode");
            config.offline = true;
        }
        Ok(CoachService::new(config, Arc::new(transport), store))
    }

    pub fn config(&self) -> &CoachConfig
    {   &self.config
    }

    pub fn is_offline(&self) -> bool
    {   self.config.offline
    }

    /// Requests are counted, never refused
    fn record_use(&self)
    {   self.usage.record_use(self.config.user_id);
    }

    /// Guidance for one piece of equipment, served from the cache when fresh
    pub async fn guidance(
      &self
    , subject: &str
    , locale: &str
    ) -> Result<Guidance, Error>
    {   self.guidance_at(subject, locale, Utc::now()).await
    }

    /// `guidance` with the cache read and written at `now`
    pub async fn guidance_at(
      &self
    , subject: &str
    , locale: &str
    , now: DateTime<Utc>
    ) -> Result<Guidance, Error>
    {   let locale = Locale::from_tag(locale);
        if self.config.offline
        {   return Ok(offline_guidance(subject, locale));
        }
        if let Some(cached) = self.guidance_cache.get_at(subject, locale.tag(), now)
        {   return Ok(cached);
        }

        self.record_use();
        let request = guidance_request(
          &self.config.models.text_model
        , subject
        , locale
        );
        let content = self.dispatcher.dispatch(&request).await?;
        let guidance = parse_guidance(&content)?;
        debug!(
          "Guidance for {} has {} exercises",
          subject, guidance.exercises.len()
        );

        self.guidance_cache.put_at(subject, locale.tag(), guidance.clone(), now);
        Ok(guidance)
    }

    /// Free-form coaching answer. Without a profile in `context` the
    /// stored one is used when available.
    pub async fn chat(
      &self
    , message: &str
    , mut context: ChatContext
    , locale: &str
    ) -> Result<String, Error>
    {   if self.config.offline
        {   self.record_use();
            return Ok(offline_chat_reply(message.trim(), Locale::from_tag(locale)));
        }
        if context.profile.is_none()
        {   match self.store.get_profile().await
            {   Ok(profile) => context.profile = profile
              , Err(e) => debug!("Chat without profile: {}", e)
            }
        }

        self.record_use();
        let request = chat_request(
          &self.config.models.text_model
        , message.trim()
        , &context
        , Locale::from_tag(locale)
        );
        self.dispatcher.dispatch(&request).await
    }

    pub async fn recognize(
      &self
    , image: &ImageUpload
    , locale: &str
    ) -> Candidate
    {   self.record_use();
        self.recognition
          .recognize(image, Locale::from_tag(locale))
          .await
    }

    pub async fn recognize_candidates(
      &self
    , image: &ImageUpload
    , top_k: usize
    , locale: &str
    ) -> Vec<Candidate>
    {   self.record_use();
        self.recognition
          .recognize_candidates(image, top_k, Locale::from_tag(locale))
          .await
    }

    pub async fn generate_plan(
      &self
    , profile: &Profile
    , locale: &str
    ) -> Result<PlanDraft, Error>
    {   self.record_use();
        self.plans
          .generate_plan(profile, Locale::from_tag(locale))
          .await
    }

    /// Plan for a single machine built on top of its guidance
    pub async fn generate_equipment_plan(
      &self
    , equipment: &str
    , profile: &Profile
    , locale: &str
    ) -> Result<PlanDraft, Error>
    {   let guidance = self.guidance(equipment, locale).await?;
        Ok(plan_from_guidance(
          equipment
        , &guidance
        , profile
        , Locale::from_tag(locale)
        ))
    }

    /// Hook for the profile write path; see `PlanOrchestrator::maybe_regenerate`
    pub async fn on_profile_updated(
      &self
    , old: Option<&Profile>
    , new: &Profile
    ) -> Option<PlanDraft>
    {   self.plans.maybe_regenerate(old, new).await
    }

    pub fn usage(&self, user_id: i64) -> UsageInfo
    {   self.usage.usage(user_id)
    }

    pub fn cached_guidance_count(&self) -> usize
    {   self.guidance_cache.len()
    }
}
