pub mod error;
pub mod config;
pub mod locale;
pub mod request;
pub mod classify;
pub mod providers;
pub mod failover;
pub mod dispatch;
pub mod cache;
pub mod usage;
pub mod store;
pub mod schema;
pub mod recognition;
pub mod plan;
pub mod guidance;
pub mod service;
pub mod client;

/*

gymlens: inference core of a gym-equipment assistant. Recognizes
equipment on photos, explains how to use it, answers training
questions and writes workout plans, degrading to deterministic
substitutes when the model is unavailable or unpaid.

gymlens/
├── src/
│   ├── lib.rs          # Re-exports and the backend command surface
│   ├── error.rs        # Error and ErrorKind
│   ├── config.rs       # CoachConfig and friends
│   ├── classify.rs     # Upstream status/body -> ErrorKind
│   ├── dispatch.rs     # One logical request with retry
│   ├── failover.rs     # RetryPolicy and Outcome
│   ├── providers/      # Transport seam and the OpenAI wire format
│   ├── cache.rs        # TTL cache for guidance
│   ├── usage.rs        # Per-user daily counter
│   ├── recognition/    # Vision recognition + heuristic fallback
│   ├── plan/           # Plan prompt, parsing, rules, regeneration
│   ├── guidance.rs     # Equipment guidance and chat prompts
│   ├── service.rs      # CoachService
│   └── client.rs       # CoachBackend actor
└── tests/

*/

pub use error::{Error, ErrorKind};
pub use config::CoachConfig;
pub use failover::Outcome;
pub use guidance::{ChatContext, Guidance, GuidanceExercise};
pub use locale::Locale;
pub use plan::{PlanDraft, PlanExercise, Profile};
pub use recognition::{Candidate, ImageUpload};
pub use service::CoachService;
pub use store::{Equipment, Exercise, Store};
pub use usage::UsageInfo;
pub use client::CoachBackend;

/// Install env_logger with `info` as the default filter. Safe to call
/// more than once.
pub fn init_logger()
{   let _ = env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).try_init();
}

/// COACH BACKEND INTERFACE:

pub type ReplySender<T> = tokio::sync::mpsc::UnboundedSender<T>;

// ===== Guidance =====

pub type GuidanceReply = Result<Guidance, crate::error::Error>;

pub struct GuidanceArgs
{   pub equipment: String
  , pub locale: String
  , pub reply: ReplySender<GuidanceReply>
}

// ===== Chat =====

pub type ChatReply = Result<String, crate::error::Error>;

pub struct ChatArgs
{   pub message: String
  , pub context: ChatContext
  , pub locale: String
  , pub reply: ReplySender<ChatReply>
}

// ===== Recognize =====

/// Recognition never fails
pub type RecognizeReply = Vec<Candidate>;

pub struct RecognizeArgs
{   pub image: ImageUpload
  , pub top_k: usize
  , pub locale: String
  , pub reply: ReplySender<RecognizeReply>
}

// ===== GeneratePlan =====

pub type GeneratePlanReply = Result<PlanDraft, crate::error::Error>;

pub struct GeneratePlanArgs
{   pub profile: Profile
  , /// Some: plan for this one machine, built from its guidance
    pub equipment: Option<String>
  , pub locale: String
  , pub reply: ReplySender<GeneratePlanReply>
}

// ===== ProfileUpdated =====

pub type ProfileUpdatedReply = Option<PlanDraft>;

pub struct ProfileUpdatedArgs
{   pub old: Option<Profile>
  , pub new: Profile
  , pub reply: ReplySender<ProfileUpdatedReply>
}

// ===== GetUsage =====

pub type GetUsageReply = UsageInfo;

pub struct GetUsageArgs
{   pub user_id: i64
  , pub reply: ReplySender<GetUsageReply>
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;

pub struct KillProcessArgs
{   pub reply: ReplySender<KillProcessReply>
}

// ===== CoachHand (sender side) =====

pub struct CoachHand
{   pub guidance_tx
      : tokio::sync::mpsc::UnboundedSender<GuidanceArgs>
  , pub chat_tx
      : tokio::sync::mpsc::UnboundedSender<ChatArgs>
  , pub recognize_tx
      : tokio::sync::mpsc::UnboundedSender<RecognizeArgs>
  , pub generate_plan_tx
      : tokio::sync::mpsc::UnboundedSender<GeneratePlanArgs>
  , pub profile_updated_tx
      : tokio::sync::mpsc::UnboundedSender<ProfileUpdatedArgs>
  , pub get_usage_tx
      : tokio::sync::mpsc::UnboundedSender<GetUsageArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== CoachFoot (receiver side) =====

pub struct CoachFoot
{   pub guidance_rx
      : tokio::sync::mpsc::UnboundedReceiver<GuidanceArgs>
  , pub chat_rx
      : tokio::sync::mpsc::UnboundedReceiver<ChatArgs>
  , pub recognize_rx
      : tokio::sync::mpsc::UnboundedReceiver<RecognizeArgs>
  , pub generate_plan_rx
      : tokio::sync::mpsc::UnboundedReceiver<GeneratePlanArgs>
  , pub profile_updated_rx
      : tokio::sync::mpsc::UnboundedReceiver<ProfileUpdatedArgs>
  , pub get_usage_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetUsageArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
