use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::CoachFoot;
use crate::service::CoachService;

fn disconnected() -> crate::error::Error
{   error!("Backend channel closed");
    crate::error::Error::Disconnected
}

/// Public API for the coach backend - owns the task
pub struct CoachBackend
{   hand: crate::CoachHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl CoachBackend
{   /// Spawn the backend around `service`. Returns immediately.
    pub fn new(service: CoachService) -> Self
    {   debug!("Creating CoachBackend with task ownership");

        let (guidance_tx, guidance_rx)
          = mpsc::unbounded_channel();
        let (chat_tx, chat_rx)
          = mpsc::unbounded_channel();
        let (recognize_tx, recognize_rx)
          = mpsc::unbounded_channel();
        let (generate_plan_tx, generate_plan_rx)
          = mpsc::unbounded_channel();
        let (profile_updated_tx, profile_updated_rx)
          = mpsc::unbounded_channel();
        let (get_usage_tx, get_usage_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::CoachHand
        {   guidance_tx
          , chat_tx
          , recognize_tx
          , generate_plan_tx
          , profile_updated_tx
          , get_usage_tx
          , kill_process_tx
        };

        let foot = crate::CoachFoot
        {   guidance_rx
          , chat_rx
          , recognize_rx
          , generate_plan_rx
          , profile_updated_rx
          , get_usage_rx
          , kill_process_rx
        };

        let service = Arc::new(service);
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, service).await
        });

        CoachBackend
        {   hand
          , _task_handle
        }
    }

    pub fn guidance(
      &self
    , equipment: impl Into<String>
    , locale: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GuidanceReply>,
        crate::error::Error
      >
    {   let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.guidance_tx
          .send(crate::GuidanceArgs
          {   equipment: equipment.into()
            , locale: locale.into()
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    pub fn chat(
      &self
    , message: impl Into<String>
    , context: crate::ChatContext
    , locale: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ChatReply>,
        crate::error::Error
      >
    {   let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.chat_tx
          .send(crate::ChatArgs
          {   message: message.into()
            , context
            , locale: locale.into()
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    /// Replies with at least one candidate, most confident first
    pub fn recognize(
      &self
    , image: crate::ImageUpload
    , top_k: usize
    , locale: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::RecognizeReply>,
        crate::error::Error
      >
    {   debug!("recognize queuing {} ({} bytes)", image.filename, image.bytes.len());
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.recognize_tx
          .send(crate::RecognizeArgs
          {   image
            , top_k
            , locale: locale.into()
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    /// Profile plan, or with `equipment` a plan for that one machine
    pub fn generate_plan(
      &self
    , profile: crate::Profile
    , equipment: Option<String>
    , locale: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GeneratePlanReply>,
        crate::error::Error
      >
    {   let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.generate_plan_tx
          .send(crate::GeneratePlanArgs
          {   profile
            , equipment
            , locale: locale.into()
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    pub fn profile_updated(
      &self
    , old: Option<crate::Profile>
    , new: crate::Profile
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ProfileUpdatedReply>,
        crate::error::Error
      >
    {   let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.profile_updated_tx
          .send(crate::ProfileUpdatedArgs
          {   old
            , new
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    pub fn get_usage(
      &self
    , user_id: i64
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetUsageReply>,
        crate::error::Error
      >
    {   let (reply, reply_rx) = mpsc::unbounded_channel();
        self.hand.get_usage_tx
          .send(crate::GetUsageArgs
          {   user_id
            , reply
          })
          .map_err(|_| disconnected())?;
        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down CoachBackend");
        let (reply, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.kill_process_tx
          .send(crate::KillProcessArgs { reply })
          .map_err(|_| disconnected())?;

        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   Err(disconnected())
        }
    }
}

/// Main backend event loop
///
/// tokio::select! only routes: every arm spawns the work on its own
/// task and goes back to waiting, so a slow upstream call never holds
/// up other commands.
async fn run_backend_loop(
  foot: crate::CoachFoot
, service: Arc<CoachService>
)
{   debug!("Starting CoachBackend event loop");
    let CoachFoot
    {   mut guidance_rx
      , mut chat_rx
      , mut recognize_rx
      , mut generate_plan_rx
      , mut profile_updated_rx
      , mut get_usage_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = guidance_rx.recv() => {
          debug!("Received Guidance for: {}", cmd.equipment);
          let service = service.clone();
          tokio::spawn(async move {
            let result = service.guidance(&cmd.equipment, &cmd.locale).await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = chat_rx.recv() => {
          debug!("Received Chat");
          let service = service.clone();
          tokio::spawn(async move {
            let result = service
              .chat(&cmd.message, cmd.context, &cmd.locale)
              .await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = recognize_rx.recv() => {
          debug!("Received Recognize (top_k={})", cmd.top_k);
          let service = service.clone();
          tokio::spawn(async move {
            let candidates = service
              .recognize_candidates(&cmd.image, cmd.top_k, &cmd.locale)
              .await;
            let _ = cmd.reply.send(candidates);
          });
        }
      , Some(cmd) = generate_plan_rx.recv() => {
          debug!("Received GeneratePlan (equipment={:?})", cmd.equipment);
          let service = service.clone();
          tokio::spawn(async move {
            let result = match &cmd.equipment
            {   Some(equipment) => {
                  service
                    .generate_equipment_plan(equipment, &cmd.profile, &cmd.locale)
                    .await
                }
              , None => {
                  service.generate_plan(&cmd.profile, &cmd.locale).await
                }
            };
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = profile_updated_rx.recv() => {
          debug!("Received ProfileUpdated");
          let service = service.clone();
          tokio::spawn(async move {
            let plan = service
              .on_profile_updated(cmd.old.as_ref(), &cmd.new)
              .await;
            let _ = cmd.reply.send(plan);
          });
        }
      , Some(cmd) = get_usage_rx.recv() => {
          let _ = cmd.reply.send(service.usage(cmd.user_id));
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("CoachBackend shutting down");
          break;
        }
      , else => {
          info!("All CoachBackend handles dropped");
          break;
        }
      }
    }
}
