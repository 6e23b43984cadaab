//! Equipment recognition: vision model first, heuristic when it fails

use std::path::Path;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use log::{debug, warn};
use crate::dispatch::RequestDispatcher;
use crate::error::{Error, ErrorKind};
use crate::failover::Outcome;
use crate::locale::Locale;
use crate::request::{InferenceRequest, InlineImage, Message};
use crate::schema::strip_code_fence;
use crate::store::Store;

pub mod heuristic;

use heuristic::{heuristic_candidates, CatalogEntry};

const EQUIPMENT_NAMES: &str = "Dumbbell, Barbell, Bench, Cable Machine, \
  Smith Machine, Leg Press Machine, Lat Pulldown Machine, \
  Leg Extension Machine, Leg Curl Machine, Chest Press Machine, \
  Shoulder Press Machine, Rowing Machine, Hack Squat Machine, \
  Pec Deck Machine, Pull-Up Bar, Dip Station, Kettlebell, Resistance Band";

/// One equipment-label hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate
{   pub equipment: String
  , /// Always within [0, 1]
    pub confidence: f64
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>
}

impl Candidate
{   pub fn new(equipment: impl Into<String>, confidence: f64) -> Self
    {   Candidate
        {   equipment: equipment.into()
          , confidence: clamp_confidence(confidence)
          , description: None
        }
    }
}

fn clamp_confidence(c: f64) -> f64
{   if c.is_nan()
    {   0.5
    } else
    {   c.clamp(0.0, 1.0)
    }
}

/// An uploaded photo
#[derive(Debug, Clone)]
pub struct ImageUpload
{   pub filename: String
  , pub bytes: Vec<u8>
}

impl ImageUpload
{   pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self
    {   ImageUpload
        {   filename: filename.into()
          , bytes
        }
    }

    pub async fn from_path(path: impl AsRef<Path>)
      -> Result<Self, Error>
    {   let path = path.as_ref();
        let bytes = tokio::fs::read(path).await
          .map_err(|e| {
            Error::Io(format!("{}: {}", path.display(), e))
          })?;
        Ok(ImageUpload::new(path.to_string_lossy(), bytes))
    }

    pub fn inline(&self) -> InlineImage
    {   InlineImage::from_bytes(&self.filename, &self.bytes)
    }
}

// ===== Model reply schema =====

#[derive(Debug, Deserialize)]
struct RecognitionReply
{   #[serde(default)]
    equipment: Option<String>
  , #[serde(default)]
    confidence: Option<serde_json::Value>
  , #[serde(default)]
    description: Option<String>
  , #[serde(default)]
    candidates: Option<Vec<serde_json::Value>>
}

#[derive(Debug, Deserialize)]
struct ReplyCandidate
{   equipment: String
  , #[serde(default)]
    confidence: Option<serde_json::Value>
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.5
fn confidence_value(value: Option<&serde_json::Value>) -> f64
{   let raw = match value
    {   Some(serde_json::Value::Number(n)) => n.as_f64()
      , Some(serde_json::Value::String(s)) => s.trim().parse().ok()
      , _ => None
    };
    clamp_confidence(raw.unwrap_or(0.5))
}

fn parse_error(message: impl Into<String>) -> Error
{   Error::fatal(ErrorKind::ParseError, message, 1)
}

/// Accepts either `{"equipment": ...}` or `{"candidates": [...]}` and
/// returns a non-empty list sorted by confidence
pub fn parse_recognition(content: &str, top_k: usize)
  -> Result<Vec<Candidate>, Error>
{   let reply: RecognitionReply = serde_json::from_str(strip_code_fence(content))
      .map_err(|e| parse_error(format!("Recognition reply is not JSON: {}", e)))?;

    let mut candidates: Vec<Candidate> = match reply.candidates
    {   Some(items) => items
          .into_iter()
          .filter_map(|v| serde_json::from_value::<ReplyCandidate>(v).ok())
          .map(|c| Candidate::new(
            c.equipment.trim()
          , confidence_value(c.confidence.as_ref())
          ))
          .collect()
      , None => Vec::new()
    };

    if candidates.is_empty()
    {   if let Some(name) = reply.equipment
        {   let mut single = Candidate::new(
              name.trim()
            , confidence_value(reply.confidence.as_ref())
            );
            let description = reply.description
              .map(|d| d.trim().to_string())
              .filter(|d| !d.is_empty())
              .unwrap_or_else(|| format!("Recognized equipment: {}", single.equipment));
            single.description = Some(description);
            candidates.push(single);
        }
    }

    candidates.retain(|c| {
      !c.equipment.is_empty()
        && !c.equipment.eq_ignore_ascii_case("unknown")
    });
    if candidates.is_empty()
    {   return Err(parse_error("Recognition reply named no equipment"));
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.truncate(top_k.max(1));
    Ok(candidates)
}

fn recognition_request(
  model: &str
, image: &ImageUpload
, top_k: usize
, locale: Locale
) -> InferenceRequest
{   let system = locale.pick(
      "Ты — эксперт по распознаванию тренажерного оборудования. \
       Анализируй изображение и определи, какой тренажер на нем изображен. \
       Отвечай только JSON без дополнительных пояснений."
    , "You are an expert at recognizing gym equipment. \
       Analyze the image and identify what equipment is shown. \
       Respond only in JSON without additional explanations."
    );

    let (user, max_tokens) = if top_k <= 1
    {   let text = match locale
        {   Locale::Ru => format!(
              "Определи, какой тренажер изображен на этой фотографии. \
               Верни JSON с ключами: equipment (название на английском, например: {}), \
               confidence (число от 0 до 1), description (краткое описание на русском). \
               Если тренажер не распознан, верни equipment: 'Unknown', confidence: 0.1",
              EQUIPMENT_NAMES
            )
          , Locale::En => format!(
              "Identify what gym equipment is shown in this photo. \
               Return JSON with keys: equipment (name in English, e.g.: {}), \
               confidence (number from 0 to 1), description (brief description). \
               If equipment is not recognized, return equipment: 'Unknown', confidence: 0.1",
              EQUIPMENT_NAMES
            )
        };
        (text, 500)
    } else
    {   let text = match locale
        {   Locale::Ru => format!(
              "Определи {} наиболее вероятных тренажеров на этой фотографии. \
               Верни JSON с ключом 'candidates' (массив объектов), каждый объект содержит: \
               equipment (название на английском: {}), confidence (число от 0 до 1). \
               Отсортируй по убыванию confidence.",
              top_k, EQUIPMENT_NAMES
            )
          , Locale::En => format!(
              "Identify the {} most likely gym equipment items in this photo. \
               Return JSON with key 'candidates' (array of objects), each containing: \
               equipment (name in English: {}), confidence (number from 0 to 1). \
               Sort by confidence descending.",
              top_k, EQUIPMENT_NAMES
            )
        };
        (text, 800)
    };

    InferenceRequest::builder(model)
      .system(system)
      .message(Message::user_with_image(user, image.inline()))
      .max_tokens(max_tokens)
      .temperature(0.1)
      .json_output()
      .build()
}

/// Vision recognition wrapped with a heuristic fallback. Never fails.
pub struct RecognitionFallbackChain
{   dispatcher: RequestDispatcher
  , store: Arc<dyn Store>
  , model: String
  , offline: bool
}

impl RecognitionFallbackChain
{   pub fn new(
      dispatcher: RequestDispatcher
    , store: Arc<dyn Store>
    , model: impl Into<String>
    ) -> Self
    {   RecognitionFallbackChain
        {   dispatcher
          , store
          , model: model.into()
          , offline: false
        }
    }

    /// Offline chains skip the vision model and go straight to the heuristic
    pub fn with_offline(mut self, offline: bool) -> Self
    {   self.offline = offline;
        self
    }

    /// Best single candidate
    pub async fn recognize(
      &self
    , image: &ImageUpload
    , locale: Locale
    ) -> Candidate
    {   let mut candidates = self.recognize_candidates(image, 1, locale)
          .await;
        // recognize_candidates never returns an empty list
        if candidates.is_empty()
        {   candidates.push(Candidate::new(
              heuristic::COMMON_EQUIPMENT[0]
            , heuristic::CATALOG_ANCHOR
            ));
        }
        candidates.swap_remove(0)
    }

    /// Up to `top_k` candidates, most confident first; at least one
    pub async fn recognize_candidates(
      &self
    , image: &ImageUpload
    , top_k: usize
    , locale: Locale
    ) -> Vec<Candidate>
    {   match self.recognize_outcome(image, top_k, locale).await
        {   Outcome::Ok(c) | Outcome::Fallback(c, _) => c
          , Outcome::Fatal(_) => {
              self.heuristic(&image.filename, top_k).await
            }
        }
    }

    /// Which path produced the candidates, and why the primary failed
    pub async fn recognize_outcome(
      &self
    , image: &ImageUpload
    , top_k: usize
    , locale: Locale
    ) -> Outcome<Vec<Candidate>>
    {   let top_k = top_k.max(1);
        if self.offline
        {   debug!("Offline, using heuristic for {}", image.filename);
            let candidates = self.heuristic(&image.filename, top_k).await;
            return Outcome::Fallback(
              candidates
            , Error::fatal(
                ErrorKind::InvalidCredential
              , "Offline mode: no API key configured"
              , 0
              )
            );
        }
        match self.primary(image, top_k, locale).await
        {   Ok(candidates) => {
              debug!(
                "Vision recognition returned {} candidate(s)",
                candidates.len()
              );
              Outcome::Ok(candidates)
            }
          , Err(reason) => {
              warn!(
                "Vision recognition failed for {}, using heuristic: {}",
                image.filename, reason
              );
              let fallback = self.heuristic(&image.filename, top_k).await;
              Outcome::Fallback(fallback, reason)
            }
        }
    }

    async fn primary(
      &self
    , image: &ImageUpload
    , top_k: usize
    , locale: Locale
    ) -> Result<Vec<Candidate>, Error>
    {   let request = recognition_request(&self.model, image, top_k, locale);
        let content = self.dispatcher.dispatch(&request).await?;
        parse_recognition(&content, top_k)
    }

    async fn catalog(&self) -> Vec<CatalogEntry>
    {   let equipment = match self.store.list_equipment().await
        {   Ok(list) => list
          , Err(e) => {
              warn!("Equipment catalog unavailable: {}", e);
              return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(equipment.len());
        for item in equipment
        {   let exercise_count = match self.store
              .list_exercises(Some(item.id))
              .await
            {   Ok(list) => list.len()
              , Err(e) => {
                  debug!("No exercises for {}: {}", item.name, e);
                  0
                }
            };
            entries.push(CatalogEntry
            {   name: item.name
              , exercise_count
            });
        }
        entries
    }

    async fn heuristic(&self, filename: &str, top_k: usize) -> Vec<Candidate>
    {   let catalog = self.catalog().await;
        let mut rng = rand::thread_rng();
        heuristic_candidates(filename, &catalog, top_k, &mut rng)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn single_guess_is_clamped()
    {   let out = parse_recognition(
          r#"{"equipment":"Bench","confidence":1.7,"description":"flat bench"}"#
        , 3
        ).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 1.0);
        assert_eq!(out[0].description.as_deref(), Some("flat bench"));
    }

    #[test]
    fn single_guess_without_description_gets_one()
    {   for reply in [
          r#"{"equipment":"Rowing Machine","confidence":0.8}"#
        , r#"{"equipment":"Rowing Machine","confidence":0.8,"description":"  "}"#
        ]
        {   let out = parse_recognition(reply, 1).unwrap();
            assert_eq!(
              out[0].description.as_deref()
            , Some("Recognized equipment: Rowing Machine")
            );
        }
    }

    #[test]
    fn candidates_are_sorted_and_truncated()
    {   let out = parse_recognition(
          r#"{"candidates":[
               {"equipment":"Bench","confidence":0.1},
               {"equipment":"Barbell","confidence":"0.6"},
               {"equipment":"Dumbbell"},
               {"confidence":0.9}
             ]}"#
        , 2
        ).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].equipment, "Barbell");
        assert_eq!(out[1].equipment, "Dumbbell");
        assert_eq!(out[1].confidence, 0.5);
    }

    #[test]
    fn unknown_only_is_rejected()
    {   let err = parse_recognition(
          r#"{"equipment":"Unknown","confidence":0.1}"#
        , 1
        ).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ParseError));
    }
}
