//! Equipment guidance and free-form coaching chat

use serde::{Deserialize, Serialize};
use crate::error::{Error, ErrorKind};
use crate::locale::Locale;
use crate::plan::Profile;
use crate::request::InferenceRequest;
use crate::schema::{strip_code_fence, TextOrList};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceExercise
{   pub name: String
  , pub muscles: Vec<String>
  , pub steps: Vec<String>
}

/// How to use one piece of equipment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance
{   pub description: String
  , pub exercises: Vec<GuidanceExercise>
  , pub safety: Vec<String>
}

#[derive(Debug, Deserialize)]
struct GuidanceReply
{   #[serde(default)]
    description: Option<String>
  , #[serde(default)]
    exercises: Vec<ExerciseReply>
  , #[serde(default)]
    safety: Option<TextOrList>
}

#[derive(Debug, Deserialize)]
struct ExerciseReply
{   #[serde(default)]
    name: Option<String>
  , #[serde(default)]
    muscles: Option<TextOrList>
  , #[serde(default)]
    steps: Option<TextOrList>
}

/// Missing fields default to empty; anything that is not a JSON object
/// of the expected shape is a ParseError
pub fn parse_guidance(content: &str) -> Result<Guidance, Error>
{   let reply: GuidanceReply = serde_json::from_str(strip_code_fence(content))
      .map_err(|e| {
        Error::fatal(
          ErrorKind::ParseError
        , format!("Guidance reply does not match schema: {}", e)
        , 1
        )
      })?;

    Ok(Guidance
    {   description: reply.description
          .map(|d| d.trim().to_string())
          .unwrap_or_default()
      , exercises: reply.exercises
          .into_iter()
          .map(|ex| GuidanceExercise
          {   name: ex.name
                .map(|n| n.trim().to_string())
                .unwrap_or_default()
            , muscles: ex.muscles
                .map(TextOrList::into_split_list)
                .unwrap_or_default()
            , steps: ex.steps
                .map(TextOrList::into_list)
                .unwrap_or_default()
          })
          .collect()
      , safety: reply.safety
          .map(TextOrList::into_list)
          .unwrap_or_default()
    })
}

pub fn guidance_request(model: &str, equipment: &str, locale: Locale) -> InferenceRequest
{   let (system, user) = match locale
    {   Locale::Ru => (
          "Ты — эксперт по тренажёрам и технике упражнений. Отвечай кратко, \
           структурировано, на языке пользователя. Возвращай только JSON, без пояснений."
            .to_string()
        , format!(
            "Сформируй краткое описание, 4-6 подходящих упражнений и пошаговую \
             инструкцию по технике и безопасности для тренажёра: {}. Верни JSON с \
             ключами: description (string), exercises (array of objects: name, muscles, \
             steps [array of strings]), safety (array of strings).",
            equipment
          )
        )
      , Locale::En => (
          "You are an expert in gym equipment and exercise technique. Reply briefly \
           and in a structured way. Return only JSON, without explanations."
            .to_string()
        , format!(
            "Write a short description, 4-6 suitable exercises and step-by-step \
             technique and safety instructions for the equipment: {}. Return JSON with \
             keys: description (string), exercises (array of objects: name, muscles, \
             steps [array of strings]), safety (array of strings).",
            equipment
          )
        )
    };

    InferenceRequest::builder(model)
      .system(system)
      .user(user)
      .max_tokens(1000)
      .temperature(0.3)
      .json_output()
      .build()
}

/// What the coach knows about the asker
#[derive(Debug, Clone, Default)]
pub struct ChatContext
{   pub profile: Option<Profile>
  , pub equipment: Option<String>
}

impl ChatContext
{   pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self
    {   self.equipment = Some(equipment.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self
    {   self.profile = Some(profile);
        self
    }

    fn preamble(&self, locale: Locale) -> String
    {   let mut out = String::new();
        if let Some(profile) = &self.profile
        {   let level = profile.level.as_deref()
              .unwrap_or(locale.pick("не указан", "not set"));
            let goal = profile.goal.as_deref()
              .unwrap_or(locale.pick("не указана", "not set"));
            out.push_str(&match locale
            {   Locale::Ru => format!(
                  "\nПрофиль пользователя: уровень - {}, цель - {}",
                  level, goal
                )
              , Locale::En => format!(
                  "\nUser profile: level - {}, goal - {}",
                  level, goal
                )
            });
        }
        if let Some(equipment) = self.equipment.as_deref().filter(|e| !e.is_empty())
        {   out.push_str(&format!(
              "\n{}: {}",
              locale.pick("Текущий тренажер", "Current equipment"),
              equipment
            ));
        }
        out
    }
}

pub fn chat_request(
  model: &str
, message: &str
, context: &ChatContext
, locale: Locale
) -> InferenceRequest
{   let system = locale.pick(
      "Ты — профессиональный фитнес-тренер и эксперт по тренировкам. \
       Отвечай на вопросы пользователей о тренировках, питании, технике упражнений, \
       программах тренировок и здоровье. Будь дружелюбным, профессиональным и полезным. \
       Всегда подчеркивай важность безопасности и консультации с врачом при необходимости."
    , "You are a professional fitness coach and training expert. \
       Answer questions about training, nutrition, exercise technique, \
       workout programs and health. Be friendly, professional and helpful. \
       Always stress safety and seeing a doctor when needed."
    );

    let preamble = context.preamble(locale);
    let user = if preamble.is_empty()
    {   message.to_string()
    } else
    {   format!(
          "{}\n\n{}: {}",
          preamble,
          locale.pick("Вопрос пользователя", "User question"),
          message
        )
    };

    InferenceRequest::builder(model)
      .system(system)
      .user(user)
      .max_tokens(1000)
      .temperature(0.7)
      .build()
}

// ===== Offline answers =====

fn owned(items: &[&str]) -> Vec<String>
{   items.iter().map(|s| s.to_string()).collect()
}

/// Canned guidance for offline mode
pub fn offline_guidance(equipment: &str, locale: Locale) -> Guidance
{   match locale
    {   Locale::Ru => Guidance
        {   description: format!(
              "Краткое описание тренажёра {} и его назначение.",
              equipment
            )
          , exercises: vec![
              GuidanceExercise
              {   name: "Базовое упражнение 1".to_string()
                , muscles: owned(&["Грудь", "плечи"])
                , steps: owned(&[
                    "Настройте высоту/сиденье."
                  , "Примите устойчивое положение."
                  , "Двигайтесь в контролируемом темпе."
                  ])
              }
            , GuidanceExercise
              {   name: "Базовое упражнение 2".to_string()
                , muscles: owned(&["Спина", "бицепс"])
                , steps: owned(&[
                    "Выберите умеренный вес."
                  , "Сохраняйте нейтральную спину."
                  , "Не раскачивайтесь."
                  ])
              }
            ]
          , safety: owned(&[
              "Разминка 5–10 минут перед началом."
            , "Следите за дыханием и амплитудой движения."
            , "Останавливайтесь при боли или дискомфорте."
            ])
        }
      , Locale::En => Guidance
        {   description: format!(
              "A short description of the {} and what it is for.",
              equipment
            )
          , exercises: vec![
              GuidanceExercise
              {   name: "Basic exercise 1".to_string()
                , muscles: owned(&["Chest", "shoulders"])
                , steps: owned(&[
                    "Adjust the height or seat."
                  , "Take a stable position."
                  , "Move at a controlled pace."
                  ])
              }
            , GuidanceExercise
              {   name: "Basic exercise 2".to_string()
                , muscles: owned(&["Back", "biceps"])
                , steps: owned(&[
                    "Pick a moderate weight."
                  , "Keep a neutral spine."
                  , "Do not swing."
                  ])
              }
            ]
          , safety: owned(&[
              "Warm up for 5-10 minutes first."
            , "Watch your breathing and range of motion."
            , "Stop if you feel pain or discomfort."
            ])
        }
    }
}

/// Canned chat answer with general advice, quoting the question back
pub fn offline_chat_reply(message: &str, locale: Locale) -> String
{   match locale
    {   Locale::Ru => format!(
          "Привет! Я ваш фитнес-ассистент. По вашему вопросу '{}':\n\n\
           Для полноценной работы ИИ-ассистента необходимо установить OPENAI_API_KEY. \
           Без ключа я могу дать общие советы:\n\n\
           - Всегда начинайте с разминки\n\
           - Следите за правильной техникой выполнения упражнений\n\
           - Увеличивайте нагрузку постепенно\n\
           - Отдыхайте между тренировками\n\
           - Пейте достаточно воды\n\n\
           Для получения персонализированных рекомендаций установите API ключ OpenAI.",
          message
        )
      , Locale::En => format!(
          "Hi! I'm your fitness assistant. About your question '{}':\n\n\
           The AI assistant needs OPENAI_API_KEY to be set. \
           Until then, some general advice:\n\n\
           - Always start with a warm-up\n\
           - Keep proper form on every exercise\n\
           - Increase the load gradually\n\
           - Rest between workouts\n\
           - Drink enough water\n\n\
           Set an OpenAI API key for personalized recommendations.",
          message
        )
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn muscles_as_text_are_split()
    {   let g = parse_guidance(
          r#"{"description":"Bench","exercises":[{"name":"Press","muscles":"Chest, Triceps","steps":["Lie","Press"]}]}"#
        ).unwrap();
        assert_eq!(g.exercises[0].muscles, vec!["Chest", "Triceps"]);
        assert!(g.safety.is_empty());
    }

    #[test]
    fn plain_text_is_rejected()
    {   let err = parse_guidance("Sorry, I can't help").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ParseError));
    }

    #[test]
    fn context_is_quoted_before_question()
    {   let context = ChatContext::default()
          .with_profile(Profile
          {   level: Some("advanced".into())
            , goal: Some("strength".into())
            , ..Profile::default()
          })
          .with_equipment("Smith Machine");
        let req = chat_request("m", "How deep?", &context, Locale::En);
        let crate::request::ContentPart::Text(user) = &req.messages()[1].parts[0]
        else
        {   panic!("expected text");
        };
        assert!(user.contains("level - advanced, goal - strength"));
        assert!(user.contains("Current equipment: Smith Machine"));
        assert!(user.ends_with("User question: How deep?"));
    }
}
