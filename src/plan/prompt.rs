use crate::locale::Locale;
use crate::request::InferenceRequest;
use super::profile::Profile;

const SCHEMA: &str = r#"{
  "equipment": "primary equipment name",
  "recommendation": [
    {
      "name": "exercise name",
      "sets": "number of sets (e.g. 3 or 3-4)",
      "reps": "number of reps (e.g. 10-12 or 8-10)",
      "rest": "rest time (e.g. 60s or 60-90s)",
      "muscles": ["muscle group 1", "muscle group 2"],
      "instructions": "detailed step-by-step instructions, one step per line",
      "technique_tips": ["tip 1", "tip 2", "tip 3"]
    }
  ],
  "safety_notes": ["warning 1", "warning 2"],
  "technique_tips": ["general tip 1", "general tip 2"]
}"#;

fn push(
  lines: &mut Vec<String>
, locale: Locale
, label: (&str, &str)
, value: impl std::fmt::Display
)
{   lines.push(format!("{}: {}", locale.pick(label.0, label.1), value));
}

fn profile_lines(profile: &Profile, locale: Locale) -> Vec<String>
{   let mut lines = Vec::new();

    if let Some(goal) = profile.goal.as_deref().filter(|g| !g.is_empty())
    {   push(&mut lines, locale, ("Цель", "Goal"), goal);
    }
    if let Some(level) = profile.level.as_deref().filter(|l| !l.is_empty())
    {   push(&mut lines, locale, ("Уровень подготовки", "Fitness level"), level);
    }
    if let Some(age) = profile.age
    {   push(&mut lines, locale, ("Возраст", "Age"), age);
    }
    if let Some(sex) = profile.sex_or_gender()
    {   push(&mut lines, locale, ("Пол", "Sex"), sex);
    }
    if let (Some(h), Some(w)) = (profile.height_cm, profile.weight_kg)
    {   lines.push(match locale
        {   Locale::Ru => format!("Рост: {} см, Вес: {} кг", h, w)
          , Locale::En => format!("Height: {} cm, Weight: {} kg", h, w)
        });
    }
    if let Some(n) = profile.workouts_per_week
    {   push(&mut lines, locale, ("Количество тренировок в неделю", "Workouts per week"), n);
    }
    if let Some(t) = profile.goal_timeline.as_deref().filter(|t| !t.is_empty())
    {   push(&mut lines, locale, ("Срок достижения цели", "Goal timeline"), t);
    }
    if let Some(x) = profile.workout_experience.as_deref().filter(|x| !x.is_empty())
    {   push(&mut lines, locale, ("Опыт тренировок", "Training experience"), x);
    }
    if !profile.available_equipment.is_empty()
    {   push(
          &mut lines, locale
        , ("Доступное оборудование", "Available equipment")
        , profile.available_equipment.join(", ")
        );
    }
    if let Some(d) = profile.workout_duration.as_deref().filter(|d| !d.is_empty())
    {   push(&mut lines, locale, ("Продолжительность тренировки", "Workout duration"), d);
    }
    if let Some(a) = profile.activity_level.as_deref().filter(|a| !a.is_empty())
    {   push(&mut lines, locale, ("Уровень активности", "Activity level"), a);
    }
    if let Some(i) = profile.intensity_preference.as_deref().filter(|i| !i.is_empty())
    {   push(&mut lines, locale, ("Предпочтения по интенсивности", "Intensity preference"), i);
    }
    if !profile.favorite_muscle_groups.is_empty()
    {   push(
          &mut lines, locale
        , ("Приоритетные группы мышц", "Priority muscle groups")
        , profile.favorite_muscle_groups.join(", ")
        );
    }
    if let Some(injuries) = profile.injuries()
    {   push(&mut lines, locale, ("Травмы и ограничения", "Injuries and limitations"), injuries);
        lines.push(locale.pick(
          "ВАЖНО: Учти эти ограничения и предложи безопасные альтернативные упражнения!"
        , "IMPORTANT: Respect these limitations and substitute safe alternative exercises!"
        ).to_string());
    }
    if !profile.health_flags.is_empty()
    {   push(
          &mut lines, locale
        , ("Проблемы со здоровьем", "Health issues")
        , profile.health_flags.join(", ")
        );
    }
    if let Some(diet) = profile.diet_type.as_deref().filter(|d| !d.is_empty())
    {   push(&mut lines, locale, ("Тип диеты", "Diet type"), diet);
    }
    if let Some(w) = profile.desired_weight
    {   lines.push(match locale
        {   Locale::Ru => format!("Желаемый вес: {} кг", w)
          , Locale::En => format!("Desired weight: {} kg", w)
        });
    }
    lines
}

const REQUIREMENTS_RU: [&str; 8] = [
  "1. Создай 4-6 упражнений, подходящих для цели и уровня пользователя"
, "2. Для каждого упражнения укажи конкретные группы мышц, которые работают"
, "3. Инструкции должны быть подробными и пошаговыми (каждый шаг с новой строки)"
, "4. Добавь 2-3 совета по технике для каждого упражнения"
, "5. Учти доступное оборудование пользователя"
, "6. Если есть травмы/ограничения, предложи безопасные альтернативы"
, "7. Количество подходов и повторений должно соответствовать цели пользователя"
, "8. Время отдыха должно быть указано для каждого упражнения"
];

const REQUIREMENTS_EN: [&str; 8] = [
  "1. Create 4-6 exercises suited to the user's goal and level"
, "2. List the specific muscle groups each exercise works"
, "3. Instructions must be detailed and step by step (one step per line)"
, "4. Add 2-3 technique tips per exercise"
, "5. Use the user's available equipment"
, "6. If there are injuries or limitations, suggest safe alternatives"
, "7. Sets and reps must match the user's goal"
, "8. Give a rest time for every exercise"
];

/// User prompt listing every populated profile field followed by the
/// JSON schema the reply must follow
pub fn plan_prompt(profile: &Profile, locale: Locale) -> String
{   let mut lines = vec![
      locale.pick(
        "Ты — профессиональный фитнес-тренер. Создай персонализированный план тренировок на основе данных пользователя."
      , "You are a professional fitness coach. Create a personalized workout plan from the user's data."
      ).to_string()
    , String::new()
    , locale.pick("ДАННЫЕ ПОЛЬЗОВАТЕЛЯ:", "USER DATA:").to_string()
    ];
    lines.extend(profile_lines(profile, locale));

    lines.push(String::new());
    lines.push(locale.pick("ЗАДАНИЕ:", "TASK:").to_string());
    lines.push(locale.pick(
      "Создай детальный план тренировок в формате JSON со следующей структурой:"
    , "Create a detailed workout plan as JSON with the following structure:"
    ).to_string());
    lines.push(SCHEMA.to_string());
    lines.push(String::new());
    lines.push(locale.pick("ТРЕБОВАНИЯ:", "REQUIREMENTS:").to_string());
    let requirements = match locale
    {   Locale::Ru => REQUIREMENTS_RU
      , Locale::En => REQUIREMENTS_EN
    };
    lines.extend(requirements.iter().map(|r| r.to_string()));
    lines.push(String::new());
    lines.push(locale.pick(
      "Верни ТОЛЬКО валидный JSON, без дополнительных пояснений."
    , "Return ONLY valid JSON, without additional explanations."
    ).to_string());

    lines.join("\n")
}

pub fn plan_request(model: &str, profile: &Profile, locale: Locale) -> InferenceRequest
{   InferenceRequest::builder(model)
      .system(locale.pick(
        "Ты — профессиональный фитнес-тренер. Отвечай ТОЛЬКО валидным JSON без дополнительных пояснений."
      , "You are a professional fitness coach. Respond ONLY with valid JSON without additional explanations."
      ))
      .user(plan_prompt(profile, locale))
      .max_tokens(3000)
      .temperature(0.3)
      .json_output()
      .build()
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn injuries_steer_substitution()
    {   let profile = Profile
        {   goal: Some("strength".into())
          , injuries_limitations: Some("knee surgery".into())
          , available_equipment: vec!["Barbell".into(), "Bench".into()]
          , ..Profile::default()
        };
        let prompt = plan_prompt(&profile, Locale::En);
        assert!(prompt.contains("Goal: strength"));
        assert!(prompt.contains("Available equipment: Barbell, Bench"));
        assert!(prompt.contains("Injuries and limitations: knee surgery"));
        assert!(prompt.contains("IMPORTANT"));
        assert!(!prompt.contains("Age:"));
    }

    #[test]
    fn none_injury_is_skipped()
    {   let profile = Profile
        {   injuries_limitations: Some("None".into())
          , ..Profile::default()
        };
        assert!(!plan_prompt(&profile, Locale::Ru).contains("ВАЖНО"));
    }
}
