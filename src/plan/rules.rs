//! Rule-based plan generation. Deterministic and infallible.

use crate::guidance::Guidance;
use crate::locale::Locale;
use super::draft::{PlanDraft, PlanExercise};
use super::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepScheme
{   pub sets: &'static str
  , pub reps: &'static str
  , pub rest: &'static str
}

/// Sets, reps and rest per goal; unknown goals train for muscle gain
pub fn rep_scheme(goal: &str) -> RepScheme
{   match goal
    {   "fat_loss" => RepScheme { sets: "3-4", reps: "12-15", rest: "45-60s" }
      , "strength" => RepScheme { sets: "4-5", reps: "4-6", rest: "120-180s" }
      , "endurance" => RepScheme { sets: "2-4", reps: "15-20", rest: "30-60s" }
      , "rehab" => RepScheme { sets: "2-3", reps: "10-15", rest: "60-90s" }
      , _ => RepScheme { sets: "3-4", reps: "8-12", rest: "60-90s" }
    }
}

/// Scheme for plans built from equipment guidance. Fat loss rests a
/// little longer between sets than in the substitute plan.
pub fn equipment_rep_scheme(goal: &str) -> RepScheme
{   match goal
    {   "fat_loss" => RepScheme { rest: "45-75s", ..rep_scheme(goal) }
      , _ => rep_scheme(goal)
    }
}

struct LibraryExercise
{   name: (&'static str, &'static str)
  , muscles: (&'static [&'static str], &'static [&'static str])
  , instructions: (&'static str, &'static str)
  , tips: (&'static [&'static str], &'static [&'static str])
}

/// (ru, en) pairs: chest, back, legs, shoulders
const LIBRARY: [LibraryExercise; 4] = [
  LibraryExercise
  {   name: ("Жим гантелей лежа", "Dumbbell Bench Press")
    , muscles: (&["Грудь", "Плечи", "Трицепс"], &["Chest", "Shoulders", "Triceps"])
    , instructions: (
        "1. Лягте на скамью, возьмите гантели в руки. 2. Опустите гантели к груди контролируемым движением. 3. Выжмите гантели вверх, выдыхая. 4. Вернитесь в исходное положение."
      , "1. Lie on the bench holding the dumbbells. 2. Lower them to your chest under control. 3. Press them up while exhaling. 4. Return to the start position."
      )
    , tips: (
        &["Держите запястья прямо", "Не отрывайте ноги от пола", "Контролируйте движение вниз"]
      , &["Keep your wrists straight", "Keep your feet on the floor", "Control the lowering phase"]
      )
  }
, LibraryExercise
  {   name: ("Тяга гантелей в наклоне", "Bent-Over Dumbbell Row")
    , muscles: (&["Спина", "Бицепс"], &["Back", "Biceps"])
    , instructions: (
        "1. Наклонитесь вперед с гантелями в руках. 2. Подтяните гантели к поясу, сводя лопатки. 3. Опустите гантели контролируемо. 4. Повторите движение."
      , "1. Hinge forward holding the dumbbells. 2. Pull them to your waist, squeezing the shoulder blades. 3. Lower them under control. 4. Repeat."
      )
    , tips: (
        &["Держите спину прямой", "Не раскачивайтесь", "Фокусируйтесь на работе спины"]
      , &["Keep your back straight", "Do not swing", "Focus on the back muscles"]
      )
  }
, LibraryExercise
  {   name: ("Приседания с гантелями", "Dumbbell Squat")
    , muscles: (&["Квадрицепс", "Ягодицы", "Бицепс бедра"], &["Quadriceps", "Glutes", "Hamstrings"])
    , instructions: (
        "1. Встаньте прямо, держа гантели у плеч. 2. Опуститесь в присед, отводя таз назад. 3. Опуститесь до параллели бедер с полом. 4. Вернитесь в исходное положение, выдыхая."
      , "1. Stand tall holding the dumbbells at your shoulders. 2. Squat down pushing the hips back. 3. Descend until the thighs are parallel to the floor. 4. Stand back up while exhaling."
      )
    , tips: (
        &["Держите колени над стопами", "Не округляйте спину", "Вес на пятках"]
      , &["Keep your knees over your feet", "Do not round your back", "Keep the weight on your heels"]
      )
  }
, LibraryExercise
  {   name: ("Жим гантелей стоя", "Standing Dumbbell Press")
    , muscles: (&["Плечи", "Трицепс"], &["Shoulders", "Triceps"])
    , instructions: (
        "1. Встаньте прямо, держа гантели на уровне плеч. 2. Выжмите гантели вверх над головой. 3. Опустите гантели контролируемо к плечам. 4. Повторите движение."
      , "1. Stand tall holding the dumbbells at shoulder height. 2. Press them overhead. 3. Lower them to your shoulders under control. 4. Repeat."
      )
    , tips: (
        &["Держите корпус напряженным", "Не прогибайтесь в пояснице", "Контролируйте движение"]
      , &["Brace your core", "Do not arch your lower back", "Control the movement"]
      )
  }
];

fn strings(items: &[&str]) -> Vec<String>
{   items.iter().map(|s| s.to_string()).collect()
}

fn generic_safety(locale: Locale) -> Vec<String>
{   strings(match locale
    {   Locale::Ru => &[
          "Обязательно делайте разминку 5-10 минут перед тренировкой"
        , "Останавливайтесь при появлении боли"
        , "Следите за правильной техникой выполнения"
        ]
      , Locale::En => &[
          "Always warm up for 5-10 minutes before training"
        , "Stop if you feel pain"
        , "Keep proper form throughout every set"
        ]
    })
}

fn generic_tips(locale: Locale) -> Vec<String>
{   strings(match locale
    {   Locale::Ru => &[
          "Дышите правильно: выдох на усилии, вдох на расслаблении"
        , "Начинайте с легкого веса и постепенно увеличивайте нагрузку"
        , "Отдыхайте между подходами согласно указанному времени"
        ]
      , Locale::En => &[
          "Exhale on effort, inhale on release"
        , "Start light and increase the load gradually"
        , "Rest between sets for the listed time"
        ]
    })
}

/// Extra safety notes for known health flags
pub fn health_notes(flags: &[String], locale: Locale) -> Vec<String>
{   let mut notes = Vec::new();
    let has = |flag: &str| flags.iter().any(|f| f == flag);
    if has("knee_pain")
    {   notes.push(locale.pick(
          "При проблемах с коленями уменьшайте амплитуду и избегайте боли."
        , "With knee problems, shorten the range of motion and avoid pain."
        ).to_string());
    }
    if has("lower_back_pain")
    {   notes.push(locale.pick(
          "Держите нейтральную спину, избегайте гиперпрогиба, снизьте нагрузку."
        , "Keep a neutral spine, avoid overarching, and reduce the load."
        ).to_string());
    }
    if has("shoulder_pain")
    {   notes.push(locale.pick(
          "Избегайте чрезмерной ротации плеча, работайте в комфортной амплитуде."
        , "Avoid excessive shoulder rotation and stay within a comfortable range."
        ).to_string());
    }
    notes
}

/// Substitute plan when the model cannot be used
pub fn fallback_plan(
  profile: &Profile
, equipment: &str
, locale: Locale
) -> PlanDraft
{   let goal = profile.goal_or_default();
    let scheme = rep_scheme(goal);

    let recommendation = LIBRARY
      .iter()
      .map(|ex| {
        let (name, muscles, instructions, tips) = match locale
        {   Locale::Ru => (ex.name.0, ex.muscles.0, ex.instructions.0, ex.tips.0)
          , Locale::En => (ex.name.1, ex.muscles.1, ex.instructions.1, ex.tips.1)
        };
        PlanExercise
        {   name: name.to_string()
          , sets: scheme.sets.to_string()
          , reps: scheme.reps.to_string()
          , rest: scheme.rest.to_string()
          , muscles: strings(muscles)
          , instructions: instructions.to_string()
          , technique_tips: strings(tips)
        }
      })
      .collect();

    let mut safety_notes = generic_safety(locale);
    safety_notes.extend(health_notes(&profile.health_flags, locale));

    PlanDraft
    {   equipment: equipment.to_string()
      , goal: goal.to_string()
      , level: profile.level_or_default().to_string()
      , recommendation
      , safety_notes
      , technique_tips: generic_tips(locale)
    }
}

/// Plan for a single machine built from its guidance: the first four
/// exercises with the goal's rep scheme
pub fn plan_from_guidance(
  equipment: &str
, guidance: &Guidance
, profile: &Profile
, locale: Locale
) -> PlanDraft
{   let goal = profile.goal_or_default();
    let scheme = equipment_rep_scheme(goal);

    let recommendation = guidance.exercises
      .iter()
      .take(4)
      .map(|ex| PlanExercise
      {   name: if ex.name.is_empty()
          {   "Exercise".to_string()
          } else
          {   ex.name.clone()
          }
        , sets: scheme.sets.to_string()
        , reps: scheme.reps.to_string()
        , rest: scheme.rest.to_string()
        , muscles: ex.muscles.clone()
        , instructions: ex.steps.join(" ")
        , technique_tips: Vec::new()
      })
      .collect();

    let mut safety_notes = guidance.safety.clone();
    safety_notes.extend(health_notes(&profile.health_flags, locale));

    let technique_tips = if guidance.description.is_empty()
    {   Vec::new()
    } else
    {   vec![guidance.description.clone()]
    };

    PlanDraft
    {   equipment: equipment.to_string()
      , goal: goal.to_string()
      , level: profile.level_or_default().to_string()
      , recommendation
      , safety_notes
      , technique_tips
    }
}
