//! Deterministic recognition used when the vision path fails

use std::path::Path;
use rand::seq::SliceRandom;
use rand::Rng;
use super::Candidate;

/// Filename keywords per known equipment class, most specific first
pub const EQUIPMENT_KEYWORDS: &[(&str, &[&str])] = &[
  ("Dumbbell", &["dumbbell", "dumb", "гантел"])
, ("Barbell", &["barbell", "bar", "штанга"])
, ("Bench", &["bench", "скамья", "скамейка"])
, ("Cable Machine", &["cable", "трос", "блок"])
, ("Smith Machine", &["smith", "смит"])
, ("Kettlebell", &["kettlebell", "kettle", "гиря"])
, ("Leg Press Machine", &["leg press", "leg_press", "жим ногами"])
, ("Lat Pulldown Machine", &["pulldown", "тяга верхнего блока"])
, ("Leg Extension Machine", &["extension", "разгибание"])
, ("Leg Curl Machine", &["curl", "сгибание"])
, ("Chest Press Machine", &["chest press", "chest_press", "жим от груди"])
, ("Shoulder Press Machine", &["shoulder press", "shoulder_press", "жим над головой"])
, ("Rowing Machine", &["row", "гребля"])
, ("Hack Squat Machine", &["hack", "гакк"])
, ("Pec Deck Machine", &["pec deck", "pec_deck", "бабочка"])
, ("Pull-Up Bar", &["pull", "pullup", "турник"])
, ("Dip Station", &["dip", "брусья"])
];

/// Used when the catalog is empty or unreadable
pub const COMMON_EQUIPMENT: &[&str] = &[
  "Dumbbell"
, "Barbell"
, "Bench"
, "Cable Machine"
, "Leg Press Machine"
, "Kettlebell"
, "Smith Machine"
, "Lat Pulldown Machine"
];

/// Top confidence when the filename names the equipment
pub const FILENAME_ANCHOR: f64 = 0.85;
/// Top confidence for a catalog or constant-list pick
pub const CATALOG_ANCHOR: f64 = 0.70;
const RUNNER_UP: f64 = 0.20;
const DECAY: f64 = 0.05;
const FLOOR: f64 = 0.05;

/// One catalog row as the heuristic sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry
{   pub name: String
  , pub exercise_count: usize
}

/// Confidence for a rank: the anchor, then 0.20 decaying by 0.05 down
/// to a floor of 0.05
pub fn rank_confidence(anchor: f64, rank: usize) -> f64
{   let raw = if rank == 0
    {   anchor
    } else
    {   (RUNNER_UP - DECAY * (rank - 1) as f64).max(FLOOR)
    };
    (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Known classes whose keywords appear in the file's basename
pub fn filename_matches(filename: &str) -> Vec<&'static str>
{   let base = Path::new(filename)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or(filename)
      .to_lowercase();
    EQUIPMENT_KEYWORDS
      .iter()
      .filter(|(_, keywords)| keywords.iter().any(|k| base.contains(k)))
      .map(|(name, _)| *name)
      .collect()
}

fn push_unique(names: &mut Vec<String>, name: &str)
{   if !names.iter().any(|n| n.eq_ignore_ascii_case(name))
    {   names.push(name.to_string());
    }
}

/// Prefer the catalog's spelling of a class name when it has one
fn canonical_name(label: &str, catalog: &[CatalogEntry]) -> String
{   catalog
      .iter()
      .find(|e| e.name.eq_ignore_ascii_case(label))
      .map(|e| e.name.clone())
      .unwrap_or_else(|| label.to_string())
}

/// Build at least one (and at most `top_k`) candidate, most confident
/// first. Never empty whatever the inputs.
pub fn heuristic_candidates<R: Rng + ?Sized>(
  filename: &str
, catalog: &[CatalogEntry]
, top_k: usize
, rng: &mut R
) -> Vec<Candidate>
{   let top_k = top_k.max(1);
    let mut ranked: Vec<String> = Vec::new();

    let mut catalog_names: Vec<&str> = catalog
      .iter()
      .map(|e| e.name.as_str())
      .collect();
    catalog_names.shuffle(rng);
    let mut common: Vec<&str> = COMMON_EQUIPMENT.to_vec();
    common.shuffle(rng);

    let matches = filename_matches(filename);
    let anchor = if !matches.is_empty()
    {   for label in &matches
        {   push_unique(&mut ranked, &canonical_name(label, catalog));
        }
        FILENAME_ANCHOR
    } else if !catalog.is_empty()
    {   let mut popular: Vec<&str> = catalog
          .iter()
          .filter(|e| e.exercise_count > 0)
          .map(|e| e.name.as_str())
          .collect();
        popular.shuffle(rng);
        let main = popular.first()
          .copied()
          .or_else(|| catalog_names.first().copied());
        if let Some(main) = main
        {   push_unique(&mut ranked, main);
        }
        for name in popular
        {   push_unique(&mut ranked, name);
        }
        CATALOG_ANCHOR
    } else
    {   CATALOG_ANCHOR
    };

    for name in catalog_names.iter().chain(common.iter())
    {   if ranked.len() >= top_k
        {   break;
        }
        push_unique(&mut ranked, name);
    }

    ranked
      .into_iter()
      .take(top_k)
      .enumerate()
      .map(|(rank, name)| Candidate::new(name, rank_confidence(anchor, rank)))
      .collect()
}

#[cfg(test)]
mod tests
{   use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn confidences_decay_and_floor()
    {   assert_eq!(rank_confidence(FILENAME_ANCHOR, 0), 0.85);
        assert_eq!(rank_confidence(FILENAME_ANCHOR, 1), 0.20);
        assert_eq!(rank_confidence(FILENAME_ANCHOR, 2), 0.15);
        assert_eq!(rank_confidence(FILENAME_ANCHOR, 10), 0.05);
    }

    #[test]
    fn basename_only_is_matched()
    {   assert!(filename_matches("/uploads/bench/photo.jpg").is_empty());
        assert_eq!(filename_matches("/tmp/Гантели.png"), vec!["Dumbbell"]);
    }

    #[test]
    fn popular_entry_wins_without_filename_hint()
    {   let catalog = vec![
          CatalogEntry { name: "Treadmill".into(), exercise_count: 0 }
        , CatalogEntry { name: "Smith Machine".into(), exercise_count: 4 }
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let out = heuristic_candidates("IMG_0001.jpg", &catalog, 2, &mut rng);
        assert_eq!(out[0].equipment, "Smith Machine");
        assert_eq!(out[0].confidence, CATALOG_ANCHOR);
        assert_eq!(out[1].equipment, "Treadmill");
    }
}
