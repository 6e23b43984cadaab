mod common;

use std::sync::Arc;
use gymlens::classify::UpstreamFailure;
use gymlens::dispatch::RequestDispatcher;
use gymlens::failover::{Outcome, RetryPolicy};
use gymlens::recognition::heuristic::{heuristic_candidates, CatalogEntry, FILENAME_ANCHOR};
use gymlens::recognition::RecognitionFallbackChain;
use gymlens::request::ContentPart;
use gymlens::{ErrorKind, ImageUpload, Locale};
use rand::rngs::StdRng;
use rand::SeedableRng;
use common::{ok, status, MemoryStore, ScriptedTransport};

fn photo(name: &str) -> ImageUpload
{   ImageUpload::new(name, vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn catalog_store() -> Arc<MemoryStore>
{   Arc::new(MemoryStore::with_catalog(
      &[(1, "Bench"), (2, "Cable Machine"), (3, "Treadmill")]
    , &[(10, 1, "Bench Press"), (11, 2, "Cable Fly")]
    ))
}

fn assert_valid(candidates: &[gymlens::Candidate])
{   assert!(!candidates.is_empty());
    for c in candidates
    {   assert!((0.0..=1.0).contains(&c.confidence), "{:?}", c);
    }
    for pair in candidates.windows(2)
    {   assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[tokio::test(start_paused = true)]
async fn test_filename_hint_after_failed_primary()
{   common::init_logging();
    let transport = ScriptedTransport::always(status(402, "Payment required"));
    let service = common::service(transport.clone(), catalog_store());

    let candidates = service
      .recognize_candidates(&photo("dumbbell_photo.jpg"), 3, "ru")
      .await;

    assert_valid(&candidates);
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].equipment, "Dumbbell");
    assert!(candidates[0].confidence >= 0.85);
    assert!(candidates[1].confidence < candidates[0].confidence);
    assert!(candidates[2].confidence < candidates[0].confidence);
}

#[tokio::test(start_paused = true)]
async fn test_recognition_never_fails()
{   let failures = vec![
      status(401, "Incorrect API key")
    , status(429, "Rate limit reached")
    , status(500, "boom")
    , ok("this is not json")
    , ok(r#"{"equipment":"Unknown","confidence":0.1}"#)
    , ok(r#"{"candidates":[]}"#)
    , Err(UpstreamFailure::new(ErrorKind::Timeout, "timed out"))
    ];
    for failure in failures
    {   let transport = ScriptedTransport::always(failure);
        let store = Arc::new(MemoryStore
        {   fail_catalog: true
          , ..MemoryStore::default()
        });
        let service = common::service(transport, store);

        let single = service.recognize(&photo("IMG_2024.jpg"), "en").await;
        assert!(!single.equipment.is_empty());
        assert!((0.0..=1.0).contains(&single.confidence));

        let many = service
          .recognize_candidates(&photo("IMG_2024.jpg"), 4, "en")
          .await;
        assert_valid(&many);
        assert_eq!(many.len(), 4);
    }
}

#[tokio::test]
async fn test_vision_reply_is_used_and_clamped()
{   let transport = ScriptedTransport::new(vec![ok(
      r#"{"candidates":[
           {"equipment":"Leg Press Machine","confidence":1.4},
           {"equipment":"Hack Squat Machine","confidence":"0.3"}
         ]}"#
    )]);
    let service = common::service(transport.clone(), catalog_store());

    let candidates = service
      .recognize_candidates(&photo("upload.png"), 3, "en")
      .await;

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].equipment, "Leg Press Machine");
    assert_eq!(candidates[0].confidence, 1.0);
    assert_eq!(candidates[1].confidence, 0.3);

    let requests = transport.requests.lock();
    let image = requests[0].messages()
      .iter()
      .flat_map(|m| m.parts.iter())
      .find_map(|p| match p
      {   ContentPart::Image(image) => Some(image.clone())
        , _ => None
      })
      .expect("image part");
    assert!(image.data_url().starts_with("data:image/png;base64,"));
    assert!(requests[0].json_output());
}

#[tokio::test(start_paused = true)]
async fn test_outcome_reports_fallback_reason()
{   let transport = ScriptedTransport::always(status(403, "Forbidden"));
    let store = catalog_store();
    let chain = RecognitionFallbackChain::new(
      RequestDispatcher::new(transport, RetryPolicy::default())
    , store
    , "gpt-4o-mini"
    );

    match chain.recognize_outcome(&photo("IMG_1.jpg"), 2, Locale::En).await
    {   Outcome::Fallback(candidates, reason) => {
          assert_eq!(reason.kind(), Some(ErrorKind::Billing));
          // Bench and Cable Machine have exercises
          assert!(
            candidates[0].equipment == "Bench"
              || candidates[0].equipment == "Cable Machine"
          );
          assert_eq!(candidates[0].confidence, 0.70);
          assert_eq!(candidates.len(), 2);
        }
      , other => panic!("expected fallback, got {:?}", other)
    }
}

#[test]
fn test_seeded_heuristic_is_deterministic()
{   let catalog = vec![
      CatalogEntry { name: "Bench".into(), exercise_count: 2 }
    , CatalogEntry { name: "Rack".into(), exercise_count: 0 }
    , CatalogEntry { name: "Kettlebell".into(), exercise_count: 1 }
    ];
    let a = heuristic_candidates("x.jpg", &catalog, 3, &mut StdRng::seed_from_u64(7));
    let b = heuristic_candidates("x.jpg", &catalog, 3, &mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);

    let hinted = heuristic_candidates(
      "/data/uploads/barbell.jpeg"
    , &catalog
    , 1
    , &mut StdRng::seed_from_u64(1)
    );
    assert_eq!(hinted.len(), 1);
    assert_eq!(hinted[0].equipment, "Barbell");
    assert_eq!(hinted[0].confidence, FILENAME_ANCHOR);
}
