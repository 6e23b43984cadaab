mod common;

use std::sync::Arc;
use chrono::{Duration, NaiveDate, Utc};
use gymlens::cache::ResponseCache;
use gymlens::usage::UsageTracker;
use gymlens::ErrorKind;
use common::{ok, status, MemoryStore, ScriptedTransport};

const GUIDANCE: &str = r#"{
  "description": "Adjustable flat bench",
  "exercises": [
    {"name": "Bench Press", "muscles": ["Chest", "Triceps"], "steps": ["Lie down", "Press up"]},
    {"name": "Step-Up", "muscles": "Quadriceps, Glutes", "steps": "Step onto the bench"}
  ],
  "safety": ["Check the bench is stable"]
}"#;

#[test]
fn test_cache_round_trip_and_expiry()
{   let cache: ResponseCache<String> = ResponseCache::with_ttl_hours(24);
    let t0 = Utc::now();
    cache.put_at("Bench", "RU", "payload".to_string(), t0);

    assert_eq!(
      cache.get_at("bench", "ru", t0 + Duration::hours(23)).as_deref()
    , Some("payload")
    );
    assert_eq!(cache.get_at("Bench", "ru", t0 + Duration::hours(24)), None);
    // The stale entry was evicted by the read
    assert!(cache.is_empty());
}

#[test]
fn test_cache_last_write_wins()
{   let cache: ResponseCache<u32> = ResponseCache::with_ttl_hours(1);
    cache.put("Dumbbell", "en", 1);
    cache.put("dumbbell", "EN", 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("Dumbbell", "en"), Some(2));
}

#[test]
fn test_usage_counts_per_user_and_day()
{   let tracker = UsageTracker::new(10);
    let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
    let tuesday = monday.succ_opt().unwrap();

    for _ in 0..12
    {   tracker.record_use_on(1, monday);
    }
    tracker.record_use_on(2, monday);

    let info = tracker.usage_on(1, monday);
    assert_eq!(info.used, 12);
    assert_eq!(info.limit, 10);
    assert_eq!(info.remaining, 0);
    assert_eq!(tracker.usage_on(2, monday).remaining, 9);
    assert_eq!(tracker.usage_on(1, tuesday).used, 0);
}

#[tokio::test]
async fn test_guidance_is_served_from_cache()
{   let transport = ScriptedTransport::new(vec![ok(GUIDANCE)]);
    let store = Arc::new(MemoryStore::default());
    let service = common::service(transport.clone(), store);

    let first = service.guidance("Bench", "ru").await.unwrap();
    let second = service.guidance("BENCH", "ru-RU").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.attempts(), 1);
    assert_eq!(first.exercises.len(), 2);
    assert_eq!(first.exercises[1].muscles, vec!["Quadriceps", "Glutes"]);
    assert_eq!(first.exercises[1].steps, vec!["Step onto the bench"]);
    // Only the call that reached the model is counted
    assert_eq!(service.usage(1).used, 1);
}

#[tokio::test]
async fn test_guidance_billing_is_distinguishable()
{   let transport = ScriptedTransport::always(status(402, "Payment required"));
    let service = common::service(transport.clone(), Arc::new(MemoryStore::default()));

    let err = service.guidance("Bench", "en").await.unwrap_err();
    assert!(err.is_billing());
    assert_eq!(service.cached_guidance_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_guidance_rejects_non_json()
{   let transport = ScriptedTransport::always(ok("I cannot answer that."));
    let service = common::service(transport.clone(), Arc::new(MemoryStore::default()));

    let err = service.guidance("Bench", "en").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ParseError));
}

#[tokio::test]
async fn test_usage_is_advisory()
{   let transport = ScriptedTransport::always(ok("Keep your back straight."));
    let service = common::service(transport.clone(), Arc::new(MemoryStore::default()));

    for _ in 0..12
    {   service
          .chat("How do I squat?", gymlens::ChatContext::default(), "en")
          .await
          .unwrap();
    }
    let info = service.usage(1);
    assert_eq!(info.used, 12);
    assert_eq!(info.remaining, 0);
    assert_eq!(transport.attempts(), 12);
}

#[tokio::test]
async fn test_guidance_expires_after_ttl()
{   let transport = ScriptedTransport::always(ok(GUIDANCE));
    let service = common::service(transport.clone(), Arc::new(MemoryStore::default()));
    let t0 = Utc::now();

    service.guidance_at("Bench", "en", t0).await.unwrap();
    service.guidance_at("bench", "en", t0 + Duration::hours(23)).await.unwrap();
    assert_eq!(transport.attempts(), 1);

    // 24 hours on, the entry is stale and the model is asked again
    service.guidance_at("Bench", "en", t0 + Duration::hours(24)).await.unwrap();
    assert_eq!(transport.attempts(), 2);
    assert_eq!(service.cached_guidance_count(), 1);
    // The refreshed entry is timed from the second call
    service.guidance_at("Bench", "en", t0 + Duration::hours(47)).await.unwrap();
    assert_eq!(transport.attempts(), 2);
    assert_eq!(service.usage(1).used, 2);
}

#[test]
fn test_out_of_range_ttl_uses_default()
{   for hours in [i64::MAX, 0, -5]
    {   let cache: ResponseCache<u8> = ResponseCache::with_ttl_hours(hours);
        assert_eq!(cache.ttl(), Duration::hours(24));
    }

    let mut config = gymlens::CoachConfig::default();
    config.cache.ttl_hours = i64::MAX;
    assert!(matches!(config.validate(), Err(gymlens::Error::InvalidConfiguration(_))));
}
