//! Geocode cache behaviour against the fake search endpoint.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use freight_tracker_core::Coordinates;
use freight_tracker_dashboard::geocode::Geocoder;
use freight_tracker_integration_tests::{CHICAGO, FakeGeocoder, temp_cache_path};

#[tokio::test]
async fn test_resolve_once_then_cache_hit() {
    let fake = FakeGeocoder::chicago().await.unwrap();
    let path = temp_cache_path("chicago");
    let geocoder = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();

    assert_eq!(geocoder.resolve("Chicago").await, Some(CHICAGO));
    assert_eq!(fake.requests(), 1);

    assert_eq!(geocoder.resolve("Chicago").await, Some(CHICAGO));
    assert_eq!(fake.requests(), 1);

    let persisted: BTreeMap<String, Coordinates> =
        serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(persisted.get("Chicago"), Some(&CHICAGO));

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_blank_place_makes_no_request() {
    let fake = FakeGeocoder::chicago().await.unwrap();
    let path = temp_cache_path("blank");
    let geocoder = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();

    assert_eq!(geocoder.resolve("").await, None);
    assert_eq!(geocoder.resolve("   ").await, None);
    assert_eq!(fake.requests(), 0);
}

#[tokio::test]
async fn test_unknown_place_is_not_cached() {
    let fake = FakeGeocoder::chicago().await.unwrap();
    let path = temp_cache_path("unknown");
    let geocoder = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();

    assert_eq!(geocoder.resolve("Atlantis").await, None);
    assert_eq!(geocoder.resolve("Atlantis").await, None);

    assert_eq!(fake.requests(), 2);
    assert_eq!(geocoder.persisted_len().await, 0);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_reopened_cache_answers_offline() {
    let fake = FakeGeocoder::chicago().await.unwrap();
    let path = temp_cache_path("reopen");
    {
        let geocoder = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();
        geocoder.resolve("Chicago").await.unwrap();
    }

    let reopened = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();
    assert_eq!(reopened.cached("Chicago").await, Some(CHICAGO));
    assert_eq!(reopened.resolve("Chicago").await, Some(CHICAGO));
    assert_eq!(fake.requests(), 1);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_request() {
    let fake = FakeGeocoder::chicago().await.unwrap();
    let path = temp_cache_path("concurrent");
    let geocoder = Geocoder::open(&fake.config(&path).unwrap()).await.unwrap();

    let (a, b, c) = tokio::join!(
        geocoder.resolve("Chicago"),
        geocoder.resolve("Chicago"),
        geocoder.resolve("Chicago"),
    );

    assert_eq!((a, b, c), (Some(CHICAGO), Some(CHICAGO), Some(CHICAGO)));
    assert_eq!(fake.requests(), 1);

    let _ = tokio::fs::remove_file(&path).await;
}
