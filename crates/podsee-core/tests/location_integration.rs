//! Distance resolution against a mocked geocoder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use podsee_core::api::MapsClient;
use podsee_core::cache::GeocodeCache;
use podsee_core::geo::sort_by_distance;
use podsee_core::location::DistanceSnapshot;
use podsee_core::{Centre, Coordinates, LocationService};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn centre(name: &str, postal: Option<&str>, address: Option<&str>) -> Centre {
    Centre {
        name: name.to_string(),
        postal_code: postal.map(str::to_string),
        address: address.map(str::to_string),
        ..Default::default()
    }
}

async fn mount_geocode(server: &MockServer, query: &str, lat: f64, lng: f64, times: u64) {
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{ "geometry": { "location": { "lat": lat, "lng": lng } } }]
        })))
        .expect(times)
        .mount(server)
        .await;
}

fn service(server: &MockServer, cache_dir: &std::path::Path) -> LocationService {
    let maps = MapsClient::new("test-key").unwrap().with_base_url(&server.uri());
    let cache = GeocodeCache::open(cache_dir).unwrap();
    LocationService::new(maps, cache).with_request_pause(Duration::ZERO)
}

#[tokio::test]
async fn test_resolve_distances_sorts_and_skips_failures() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_geocode(&mock_server, "449269, Singapore", 1.3023, 103.9072, 1).await;
    mount_geocode(&mock_server, "1 Far Road, Singapore", 1.4400, 103.8000, 1).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "000000, Singapore"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ZERO_RESULTS" })),
        )
        .mount(&mock_server)
        .await;

    let centres = vec![
        centre("Far Centre", None, Some("1 Far Road")),
        centre("No Location", None, None),
        centre("Unknown Postal", Some("000000"), None),
        centre("Near Centre", Some("449269"), Some("80 Marine Parade Rd")),
    ];

    let origin = Coordinates::new(1.3030, 103.9060);
    let mut service = service(&mock_server, dir.path());
    let mut published: Vec<DistanceSnapshot> = Vec::new();
    let snapshot = service
        .resolve_distances(origin, &centres, |s| published.push(s.clone()))
        .await;

    assert_eq!(snapshot.processed, 4);
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.distances.len(), 2);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0], snapshot);

    let sorted: Vec<&str> = sort_by_distance(&centres, &snapshot.distances)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        sorted,
        vec!["Near Centre", "Far Centre", "No Location", "Unknown Postal"]
    );
}

#[tokio::test]
async fn test_cached_centres_skip_network() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Geocoded once by the first service, then served from the file cache.
    mount_geocode(&mock_server, "449269, Singapore", 1.3023, 103.9072, 1).await;

    let centres = vec![centre("Near Centre", Some("449269"), None)];
    let origin = Coordinates::new(1.3030, 103.9060);

    let first = service(&mock_server, dir.path())
        .resolve_distances(origin, &centres, |_| {})
        .await;

    let second = service(&mock_server, dir.path())
        .resolve_distances(origin, &centres, |_| {})
        .await;

    assert_eq!(first.distances, second.distances);
}

#[tokio::test]
async fn test_progress_published_in_batches() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let centres: Vec<Centre> = (0..12)
        .map(|i| centre(&format!("Centre {i:02}"), None, None))
        .collect();

    let mut counts = Vec::new();
    service(&mock_server, dir.path())
        .resolve_distances(Coordinates::new(1.3, 103.9), &centres, |s| {
            counts.push(s.processed)
        })
        .await;

    assert_eq!(counts, vec![5, 10, 12]);
}

#[tokio::test]
async fn test_cancelled_run_stops_before_next_centre() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let centres: Vec<Centre> = (0..12)
        .map(|i| centre(&format!("Centre {i:02}"), None, None))
        .collect();

    // A newer search supersedes this run after the first batch.
    let cancel = AtomicBool::new(false);
    let mut counts = Vec::new();
    let snapshot = service(&mock_server, dir.path())
        .resolve_distances_until(Coordinates::new(1.3, 103.9), &centres, &cancel, |s| {
            counts.push(s.processed);
            cancel.store(true, Ordering::Relaxed);
        })
        .await;

    assert_eq!(counts, vec![5]);
    assert_eq!(snapshot.processed, 5);
    assert!(!snapshot.is_complete());
}

#[tokio::test]
async fn test_cancelled_run_makes_no_requests() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_geocode(&mock_server, "449269, Singapore", 1.3023, 103.9072, 0).await;

    let centres = vec![centre("Near Centre", Some("449269"), None)];
    let cancel = AtomicBool::new(true);
    let mut published = 0;
    let snapshot = service(&mock_server, dir.path())
        .resolve_distances_until(Coordinates::new(1.3, 103.9), &centres, &cancel, |_| {
            published += 1
        })
        .await;

    assert_eq!(published, 0);
    assert_eq!(snapshot.processed, 0);
    assert!(snapshot.distances.is_empty());
}
