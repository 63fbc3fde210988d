//! Great-circle distance and distance ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Centre, Coordinates};

/// Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Ordering for optional distances: resolved ascending, unresolved last.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order centres by distance, keyed by centre name.
///
/// Centres with a resolved distance come first, nearest first; the rest
/// follow in their original order. Ties keep their original relative order.
pub fn sort_by_distance<'a>(
    centres: &'a [Centre],
    distances: &HashMap<String, f64>,
) -> Vec<&'a Centre> {
    let mut sorted: Vec<&Centre> = centres.iter().collect();
    // slice::sort_by is stable
    sorted.sort_by(|a, b| {
        compare_distance(
            distances.get(&a.name).copied(),
            distances.get(&b.name).copied(),
        )
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centre(name: &str) -> Centre {
        Centre {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn names(centres: &[&Centre]) -> Vec<String> {
        centres.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        let p = Coordinates::new(1.3023, 103.9072);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let marine_parade = Coordinates::new(1.3023, 103.9072);
        let jurong = Coordinates::new(1.3329, 103.7436);
        let ab = haversine_km(marine_parade, jurong);
        let ba = haversine_km(jurong, marine_parade);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_sort_resolved_ascending_then_unresolved_in_order() {
        let centres = vec![
            centre("No Distance A"),
            centre("Far"),
            centre("No Distance B"),
            centre("Near"),
        ];
        let distances = HashMap::from([
            ("Far".to_string(), 8.5),
            ("Near".to_string(), 0.7),
        ]);

        let sorted = sort_by_distance(&centres, &distances);
        assert_eq!(
            names(&sorted),
            vec!["Near", "Far", "No Distance A", "No Distance B"]
        );
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let centres = vec![centre("C"), centre("A"), centre("B")];
        let distances = HashMap::from([
            ("C".to_string(), 2.0),
            ("A".to_string(), 2.0),
            ("B".to_string(), 1.0),
        ]);

        let sorted = sort_by_distance(&centres, &distances);
        assert_eq!(names(&sorted), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_sort_without_distances_keeps_order() {
        let centres = vec![centre("Z"), centre("M"), centre("A")];
        let sorted = sort_by_distance(&centres, &HashMap::new());
        assert_eq!(names(&sorted), vec!["Z", "M", "A"]);
    }
}
