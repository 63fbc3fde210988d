use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Format a Singapore phone number for display.
/// Eight-digit numbers become `XXXX XXXX`, with `+65` kept when present.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        8 => format!("{} {}", &digits[0..4], &digits[4..8]),
        10 if digits.starts_with("65") => format!("+65 {} {}", &digits[2..6], &digits[6..10]),
        _ => phone.to_string(), // Return original if can't format
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Distance label used in result lists, one decimal place.
pub fn format_distance(km: f64) -> String {
    format!("{:.1} km away", km)
}

/// Relative time for comment timestamps ("just now", "5m ago", "3d ago", "Mar 01, 2026").
pub fn format_relative(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - time).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else if minutes < 1440 * 7 {
        format!("{}d ago", minutes / 1440)
    } else {
        time.format("%b %d, %Y").to_string()
    }
}

/// Case-insensitive ordering
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("91234567"), "9123 4567");
        assert_eq!(format_phone("+65 9123 4567"), "+65 9123 4567");
        assert_eq!(format_phone("6591234567"), "+65 9123 4567");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(1.26), "1.3 km away");
        assert_eq!(format_distance(0.0), "0.0 km away");
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now, now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2d ago");
    }

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("apple", "Banana"), Ordering::Less);
        assert_eq!(cmp_ignore_case("ABC", "abc"), Ordering::Equal);
    }
}
