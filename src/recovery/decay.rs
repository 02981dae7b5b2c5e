//! Exponential fatigue decay, evaluated lazily at read time

use chrono::{DateTime, Utc};

/// Hours between two instants, clamped at zero for clock skew
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds();
    (millis.max(0) as f64) / 3_600_000.0
}

/// Fatigue remaining after `elapsed_hours` of rest: halves every `half_life_hours`
pub fn decay_after(stored_fatigue: f64, elapsed_hours: f64, half_life_hours: f64) -> f64 {
    if stored_fatigue <= 0.0 || half_life_hours <= 0.0 {
        return 0.0;
    }
    let elapsed = elapsed_hours.max(0.0);
    (stored_fatigue * 0.5_f64.powf(elapsed / half_life_hours)).max(0.0)
}

/// Unrounded fatigue at `now` for a level stored at `stored_at`
pub fn decay(
    stored_fatigue: f64,
    stored_at: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_hours: f64,
) -> f64 {
    decay_after(stored_fatigue, elapsed_hours(stored_at, now), half_life_hours)
}

/// Decayed fatigue rounded for display, 0..=100
pub fn decayed_level(
    stored_fatigue: u8,
    stored_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    half_life_hours: f64,
) -> u8 {
    match stored_at {
        Some(at) => decay(stored_fatigue as f64, at, now, half_life_hours)
            .round()
            .clamp(0.0, 100.0) as u8,
        // Never trained: nothing to decay
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_one_half_life_halves_fatigue() {
        let now = t0() + Duration::hours(48);
        assert_eq!(decayed_level(80, Some(t0()), now, 48.0), 40);
    }

    #[test]
    fn test_no_elapsed_time_keeps_level() {
        assert_eq!(decayed_level(73, Some(t0()), t0(), 60.0), 73);
    }

    #[test]
    fn test_future_timestamp_clamped_to_zero_elapsed() {
        let now = t0() - Duration::hours(5);
        assert_eq!(elapsed_hours(t0(), now), 0.0);
        assert_eq!(decayed_level(55, Some(t0()), now, 36.0), 55);
    }

    #[test]
    fn test_monotonic_non_increasing() {
        let mut previous = f64::MAX;
        for hours in (0..=24 * 30).step_by(6) {
            let value = decay(90.0, t0(), t0() + Duration::hours(hours), 72.0);
            assert!(value <= previous, "decay increased at {}h: {} > {}", hours, value, previous);
            previous = value;
        }
    }

    #[test]
    fn test_approaches_zero() {
        let far = t0() + Duration::days(365);
        assert_eq!(decayed_level(100, Some(t0()), far, 72.0), 0);
        assert!(decay(100.0, t0(), far, 72.0) < 1e-9);
    }

    #[test]
    fn test_never_trained_is_zero() {
        assert_eq!(decayed_level(0, None, t0(), 48.0), 0);
    }

    #[test]
    fn test_zero_fatigue_stays_zero() {
        assert_eq!(decay(0.0, t0(), t0() + Duration::hours(3), 48.0), 0.0);
    }

    #[test]
    fn test_sub_hour_precision() {
        let now = t0() + Duration::minutes(30);
        let value = decay(100.0, t0(), now, 1.0);
        assert!((value - 70.71).abs() < 0.01, "got {}", value);
    }
}
