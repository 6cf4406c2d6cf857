//! Inter-frame delay computation for the replay producer (spec §4.5/§5).
//!
//! Grounded on `frames7k.c`: each frame is dispatched relative to the one before it, not to the
//! capture's start, and the gap is clamped into `[min_delay, max_delay]` before sleeping -- a long
//! silence in the capture is shortened to `max_delay`, a burst is stretched to at least
//! `min_delay`.
use std::time::Duration;

/// Clamps the wall-clock gap between two consecutive frame timestamps (in seconds) into
/// `[min_delay, max_delay]`.
pub fn clamp_delay(delta_seconds: f64, min_delay: Duration, max_delay: Duration) -> Duration {
    let delta = Duration::from_secs_f64(delta_seconds.max(0.0));
    delta.clamp(min_delay, max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_a_long_gap_down_to_max_delay() {
        let d = clamp_delay(2.0, Duration::from_secs_f64(0.0), Duration::from_secs_f64(1.0));
        assert_eq!(d, Duration::from_secs_f64(1.0));
    }

    #[test]
    fn passes_through_a_gap_within_bounds() {
        let d = clamp_delay(0.5, Duration::from_secs_f64(0.0), Duration::from_secs_f64(1.0));
        assert_eq!(d, Duration::from_secs_f64(0.5));
    }

    #[test]
    fn stretches_a_short_gap_up_to_min_delay() {
        let d = clamp_delay(0.01, Duration::from_secs_f64(0.05), Duration::from_secs_f64(1.0));
        assert_eq!(d, Duration::from_secs_f64(0.05));
    }

    #[test]
    fn three_frame_capture_produces_the_literal_scenario_6_offsets() {
        let mut offset = Duration::ZERO;
        let mut cumulative = vec![offset];
        let gaps = [2.0, 0.5];
        for g in gaps {
            offset += clamp_delay(g, Duration::ZERO, Duration::from_secs_f64(1.0));
            cumulative.push(offset);
        }
        assert_eq!(cumulative, vec![
            Duration::ZERO,
            Duration::from_secs_f64(1.0),
            Duration::from_secs_f64(1.5),
        ]);
    }
}
