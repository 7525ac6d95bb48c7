//! Momentum calculation.
//!
//! Two models are provided. The hot path uses [`simple_momentum`]: the store
//! aggregates the signed weight sum in SQL and a single decay factor scales
//! it. [`calculate_momentum`] is the per-event variant with an age-based
//! decay curve; it is pure (all inputs explicit, no clock access) and serves
//! as a drop-in replacement for implementations that load raw events.

use chrono::{DateTime, Utc};

use crate::values::Momentum;

/// Input to the per-event momentum calculation.
#[derive(Debug, Clone)]
pub struct MomentumInput {
    /// Events in the calculation window, already filtered by time.
    pub events: Vec<MomentumEventData>,
    /// Beginning of the sliding window.
    pub window_start: DateTime<Utc>,
    /// End of the sliding window (typically "now").
    pub window_end: DateTime<Utc>,
    /// How quickly old events lose weight: 1.0 means no decay, 0.5 means
    /// events at the window edge count half.
    pub decay_factor: f64,
}

/// Minimal per-event data for the calculation, decoupled from the full
/// `ActivityEvent` to keep the algorithm pure.
#[derive(Debug, Clone, Copy)]
pub struct MomentumEventData {
    /// The event's weight magnitude.
    pub weight: f64,
    /// When the event occurred.
    pub created_at: DateTime<Utc>,
    /// Whether this event subtracts from momentum (e.g. leave).
    pub is_negative: bool,
}

/// Output of the per-event momentum calculation.
#[derive(Debug, Clone, Copy)]
pub struct MomentumResult {
    /// The final momentum value (clamped non-negative).
    pub score: Momentum,
    /// The unclamped sum of weighted contributions.
    pub raw_sum: f64,
    /// Number of events considered.
    pub event_count: usize,
    /// Mean decay multiplier applied across the events.
    pub effective_decay: f64,
}

/// Compute community momentum from individual events.
///
/// For each event the age ratio within the window (0 = newest, 1 = oldest)
/// scales the contribution: `weight * (1 - age_ratio * (1 - decay_factor))`,
/// negated for negative signals. The summed result is clamped to zero.
/// A degenerate window (end ≤ start) scores zero.
pub fn calculate_momentum(input: &MomentumInput) -> MomentumResult {
    if input.events.is_empty() {
        return MomentumResult {
            score: Momentum::new(0.0),
            raw_sum: 0.0,
            event_count: 0,
            effective_decay: input.decay_factor,
        };
    }

    let window_duration = input.window_end - input.window_start;
    if window_duration <= chrono::Duration::zero() {
        return MomentumResult {
            score: Momentum::new(0.0),
            raw_sum: 0.0,
            event_count: input.events.len(),
            effective_decay: input.decay_factor,
        };
    }

    let window_secs = window_duration.num_milliseconds() as f64 / 1000.0;
    let mut raw_sum = 0.0;
    let mut total_decay = 0.0;

    for event in &input.events {
        let age = input.window_end - event.created_at;
        let age_ratio = (age.num_milliseconds() as f64 / 1000.0 / window_secs).clamp(0.0, 1.0);

        // at age_ratio=0 the multiplier is 1.0, at age_ratio=1 it is decay_factor
        let multiplier = 1.0 - age_ratio * (1.0 - input.decay_factor);
        total_decay += multiplier;

        let contribution = event.weight * multiplier;
        raw_sum += if event.is_negative {
            -contribution
        } else {
            contribution
        };
    }

    MomentumResult {
        score: Momentum::new(raw_sum),
        raw_sum,
        event_count: input.events.len(),
        effective_decay: total_decay / input.events.len() as f64,
    }
}

/// Aggregated momentum model: the store pre-sums signed weights and a single
/// decay factor scales the total. `momentum = max(0, weighted_sum * decay)`.
pub fn simple_momentum(weighted_sum: f64, decay_factor: f64) -> Momentum {
    Momentum::new(weighted_sum * decay_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::hours(1), end)
    }

    fn event(weight: f64, at: DateTime<Utc>, is_negative: bool) -> MomentumEventData {
        MomentumEventData {
            weight,
            created_at: at,
            is_negative,
        }
    }

    #[test]
    fn test_empty_input() {
        let (start, end) = window();
        let result = calculate_momentum(&MomentumInput {
            events: vec![],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert_eq!(result.score.value(), 0.0);
        assert_eq!(result.event_count, 0);
        assert_eq!(result.effective_decay, 0.7);
    }

    #[test]
    fn test_event_at_window_end_has_no_decay() {
        let (start, end) = window();
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(5.0, end, false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert!((result.score.value() - 5.0).abs() < 1e-9);
        assert_eq!(result.event_count, 1);
    }

    #[test]
    fn test_event_at_window_start_gets_full_decay() {
        let (start, end) = window();
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(5.0, start, false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert!((result.score.value() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_event_at_midpoint() {
        let (start, end) = window();
        let mid = start + Duration::minutes(30);
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(4.0, mid, false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        // multiplier at midpoint: 1 - 0.5 * 0.3 = 0.85
        assert!((result.score.value() - 4.0 * 0.85).abs() < 1e-3);
    }

    #[test]
    fn test_negative_sum_clamps_but_raw_sum_remains() {
        let (start, end) = window();
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(1.0, end, false), event(5.0, end, true)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert_eq!(result.score.value(), 0.0);
        assert!((result.raw_sum - (-4.0)).abs() < 1e-9);
        assert_eq!(result.event_count, 2);
    }

    #[test]
    fn test_degenerate_window() {
        let end = Utc::now();
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(5.0, end, false), event(2.0, end, false)],
            window_start: end,
            window_end: end,
            decay_factor: 0.7,
        });
        assert_eq!(result.score.value(), 0.0);
        assert_eq!(result.event_count, 2);
        assert_eq!(result.effective_decay, 0.7);

        let inverted = calculate_momentum(&MomentumInput {
            events: vec![event(5.0, end, false)],
            window_start: end,
            window_end: end - Duration::minutes(5),
            decay_factor: 0.3,
        });
        assert_eq!(inverted.score.value(), 0.0);
        assert_eq!(inverted.event_count, 1);
        assert_eq!(inverted.effective_decay, 0.3);
    }

    #[test]
    fn test_age_ratio_clamped_for_out_of_window_timestamps() {
        let (start, end) = window();
        // older than the window start: decays exactly to the factor, no further
        let stale = calculate_momentum(&MomentumInput {
            events: vec![event(10.0, start - Duration::hours(2), false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert!((stale.score.value() - 7.0).abs() < 1e-9);

        // newer than the window end: no boost beyond 1.0
        let fresh = calculate_momentum(&MomentumInput {
            events: vec![event(10.0, end + Duration::minutes(5), false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert!((fresh.score.value() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_effective_decay_is_mean_multiplier() {
        let (start, end) = window();
        let result = calculate_momentum(&MomentumInput {
            events: vec![event(1.0, end, false), event(1.0, start, false)],
            window_start: start,
            window_end: end,
            decay_factor: 0.7,
        });
        assert!((result.effective_decay - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_simple_momentum_law() {
        assert!((simple_momentum(11.0, 0.7).value() - 7.7).abs() < 1e-9);
        assert_eq!(simple_momentum(-3.0, 0.7).value(), 0.0);
        assert_eq!(simple_momentum(0.0, 0.7).value(), 0.0);
        assert!((simple_momentum(9.0, 0.7).value() - 6.3).abs() < 1e-9);
    }
}
