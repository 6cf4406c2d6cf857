//! Scale-factor helpers: the depth-layer auto-offset DC heuristic (§4.4 supplement) and a small
//! min/max scan used to drive it.
//!
//! A small stateful helper that picks a multiplier/offset pair and validates round-trip safety
//! before a value is written, extended with the layer-tracking state a depth scale-factor
//! auto-offset needs across calls.
use sonarframe_core::header_structs::ScaleFactorEntry;

/// Depth interval, in meters, used when `precision >= 0.01`.
const LAYER_INTERVAL_COARSE: f64 = 100.0;
/// Depth interval used when `precision < 0.01` (finer precision needs a finer layer).
const LAYER_INTERVAL_FINE: f64 = 10.0;
/// Beyond this depth the hysteresis band widens, per `gsfLoadDepthScaleFactorAutoOffset`.
const MAX_DEPTH_THRESHOLD: f64 = 400.0;
const MAX_DEPTH_HYSTERESIS: f64 = 30.0;
/// Hard cap on how far positive (above the layer floor) the chosen offset may push.
const POSITIVE_OFFSET_CAP: f64 = 20.0;

/// Finds the minimum and maximum of a beam-array subrecord's values, for feeding into
/// [`AutoOffsetState::update`].
pub fn get_array_min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    let (mut min, mut max) = (first, first);
    for v in iter {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Some((min, max))
}

/// Per-subrecord state carried across pings by [`AutoOffsetState::update`], tracking which
/// 100m-or-10m depth layer the running DC offset is currently anchored to.
///
/// Grounded on `gsfLoadDepthScaleFactorAutoOffset` (`original_source/src/gsf/gsf.c`): the
/// function re-centers the offset only when the ping's depth range drifts far enough within the
/// current layer, rather than recomputing it every ping -- this struct is that running layer
/// anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoOffsetState {
    layer_floor: Option<f64>,
}

impl AutoOffsetState {
    pub fn new() -> Self {
        AutoOffsetState { layer_floor: None }
    }

    /// Recomputes the DC offset for a ping whose depths range over `[min_depth, max_depth]`, at
    /// the given quantization `precision` (meters/LSB). `reset` forces re-seeding the layer from
    /// `min_depth` -- used on the first ping, or after an explicit restart request.
    ///
    /// Returns the offset to feed into a [`ScaleFactorEntry`] (`offset = -layer_floor`, since
    /// `ScaleFactorEntry::quantize` adds `offset` before scaling).
    pub fn update(&mut self, precision: f64, min_depth: f64, max_depth: f64, reset: bool) -> f64 {
        let layer_interval = if precision < 0.01 { LAYER_INTERVAL_FINE } else { LAYER_INTERVAL_COARSE };

        if reset || self.layer_floor.is_none() {
            let floor = (min_depth / layer_interval).floor() * layer_interval;
            self.layer_floor = Some(floor);
            return -floor;
        }

        let floor = self.layer_floor.unwrap();
        let sign_positive = floor >= 0.0;

        // Fraction of the layer consumed from the top (used to decide whether the ping is
        // pushing past the layer's ceiling and needs to move up a layer).
        let ceiling = floor + layer_interval;
        let increasing_threshold = if sign_positive { 0.70 } else { 0.30 };
        let used_from_top = (max_depth - floor) / layer_interval;

        let decreasing_threshold = if sign_positive { 0.10 } else { 0.90 };
        let used_from_floor = (min_depth - floor) / layer_interval;

        if used_from_top >= increasing_threshold && max_depth >= ceiling - f64::EPSILON {
            self.layer_floor = Some(floor + layer_interval);
        } else if used_from_floor <= decreasing_threshold && floor > 0.0 {
            self.layer_floor = Some((floor - layer_interval).max(0.0));
        }

        let mut offset = -self.layer_floor.unwrap();

        if max_depth > MAX_DEPTH_THRESHOLD + MAX_DEPTH_HYSTERESIS {
            offset = offset.min(POSITIVE_OFFSET_CAP);
        }
        offset
    }
}

/// Builds a [`ScaleFactorEntry`] for an integer multiplier chosen so that `precision` (meters per
/// least-significant-bit) is exactly representable, bounded by `[MIN_SF_MULT, MAX_SF_MULT]`.
pub fn scale_factor_for_precision(
    precision: f64,
    offset: f64,
    field_width_bytes: u8,
) -> Result<ScaleFactorEntry, sonarframe_core::errors::SonarframeError> {
    use sonarframe_core::errors::SonarframeError;
    use sonarframe_core::{MAX_SF_MULT, MIN_SF_MULT};

    if precision <= 0.0 {
        return Err(SonarframeError::CannotRepresentPrecision { precision });
    }
    let multiplier = (1.0 / precision).round();
    if !(MIN_SF_MULT as f64..=MAX_SF_MULT as f64).contains(&multiplier) {
        return Err(SonarframeError::IllegalScaleFactorMultiplier { requested: multiplier });
    }
    let width_tag = match field_width_bytes {
        1 => 0x10,
        4 => 0x40,
        _ => 0x20,
    };
    Ok(ScaleFactorEntry { compression_flag: width_tag, multiplier, offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_finds_extremes() {
        assert_eq!(get_array_min_max(&[3.0, -1.0, 7.0, 2.0]), Some((-1.0, 7.0)));
        assert_eq!(get_array_min_max(&[]), None);
    }

    #[test]
    fn auto_offset_seeds_layer_from_first_call() {
        let mut state = AutoOffsetState::new();
        let offset = state.update(0.1, 250.0, 260.0, true);
        assert_eq!(offset, -200.0);
    }

    #[test]
    fn auto_offset_uses_fine_layer_for_high_precision() {
        let mut state = AutoOffsetState::new();
        let offset = state.update(0.005, 12.0, 14.0, true);
        assert_eq!(offset, -10.0);
    }

    #[test]
    fn auto_offset_advances_layer_when_near_ceiling() {
        let mut state = AutoOffsetState::new();
        state.update(0.1, 250.0, 260.0, true);
        let offset = state.update(0.1, 295.0, 300.0, false);
        assert_eq!(offset, -300.0);
    }

    #[test]
    fn scale_factor_for_precision_rejects_non_integer_multiplier_bounds() {
        assert!(scale_factor_for_precision(0.0, 0.0, 2).is_err());
        let entry = scale_factor_for_precision(0.01, -200.0, 2).unwrap();
        assert_eq!(entry.multiplier, 100.0);
    }
}
