//! Unit conversion and trend labelling. Pure functions, no state.

use crate::db::models::TrendDirection;

/// mg/dL per mmol/L.
pub const MG_DL_PER_MMOL_L: f64 = 18.0182;

const FAST_RATE: f64 = 2.0;
const RATE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedValue {
    pub mg_dl: f64,
    pub mmol_l: f64,
    pub trend: Option<TrendDirection>,
}

/// Callers reject non-finite input before calling.
pub fn normalize(raw_value: f64, raw_rate: Option<f64>) -> NormalizedValue {
    NormalizedValue {
        mg_dl: raw_value,
        mmol_l: to_mmol_l(raw_value),
        trend: raw_rate.map(trend_direction),
    }
}

pub fn to_mmol_l(mg_dl: f64) -> f64 {
    mg_dl / MG_DL_PER_MMOL_L
}

/// `rate` is mg/dL per minute.
pub fn trend_direction(rate: f64) -> TrendDirection {
    if rate > FAST_RATE {
        TrendDirection::RisingFast
    } else if rate > RATE {
        TrendDirection::Rising
    } else if rate < -FAST_RATE {
        TrendDirection::FallingFast
    } else if rate < -RATE {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_single_division() {
        for value in [39.0, 54.0, 70.0, 101.3, 180.0, 250.0, 400.0] {
            let normalized = normalize(value, None);
            assert_eq!(normalized.mg_dl, value);
            assert!((normalized.mmol_l - value / 18.0182).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_rate_leaves_trend_unset() {
        assert_eq!(normalize(120.0, None).trend, None);
        assert_eq!(normalize(120.0, Some(0.0)).trend, Some(TrendDirection::Stable));
    }

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(trend_direction(2.5), TrendDirection::RisingFast);
        assert_eq!(trend_direction(2.0), TrendDirection::Rising);
        assert_eq!(trend_direction(1.0), TrendDirection::Stable);
        assert_eq!(trend_direction(-1.0), TrendDirection::Stable);
        assert_eq!(trend_direction(-1.5), TrendDirection::Falling);
        assert_eq!(trend_direction(-2.0), TrendDirection::Falling);
        assert_eq!(trend_direction(-2.01), TrendDirection::FallingFast);
    }
}
