use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::db::models::EventType;

/// Clinical cutoffs (mg/dL) used to classify readings into event types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdTable {
    /// Below this: severe hypoglycemia.
    pub severe_low: f64,

    /// Below this (and at or above `severe_low`): hypoglycemia.
    pub low: f64,

    /// Above this (and at or below `severe_high`): hyperglycemia.
    pub high: f64,

    /// Above this: severe hyperglycemia.
    pub severe_high: f64,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            severe_low: 54.0,
            low: 70.0,
            high: 180.0,
            severe_high: 250.0,
        }
    }
}

impl ThresholdTable {
    pub fn validate(&self) -> Result<()> {
        let values = [self.severe_low, self.low, self.high, self.severe_high];
        if values.iter().any(|v| !v.is_finite()) {
            bail!("thresholds must be finite numbers");
        }
        if !(self.severe_low < self.low && self.low <= self.high && self.high < self.severe_high) {
            bail!(
                "thresholds must satisfy severe_low < low <= high < severe_high (got {} / {} / {} / {})",
                self.severe_low,
                self.low,
                self.high,
                self.severe_high
            );
        }
        Ok(())
    }

    /// `None` means the value is in range.
    pub fn classify(&self, value: f64) -> Option<EventType> {
        if value < self.severe_low {
            Some(EventType::SevereHypoglycemia)
        } else if value < self.low {
            Some(EventType::Hypoglycemia)
        } else if value > self.severe_high {
            Some(EventType::SevereHyperglycemia)
        } else if value > self.high {
            Some(EventType::Hyperglycemia)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_boundaries() {
        let table = ThresholdTable::default();

        assert_eq!(table.classify(53.9), Some(EventType::SevereHypoglycemia));
        assert_eq!(table.classify(54.0), Some(EventType::Hypoglycemia));
        assert_eq!(table.classify(69.9), Some(EventType::Hypoglycemia));
        assert_eq!(table.classify(70.0), None);
        assert_eq!(table.classify(180.0), None);
        assert_eq!(table.classify(180.1), Some(EventType::Hyperglycemia));
        assert_eq!(table.classify(250.0), Some(EventType::Hyperglycemia));
        assert_eq!(table.classify(250.1), Some(EventType::SevereHyperglycemia));
    }

    #[test]
    fn substituted_table_changes_classification() {
        let table = ThresholdTable {
            severe_low: 50.0,
            low: 80.0,
            high: 140.0,
            severe_high: 300.0,
        };

        assert_eq!(table.classify(75.0), Some(EventType::Hypoglycemia));
        assert_eq!(table.classify(260.0), Some(EventType::Hyperglycemia));
        assert_eq!(table.classify(52.0), Some(EventType::Hypoglycemia));
    }

    #[test]
    fn misordered_table_is_rejected() {
        let table = ThresholdTable {
            severe_low: 70.0,
            low: 54.0,
            ..ThresholdTable::default()
        };
        assert!(table.validate().is_err());
        assert!(ThresholdTable::default().validate().is_ok());

        let nan = ThresholdTable {
            high: f64::NAN,
            ..ThresholdTable::default()
        };
        assert!(nan.validate().is_err());
    }
}
