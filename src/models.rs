use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of an indicator. Timestamps are midnight UTC —
/// FRED publishes daily/weekly/monthly data without intraday times.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Which side of a threshold counts as a breach.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BreachDirection {
    /// Breach when the latest value rises above the threshold (e.g. HY spread).
    Above,
    /// Breach when the latest value falls below the threshold (e.g. sentiment).
    Below,
}

impl BreachDirection {
    pub fn is_breach(&self, value: f64, threshold: f64) -> bool {
        match self {
            BreachDirection::Above => value > threshold,
            BreachDirection::Below => value < threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BreachDirection::Above => ">",
            BreachDirection::Below => "<",
        }
    }
}

/// A configured alert level re-expressed in the coordinate space of the
/// table it will be drawn against (raw value, or z-score when the chart
/// is normalized).
#[derive(Debug, Serialize, Clone)]
pub struct ThresholdMarker {
    pub slug: String,
    pub name: String,
    pub direction: BreachDirection,
    /// Comparison value in the current display coordinate space.
    pub value: f64,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breach_direction() {
        assert!(BreachDirection::Above.is_breach(450.0, 400.0));
        assert!(!BreachDirection::Above.is_breach(400.0, 400.0));
        assert!(BreachDirection::Below.is_breach(55.0, 60.0));
        assert!(!BreachDirection::Below.is_breach(60.0, 60.0));
    }
}
