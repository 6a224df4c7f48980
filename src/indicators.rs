use once_cell::sync::Lazy;
use serde::Serialize;

use crate::models::BreachDirection;

/// Static description of one tracked indicator.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSpec {
    pub slug: &'static str,
    pub name: &'static str,
    /// FRED series id.
    pub series_id: &'static str,
    /// Native release frequency, informational only.
    pub frequency: &'static str,
    pub unit: &'static str,
    /// Multiplier applied to raw observations before anything else sees them
    /// (HY OAS is published in percent but displayed/alerted in bps).
    pub scale: f64,
    /// Env var that overrides the default alert threshold.
    pub threshold_env: &'static str,
    pub default_threshold: f64,
    pub direction: BreachDirection,
}

static INDICATORS: Lazy<Vec<IndicatorSpec>> = Lazy::new(|| {
    vec![
        IndicatorSpec {
            slug: "consumer_credit",
            name: "Consumer Credit Growth (%)",
            series_id: "TOTALSLAR",
            frequency: "Monthly",
            unit: "%",
            scale: 1.0,
            threshold_env: "CREDIT_THRESHOLD",
            default_threshold: 0.10,
            direction: BreachDirection::Below,
        },
        IndicatorSpec {
            slug: "hy_spread",
            name: "HY Spread (bps)",
            series_id: "BAMLH0A0HYM2",
            frequency: "Daily",
            unit: "bps",
            scale: 100.0,
            threshold_env: "HY_SPREAD_THRESHOLD",
            default_threshold: 400.0,
            direction: BreachDirection::Above,
        },
        IndicatorSpec {
            slug: "nfci",
            name: "NFCI Index",
            series_id: "NFCI",
            frequency: "Weekly",
            unit: "index",
            scale: 1.0,
            threshold_env: "NFCI_THRESHOLD",
            // Positive NFCI = tightening financial conditions.
            default_threshold: 0.0,
            direction: BreachDirection::Above,
        },
        IndicatorSpec {
            slug: "consumer_sentiment",
            name: "Consumer Sentiment Index",
            series_id: "UMCSENT",
            frequency: "Monthly",
            unit: "index",
            scale: 1.0,
            threshold_env: "SENTIMENT_THRESHOLD",
            default_threshold: 60.0,
            direction: BreachDirection::Below,
        },
        IndicatorSpec {
            slug: "vix",
            name: "VIX Index",
            series_id: "VIXCLS",
            frequency: "Daily",
            unit: "index",
            scale: 1.0,
            threshold_env: "VIX_THRESHOLD",
            default_threshold: 30.0,
            direction: BreachDirection::Above,
        },
    ]
});

pub struct Registry;

impl Registry {
    /// All tracked indicators, in configured (display) order.
    pub fn all() -> &'static [IndicatorSpec] {
        &INDICATORS
    }

    pub fn get(slug: &str) -> Option<&'static IndicatorSpec> {
        INDICATORS.iter().find(|i| i.slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let hy = Registry::get("hy_spread").unwrap();
        assert_eq!(hy.series_id, "BAMLH0A0HYM2");
        assert_eq!(hy.scale, 100.0);
        assert!(Registry::get("no_such_indicator").is_none());
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<_> = Registry::all().iter().map(|i| i.slug).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Registry::all().len());
    }
}
