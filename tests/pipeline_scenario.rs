use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use credit_monitor::config::Config;
use credit_monitor::core::orchestrator;
use credit_monitor::core::timeseries::merge;
use credit_monitor::error::PipelineError;
use credit_monitor::fetcher::DataSource;
use credit_monitor::models::DataPoint;

fn ts(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap()
}

fn dp(month: u32, day: u32, value: f64) -> DataPoint {
    DataPoint {
        timestamp: ts(month, day),
        value,
    }
}

/// Monthly, daily and weekly series merged onto one calendar, then windowed.
#[test]
fn mixed_frequency_merge_and_window() {
    let a = (
        "a".to_string(),
        vec![dp(1, 1, 1.0), dp(2, 1, 1.2)], // monthly
    );
    let b = (
        "b".to_string(),
        vec![dp(1, 1, 100.0), dp(1, 15, 105.0), dp(2, 1, 110.0)], // daily-ish
    );
    let c = (
        "c".to_string(),
        vec![dp(1, 1, 0.1), dp(1, 8, 0.2), dp(2, 1, -0.1)], // weekly
    );

    let merged = merge(&[a, b, c]).unwrap();

    // Union of 3+3+3 timestamps dedupes to 4 distinct dates.
    assert_eq!(
        merged.index(),
        &[ts(1, 1), ts(1, 8), ts(1, 15), ts(2, 1)]
    );

    // Monthly column forward-fills across the mid-month rows.
    assert_eq!(
        merged.column("a").unwrap(),
        &[Some(1.0), Some(1.0), Some(1.0), Some(1.2)]
    );

    // 20-day window from Feb 1 reaches back to Jan 12: the Jan 1 and Jan 8
    // rows drop, Jan 15 stays.
    let windowed = merged.window(Duration::days(20));
    assert_eq!(windowed.index(), &[ts(1, 15), ts(2, 1)]);
    assert_eq!(windowed.column("c").unwrap(), &[Some(0.2), Some(-0.1)]);
}

/// A fixed-response source standing in for FRED.
struct StubSource;

#[async_trait]
impl DataSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        _start: NaiveDate,
        _end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, PipelineError> {
        match series_id {
            // Consumer credit, monthly.
            "TOTALSLAR" => Ok(vec![dp(1, 1, 2.0), dp(2, 1, 1.5), dp(3, 1, 0.05)]),
            // HY OAS, published in percent; the pipeline scales it to bps.
            "BAMLH0A0HYM2" => Ok(vec![dp(1, 2, 3.2), dp(2, 2, 3.8), dp(3, 1, 4.5)]),
            // NFCI, weekly.
            "NFCI" => Ok(vec![dp(1, 5, -0.4), dp(2, 2, -0.2), dp(2, 23, 0.1)]),
            // Sentiment source is down this cycle.
            "UMCSENT" => Err(PipelineError::SourceUnavailable {
                series: series_id.to_string(),
                reason: "connection refused".to_string(),
            }),
            // VIX, daily.
            "VIXCLS" => Ok(vec![dp(2, 1, 14.0), dp(2, 15, 19.0), dp(3, 1, 32.0)]),
            other => panic!("unexpected series {}", other),
        }
    }
}

#[tokio::test]
async fn refresh_degrades_gracefully_per_source() {
    let cfg = Config::defaults();
    let now = ts(3, 2);

    let series = orchestrator::fetch_indicators(Arc::new(StubSource), &cfg, now).await;

    // All five columns come back in registry order; the failed one is empty.
    let slugs: Vec<&str> = series.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(
        slugs,
        vec!["consumer_credit", "hy_spread", "nfci", "consumer_sentiment", "vix"]
    );
    let sentiment = &series.iter().find(|(s, _)| s == "consumer_sentiment").unwrap().1;
    assert!(sentiment.is_empty());

    // HY OAS got scaled from percent to bps at the boundary.
    let hy = &series.iter().find(|(s, _)| s == "hy_spread").unwrap().1;
    assert_eq!(hy[0].value, 320.0);

    let dashboard = orchestrator::build_dashboard(&series, &cfg, now).unwrap();

    // The missing column never makes it into the normalized view but the
    // rest of the dashboard is intact.
    assert!(!dashboard.columns.contains(&"consumer_sentiment".to_string()));
    assert_eq!(dashboard.columns.len(), 4);
    assert_eq!(dashboard.markers.len(), 4);
    assert_eq!(dashboard.degenerate, vec!["consumer_sentiment".to_string()]);

    // Rows span the union of the surviving timestamps.
    assert_eq!(dashboard.rows.len(), 8);

    // Marker projection agrees with the per-column window stats. The stats
    // run over the forward-filled column, so carried values count once per
    // row they occupy: the HY column across the 8-row union is
    // [None, 320, 320, 320, 380, 380, 380, 450].
    let hy_marker = dashboard.markers.iter().find(|m| m.slug == "hy_spread").unwrap();
    let filled: Vec<f64> = vec![320.0, 320.0, 320.0, 380.0, 380.0, 380.0, 450.0];
    let mean = filled.iter().sum::<f64>() / filled.len() as f64;
    let sd = (filled.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
        / (filled.len() - 1) as f64)
        .sqrt();
    let expected = (cfg.threshold("hy_spread").unwrap() - mean) / sd;
    assert!((hy_marker.value - expected).abs() < 1e-9);

    // Latest readings carry raw (unnormalized) values.
    let vix_latest: Vec<_> = dashboard.latest.iter().filter(|r| r.slug == "vix").collect();
    assert_eq!(vix_latest.last().unwrap().value, 32.0);
    assert_eq!(vix_latest.last().unwrap().date, "2024-03-01");
}

#[tokio::test]
async fn all_sources_down_yields_empty_dashboard() {
    struct DownSource;

    #[async_trait]
    impl DataSource for DownSource {
        fn name(&self) -> &str {
            "down"
        }

        async fn fetch_series(
            &self,
            series_id: &str,
            _start: NaiveDate,
            _end: DateTime<Utc>,
        ) -> Result<Vec<DataPoint>, PipelineError> {
            Err(PipelineError::SourceUnavailable {
                series: series_id.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    let cfg = Config::defaults();
    let now = ts(3, 2);

    let series = orchestrator::fetch_indicators(Arc::new(DownSource), &cfg, now).await;
    let dashboard = orchestrator::build_dashboard(&series, &cfg, now).unwrap();

    assert!(dashboard.rows.is_empty());
    assert!(dashboard.markers.is_empty());
    assert!(dashboard.latest.is_empty());
}
