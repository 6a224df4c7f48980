use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::DataSource;
use crate::error::PipelineError;
use crate::models::DataPoint;

const FRED_BASE: &str = "https://api.stlouisfed.org/fred/series/observations";

pub struct FredFetcher {
    api_key: String,
    client: Client,
}

impl FredFetcher {
    pub fn new(api_key: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("CreditMonitor/1.0"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    fn unavailable(series_id: &str, reason: impl ToString) -> PipelineError {
        PipelineError::SourceUnavailable {
            series: series_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// FRED observations arrive as `{ "date": "2023-01-01", "value": "123.45" }`;
    /// a value of "." marks a missing observation and is skipped.
    fn parse_observations(series_id: &str, json: &Value) -> Result<Vec<DataPoint>, PipelineError> {
        let observations = json["observations"].as_array().ok_or_else(|| {
            Self::unavailable(series_id, "no observations array in FRED response")
        })?;

        let mut data_points = Vec::new();

        for obs in observations {
            if let (Some(date_str), Some(value_str)) = (obs["date"].as_str(), obs["value"].as_str())
            {
                if value_str == "." {
                    continue;
                }

                if let Ok(value) = value_str.parse::<f64>() {
                    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                        .map_err(|e| Self::unavailable(series_id, e))?;
                    let timestamp =
                        Utc.from_utc_datetime(&naive_date.and_hms_opt(0, 0, 0).unwrap());

                    data_points.push(DataPoint { timestamp, value });
                }
            }
        }

        // FRED usually returns ascending order already; enforce it anyway so
        // the merge's sorted-unique precondition holds.
        data_points.sort_by_key(|dp| dp.timestamp);
        data_points.dedup_by_key(|dp| dp.timestamp);

        Ok(data_points)
    }
}

#[async_trait]
impl DataSource for FredFetcher {
    fn name(&self) -> &str {
        "fred"
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, PipelineError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(Self::unavailable(series_id, "FRED API key is empty"));
        }
        if api_key.len() != 32 {
            warn!(len = api_key.len(), "FRED API key is not 32 chars, request will likely fail");
        }

        let url = format!(
            "{}?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            FRED_BASE,
            series_id,
            api_key,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );

        debug!(series_id, %start, "fetching FRED series");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::unavailable(series_id, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::unavailable(
                series_id,
                format!("FRED API error {}: {}", status, body),
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| Self::unavailable(series_id, e))?;

        Self::parse_observations(series_id, &json)
    }
}
