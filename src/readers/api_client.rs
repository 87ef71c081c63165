use crate::error::{ProcessingError, Result};
use crate::models::{HistoryQuery, RawDataset};
use crate::utils::constants::{DEFAULT_TIMEOUT_SECS, TIMESTAMP_COLUMN};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Client for the Air4Thai `getHistoryData` endpoint
pub struct AirQualityClient {
    http: reqwest::Client,
    base_url: String,
}

impl AirQualityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn with_default_timeout(base_url: &str) -> Result<Self> {
        Self::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the readings described by `query` as a raw table whose
    /// columns follow the query's channel order.
    pub async fn fetch_history(&self, query: &HistoryQuery) -> Result<RawDataset> {
        query.check()?;
        let url = query.to_url(&self.base_url)?;
        info!(station = %query.station_id, %url, "Requesting history data");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        let dataset = parse_history_response(&body, &query.channel_codes())?;
        info!(rows = dataset.len(), "Received history data");
        Ok(dataset)
    }
}

/// Extract `stations[0].data` from a history response.
///
/// Records missing a channel key get a missing value for it; keys not in
/// `channels` are ignored.
pub fn parse_history_response(body: &Value, channels: &[String]) -> Result<RawDataset> {
    let station = body
        .get("stations")
        .and_then(Value::as_array)
        .and_then(|stations| stations.first())
        .ok_or_else(|| ProcessingError::MissingData("stations[0]".to_string()))?;

    let records = station
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ProcessingError::MissingData("stations[0].data".to_string()))?;

    let mut dataset = RawDataset::new(channels.to_vec());
    for (i, record) in records.iter().enumerate() {
        let timestamp = record
            .get(TIMESTAMP_COLUMN)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProcessingError::MissingData(format!("stations[0].data[{}].{}", i, TIMESTAMP_COLUMN))
            })?;

        let values = channels
            .iter()
            .map(|c| record.get(c).and_then(reading_value))
            .collect();
        dataset.push_row(timestamp.to_string(), values)?;
    }

    debug!(records = records.len(), "Parsed history response");
    Ok(dataset)
}

/// Numbers and numeric strings are readings; anything else is missing.
fn reading_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn channels() -> Vec<String> {
        vec!["PM25".to_string(), "TEMP".to_string()]
    }

    /// Answer a single HTTP request on a loopback port. Resolves to the
    /// request head the client sent.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!(
            "http://{}/forweb/getHistoryData.php",
            listener.local_addr().unwrap()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    fn query() -> HistoryQuery {
        HistoryQuery::new(
            chrono::NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2023, 12, 2).unwrap(),
        )
        .with_channels(vec![Channel::Pm25, Channel::Temperature])
    }

    #[tokio::test]
    async fn test_fetch_history_over_http() {
        let body = json!({
            "stations": [{
                "stationID": "44t",
                "data": [
                    {"DATETIMEDATA": "2023-12-01 00:00:00", "PM25": 21.5, "TEMP": 27.3},
                    {"DATETIMEDATA": "2023-12-01 01:00:00", "PM25": 18, "TEMP": null}
                ]
            }]
        });
        let (base_url, server) = serve_once("200 OK", body.to_string()).await;

        let client = AirQualityClient::with_default_timeout(&base_url).unwrap();
        let dataset = client.fetch_history(&query()).await.unwrap();

        assert_eq!(dataset.channels, channels());
        assert_eq!(dataset.rows[0].values, vec![Some(21.5), Some(27.3)]);
        assert_eq!(dataset.rows[1].values, vec![Some(18.0), None]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /forweb/getHistoryData.php?"));
        assert!(request.contains("stationID=44t"));
        assert!(request.contains("param=PM25%2CTEMP"));
        assert!(request.contains("sdate=2023-12-01"));
    }

    #[tokio::test]
    async fn test_fetch_history_error_status() {
        let (base_url, server) = serve_once("500 Internal Server Error", "{}".to_string()).await;

        let client = AirQualityClient::with_default_timeout(&base_url).unwrap();
        let err = client.fetch_history(&query()).await.unwrap_err();

        assert!(matches!(err, ProcessingError::Http(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_history_invalid_body() {
        let (base_url, server) = serve_once("200 OK", "not json".to_string()).await;

        let client = AirQualityClient::with_default_timeout(&base_url).unwrap();
        assert!(client.fetch_history(&query()).await.is_err());
        server.await.unwrap();
    }

    #[test]
    fn test_client_construction() {
        let client =
            AirQualityClient::with_default_timeout(crate::utils::constants::DEFAULT_API_URL)
                .unwrap();
        assert_eq!(client.base_url(), "http://air4thai.com/forweb/getHistoryData.php");
    }

    #[test]
    fn test_parse_history_response() {
        let body = json!({
            "stations": [{
                "stationID": "44t",
                "data": [
                    {"DATETIMEDATA": "2023-12-01 00:00:00", "PM25": 21.5, "TEMP": "27.3"},
                    {"DATETIMEDATA": "2023-12-01 01:00:00", "PM25": null, "TEMP": "-"},
                    {"DATETIMEDATA": "2023-12-01 02:00:00", "PM25": 19, "EXTRA": 1}
                ]
            }]
        });

        let dataset = parse_history_response(&body, &channels()).unwrap();

        assert_eq!(dataset.channels, channels());
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows[0].values, vec![Some(21.5), Some(27.3)]);
        assert_eq!(dataset.rows[1].values, vec![None, None]);
        assert_eq!(dataset.rows[2].values, vec![Some(19.0), None]);
        assert_eq!(dataset.rows[2].timestamp, "2023-12-01 02:00:00");
    }

    #[test]
    fn test_missing_station_list() {
        let err = parse_history_response(&json!({"stations": []}), &channels()).unwrap_err();
        assert!(matches!(err, ProcessingError::MissingData(ref f) if f == "stations[0]"));

        let err = parse_history_response(&json!({"result": "error"}), &channels()).unwrap_err();
        assert!(matches!(err, ProcessingError::MissingData(_)));
    }

    #[test]
    fn test_missing_data_array() {
        let body = json!({"stations": [{"stationID": "44t"}]});
        let err = parse_history_response(&body, &channels()).unwrap_err();
        assert!(matches!(err, ProcessingError::MissingData(ref f) if f == "stations[0].data"));
    }

    #[test]
    fn test_record_without_timestamp() {
        let body = json!({"stations": [{"data": [{"PM25": 1.0}]}]});
        assert!(parse_history_response(&body, &channels()).is_err());
    }

    #[test]
    fn test_empty_data_array() {
        let body = json!({"stations": [{"data": []}]});
        let dataset = parse_history_response(&body, &channels()).unwrap();
        assert!(dataset.is_empty());
    }
}
