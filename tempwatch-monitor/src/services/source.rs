use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tempwatch_api::models::Reading;
use tempwatch_api::timestamp::{self, TimestampUnit};

use crate::errors::SourceError;
use crate::settings;

/// Provider of the most recent sensor reading.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// `Ok(None)` when the store holds no reading at all.
    async fn fetch_latest(&self) -> Result<Option<Reading>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct RawReading {
    temperature: Option<f32>,
    humidity: Option<f32>,
    #[serde(default)]
    timestamp: Value,
}

/// Reads the newest child of a realtime database list over its REST interface.
pub struct RealtimeDbSource {
    client: Client,
    url: Url,
    auth_token: Option<String>,
    unit: TimestampUnit,
}

impl RealtimeDbSource {
    pub fn new(source: &settings::Source) -> Result<Self, SourceError> {
        let base = format!("{}/", source.base_url.trim_end_matches('/'));
        let url = Url::parse(&base)
            .and_then(|base| base.join(&format!("{}.json", source.path.trim_matches('/'))))
            .map_err(|e| SourceError::Malformed(format!("invalid database url: {e}")))?;

        let client = Client::builder().timeout(source.fetch_timeout()).build()?;

        Ok(Self {
            client,
            url,
            auth_token: source.auth_token.clone(),
            unit: source.timestamp_unit,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ReadingSource for RealtimeDbSource {
    async fn fetch_latest(&self) -> Result<Option<Reading>, SourceError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .query(&[("orderBy", "\"$key\""), ("limitToLast", "1")]);

        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        parse_latest(&body, self.unit)
    }
}

/// Extracts the newest reading from a list snapshot.
///
/// The database returns `null` for an empty list, an object keyed by
/// chronologically ordered push ids, or an array when keys are sequential.
pub fn parse_latest(body: &Value, unit: TimestampUnit) -> Result<Option<Reading>, SourceError> {
    let record = match body {
        Value::Null => return Ok(None),
        Value::Object(children) => children
            .iter()
            .max_by(|(left, _), (right, _)| left.cmp(right))
            .map(|(_, record)| record),
        Value::Array(children) => children.iter().rev().find(|record| !record.is_null()),
        other => {
            return Err(SourceError::Malformed(format!(
                "expected a list of readings, got {other}"
            )));
        }
    };

    let Some(record) = record else {
        return Ok(None);
    };

    let raw: RawReading = serde_json::from_value(record.clone())?;
    let timestamp_ms = timestamp::normalize(&raw.timestamp, unit);
    if timestamp_ms.is_none() {
        tracing::warn!("invalid timestamp format: {}", raw.timestamp);
    }

    Ok(Some(Reading {
        temperature: raw.temperature.unwrap_or(0.0),
        humidity: raw.humidity.unwrap_or(0.0),
        timestamp_ms,
    }))
}
