use std::time::Duration;

use url::Url;

use super::entities::{FeedRecord, Snapshot};
use super::error::{FeedError, FeedResult};
use super::FeedSource;
use crate::config::Settings;

#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: Url,
    excluded_task_ids: Vec<String>,
}

impl FeedClient {
    pub fn new(
        base_url: &str,
        route_id: &str,
        timeout: Duration,
        excluded_task_ids: Vec<String>,
    ) -> FeedResult<FeedClient> {
        let mut url = Url::parse(base_url)
            .map_err(|e| FeedError::Init(format!("Invalid feed URL {}: {}", base_url, e)))?;
        url.query_pairs_mut().append_pair("ruta", route_id);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Init(e.to_string()))?;

        Ok(FeedClient {
            client,
            url,
            excluded_task_ids,
        })
    }

    pub fn from_settings(settings: &Settings) -> FeedResult<FeedClient> {
        FeedClient::new(
            &settings.feed_url,
            &settings.route_id,
            settings.fetch_timeout,
            settings.excluded_task_ids.clone(),
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self) -> FeedResult<String> {
        log::debug!("Requesting {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FeedError::Status(status.as_u16()));
        }

        let data_str = response.text().await?;
        log::trace!("Response: {}", data_str);
        Ok(data_str)
    }
}

impl FeedSource for FeedClient {
    async fn fetch(&self) -> FeedResult<Snapshot> {
        let body = self.request().await?;
        parse_snapshot(&body, &self.excluded_task_ids)
    }
}

/// Parses a marks payload into a snapshot.
///
/// The payload itself must be a JSON array, otherwise the whole fetch is rejected.
/// Individual records that are incomplete or carry impossible coordinates are
/// skipped with a warning, as are vehicles whose task id is excluded.
pub fn parse_snapshot(body: &str, excluded_task_ids: &[String]) -> FeedResult<Snapshot> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(FeedError::Malformed(format!(
                "expected a list of vehicles, got {}",
                kind_of(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let record: FeedRecord = match serde_json::from_value(item.clone()) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping malformed feed record ({}): {}", e, item);
                continue;
            }
        };

        if record.position().is_none() {
            log::warn!(
                "Skipping vehicle {} with impossible position {}, {}",
                record.id,
                record.gps_y,
                record.gps_x
            );
            continue;
        }

        if excluded_task_ids.contains(&record.task_id) {
            log::debug!("Ignoring vehicle {} on task {}", record.id, record.task_id);
            continue;
        }

        records.push(record);
    }

    Ok(Snapshot::new(records))
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}
