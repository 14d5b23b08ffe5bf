use crate::core::models::{FetchErrorContext, FetchResult, LocationCode, TrackerError};
use crate::core::platform::{Platform, PlatformRegistry};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use std::io;
use std::time::Duration;

pub const DEFAULT_ENDPOINT_TEMPLATE: &str =
    "https://content{suffix}.warframe.com/dynamic/worldState.php";

const USER_AGENT: &str = concat!("anomaly-tracker/", env!("CARGO_PKG_VERSION"));

/// Anything that can report the current anomaly for a platform
#[async_trait]
pub trait WorldStateSource: Send + Sync {
    /// Never fails; every problem is folded into `FetchResult::Error`
    async fn fetch(&self, platform: Platform) -> FetchResult;
}

/// Fetches the world-state document over HTTP
pub struct HttpFetcher {
    client: Client,
    endpoint_template: String,
}

impl HttpFetcher {
    pub fn new(endpoint_template: &str, timeout: Duration) -> io::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| io::Error::other(format!("Failed to create HTTP client: {e}")))?;

        info!("Created world state fetcher for {endpoint_template} (timeout {timeout:?})");

        Ok(Self {
            client,
            endpoint_template: endpoint_template.to_string(),
        })
    }

    pub async fn fetch_world_state(
        &self,
        platform: Platform,
    ) -> Result<Option<LocationCode>, TrackerError> {
        let url = PlatformRegistry::endpoint_url(&self.endpoint_template, platform);
        debug!("Fetching world state for {platform} from {url}");

        let response = self.client.get(&url).send().await.map_err(|e| {
            let error = TrackerError::Network(e.to_string());
            FetchErrorContext::new(platform, "fetch_world_state")
                .with_error(&error)
                .with_request_details(&url, None, None)
                .log_error();
            error
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = TrackerError::HttpStatus(status.as_u16());
            FetchErrorContext::new(platform, "fetch_world_state")
                .with_error(&error)
                .with_request_details(&url, Some(status.as_u16()), Some(&body))
                .log_error();
            return Err(error);
        }

        let text = response.text().await.map_err(|e| {
            let error = TrackerError::Network(format!("Failed to read response: {e}"));
            FetchErrorContext::new(platform, "fetch_world_state")
                .with_error(&error)
                .with_request_details(&url, Some(status.as_u16()), None)
                .log_error();
            error
        })?;

        parse_world_state(&text).inspect_err(|error| {
            FetchErrorContext::new(platform, "parse_world_state")
                .with_error(error)
                .with_request_details(&url, Some(status.as_u16()), Some(&text))
                .log_error();
        })
    }
}

#[async_trait]
impl WorldStateSource for HttpFetcher {
    async fn fetch(&self, platform: Platform) -> FetchResult {
        match self.fetch_world_state(platform).await {
            Ok(location) => FetchResult::Ok(location),
            Err(_) => FetchResult::Error,
        }
    }
}

/// Extract the anomaly location from a world-state document.
///
/// The anomaly lives under `Tmp`, normally as a JSON document encoded
/// in a string (`"{\"sfn\":552}"`); an embedded object is accepted too.
pub fn parse_world_state(body: &str) -> Result<Option<LocationCode>, TrackerError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| TrackerError::MalformedResponse(format!("Invalid JSON: {e}")))?;

    if !document.is_object() {
        return Err(TrackerError::MalformedResponse(
            "World state is not a JSON object".to_string(),
        ));
    }

    let anomaly = match document.get("Tmp") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).map_err(|e| {
            TrackerError::MalformedResponse(format!("Invalid anomaly field: {e}"))
        })?,
        Some(other) => other.clone(),
    };

    match anomaly {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Object(fields) if fields.is_empty() => Ok(None),
        Value::Object(fields) => fields
            .get("sfn")
            .and_then(Value::as_u64)
            .and_then(|code| u32::try_from(code).ok())
            .map(|code| Some(LocationCode(code)))
            .ok_or_else(|| {
                TrackerError::MalformedResponse("Anomaly has no location code".to_string())
            }),
        other => Err(TrackerError::MalformedResponse(format!(
            "Unexpected anomaly value: {other}"
        ))),
    }
}
