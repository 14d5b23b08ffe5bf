use crate::core::platform::{Platform, PlatformRegistry};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// In-game location identifier carried by an active anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationCode(pub u32);

impl LocationCode {
    /// Resolved name, or a placeholder when the code is not in the table
    pub fn display_name(&self) -> String {
        match PlatformRegistry::location_name(*self) {
            Ok(name) => name.to_string(),
            Err(e) => {
                log::warn!("{e}");
                format!("Unknown location ({})", self.0)
            }
        }
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceState {
    #[default]
    Unknown,
    Absent,
    Present,
}

/// Per-platform state owned by the presence tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformStatus {
    pub state: PresenceState,
    pub last_spawn_at: Option<DateTime<Local>>,
    pub last_despawn_at: Option<DateTime<Local>>,
}

/// Outcome of one world-state fetch. Carries no platform identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult {
    Ok(Option<LocationCode>),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent {
    /// `at` is `None` when the anomaly was already active on first observation
    Spawned {
        platform: Platform,
        location: LocationCode,
        at: Option<DateTime<Local>>,
    },
    Despawned {
        platform: Platform,
        at: DateTime<Local>,
    },
    InitialAbsent {
        platform: Platform,
    },
    ConnectionError {
        platform: Platform,
    },
}

impl TransitionEvent {
    pub fn platform(&self) -> Platform {
        match self {
            TransitionEvent::Spawned { platform, .. }
            | TransitionEvent::Despawned { platform, .. }
            | TransitionEvent::InitialAbsent { platform }
            | TransitionEvent::ConnectionError { platform } => *platform,
        }
    }
}

/// Error types for world-state operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    Network(String),
    HttpStatus(u16),
    MalformedResponse(String),
    UnknownLocation(u32),
}

impl TrackerError {
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::Network(_) => "network_error",
            TrackerError::HttpStatus(_) => "api_error",
            TrackerError::MalformedResponse(_) => "json_parse_error",
            TrackerError::UnknownLocation(_) => "unknown_location",
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Network(msg) => write!(f, "Network error: {msg}"),
            TrackerError::HttpStatus(code) => {
                write!(f, "World state endpoint returned HTTP {code}")
            }
            TrackerError::MalformedResponse(msg) => write!(f, "Malformed response: {msg}"),
            TrackerError::UnknownLocation(code) => write!(f, "Unknown location code: {code}"),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<TrackerError> for io::Error {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::MalformedResponse(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            _ => io::Error::other(err),
        }
    }
}

/// Structured context for a failed fetch, reported through the log
#[derive(Debug, Clone, Serialize)]
pub struct FetchErrorContext {
    pub platform_id: String,
    pub operation: String,
    pub timestamp: String,
    pub error_type: String,
    pub error_message: String,
    pub request_url: Option<String>,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
}

impl FetchErrorContext {
    const BODY_EXCERPT_LEN: usize = 200;

    pub fn new(platform: Platform, operation: &str) -> Self {
        Self {
            platform_id: platform.id().to_string(),
            operation: operation.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            error_type: String::new(),
            error_message: String::new(),
            request_url: None,
            status_code: None,
            response_body: None,
        }
    }

    pub fn with_error(mut self, error: &TrackerError) -> Self {
        self.error_type = error.kind().to_string();
        self.error_message = error.to_string();
        self
    }

    pub fn with_request_details(
        mut self,
        url: &str,
        status_code: Option<u16>,
        response_body: Option<&str>,
    ) -> Self {
        self.request_url = Some(url.to_string());
        self.status_code = status_code;
        self.response_body =
            response_body.map(|s| s.chars().take(Self::BODY_EXCERPT_LEN).collect());
        self
    }

    pub fn log_error(&self) {
        log::error!(
            target: "fetch_errors",
            "Fetch error: {} | Operation: {} | Type: {} | Message: {} | URL: {:?} | Status: {:?} | Body: {:?}",
            self.platform_id,
            self.operation,
            self.error_type,
            self.error_message,
            self.request_url,
            self.status_code,
            self.response_body
        );
    }
}

#[derive(Debug, Clone)]
pub struct DataPath {
    pub root: PathBuf,
}

impl DataPath {
    pub fn new(data_path: Option<PathBuf>) -> io::Result<Self> {
        let root = match data_path {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "Home directory not found. Please specify --data-path.",
                    )
                })?
                .join(".anomaly-tracker"),
        };

        Ok(Self { root })
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }
}
