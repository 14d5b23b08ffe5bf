//! Per-platform presence state machine

use crate::core::models::{FetchResult, PlatformStatus, PresenceState, TransitionEvent};
use crate::core::platform::Platform;
use chrono::{DateTime, Local};
use log::debug;
use std::collections::HashMap;

/// Apply one fetch result to a platform's status.
///
/// Pure in `(status, result, now)`; returns the event to deliver, if any.
pub fn apply(
    platform: Platform,
    status: &mut PlatformStatus,
    result: FetchResult,
    now: DateTime<Local>,
) -> Option<TransitionEvent> {
    let previous = status.state;

    match result {
        FetchResult::Error => {
            status.state = PresenceState::Unknown;
            Some(TransitionEvent::ConnectionError { platform })
        }
        FetchResult::Ok(Some(location)) => {
            status.state = PresenceState::Present;
            match previous {
                PresenceState::Present => None,
                PresenceState::Absent => {
                    status.last_spawn_at = Some(now);
                    Some(TransitionEvent::Spawned {
                        platform,
                        location,
                        at: Some(now),
                    })
                }
                PresenceState::Unknown => Some(TransitionEvent::Spawned {
                    platform,
                    location,
                    at: None,
                }),
            }
        }
        FetchResult::Ok(None) => {
            status.state = PresenceState::Absent;
            match previous {
                PresenceState::Present => {
                    status.last_despawn_at = Some(now);
                    Some(TransitionEvent::Despawned { platform, at: now })
                }
                PresenceState::Unknown => Some(TransitionEvent::InitialAbsent { platform }),
                PresenceState::Absent => None,
            }
        }
    }
}

/// Owns the `Platform -> PlatformStatus` map
#[derive(Debug, Default)]
pub struct PresenceTracker {
    statuses: HashMap<Platform, PlatformStatus>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a result to the platform it was fetched for
    pub fn process(&mut self, platform: Platform, result: FetchResult) -> Option<TransitionEvent> {
        self.process_at(platform, result, Local::now())
    }

    pub fn process_at(
        &mut self,
        platform: Platform,
        result: FetchResult,
        now: DateTime<Local>,
    ) -> Option<TransitionEvent> {
        let status = self.statuses.entry(platform).or_default();
        let event = apply(platform, status, result, now);
        debug!("{platform}: {result:?} -> {:?} ({event:?})", status.state);
        event
    }

    pub fn status(&self, platform: Platform) -> PlatformStatus {
        self.statuses.get(&platform).copied().unwrap_or_default()
    }

    /// Forget timestamps and return the platform to `Unknown`
    pub fn reset(&mut self, platform: Platform) {
        self.statuses.remove(&platform);
    }
}
