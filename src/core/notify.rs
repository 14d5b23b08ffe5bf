//! Event consumers and the text they present

use crate::core::models::TransitionEvent;
use crate::core::scheduler::EventReceiver;
use chrono::{DateTime, Local};
use std::time::Duration;

pub const NOTIFICATION_TITLE: &str = "Sentient anomaly tracker";

/// Consumer of transition events (UI, tray, audio...)
pub trait NotificationSink: Send {
    fn notify(&mut self, event: &TransitionEvent);
}

/// Forward every event to the sink, in order, until the poller stops.
/// Returns how many events were delivered.
pub async fn deliver_events<S>(events: &mut EventReceiver, sink: &mut S) -> usize
where
    S: NotificationSink + ?Sized,
{
    let mut delivered = 0;
    while let Some(event) = events.recv().await {
        sink.notify(&event);
        delivered += 1;
    }
    delivered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Spawn,
    Despawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub text: String,
    pub duration: Duration,
}

/// Everything a presentation layer shows for one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    pub status: String,
    pub tooltip: String,
    pub popup: Option<Popup>,
    pub sound: Option<Sound>,
}

impl StatusText {
    pub fn for_event(event: &TransitionEvent) -> Self {
        match event {
            TransitionEvent::Spawned { location, at, .. } => {
                let name = location.display_name();
                let status = format!("Anomaly present at {name}");
                let tooltip = match at {
                    Some(at) => format!("Anomaly at {name} since {}", clock(at)),
                    None => format!("Anomaly at {name}"),
                };
                Self {
                    popup: Some(Popup {
                        text: status.clone(),
                        duration: Duration::from_secs(10),
                    }),
                    status,
                    tooltip,
                    sound: Some(Sound::Spawn),
                }
            }
            TransitionEvent::Despawned { at, .. } => Self {
                status: "No anomaly currently present".to_string(),
                tooltip: format!("No anomaly since {}", clock(at)),
                popup: Some(Popup {
                    text: "Anomaly despawned".to_string(),
                    duration: Duration::from_secs(2),
                }),
                sound: Some(Sound::Despawn),
            },
            TransitionEvent::InitialAbsent { .. } => Self {
                status: "No anomaly currently present".to_string(),
                tooltip: "No anomaly".to_string(),
                popup: None,
                sound: None,
            },
            TransitionEvent::ConnectionError { .. } => Self {
                status: "Connection error".to_string(),
                tooltip: "Connection error".to_string(),
                popup: None,
                sound: None,
            },
        }
    }
}

pub fn clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}
