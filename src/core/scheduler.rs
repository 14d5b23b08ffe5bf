//! Background polling task

use crate::core::fetcher::WorldStateSource;
use crate::core::models::TransitionEvent;
use crate::core::platform::Platform;
use crate::core::tracker::PresenceTracker;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub type EventSender = mpsc::Sender<TransitionEvent>;
pub type EventReceiver = mpsc::Receiver<TransitionEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    SetPlatform(Platform),
    TriggerNow,
    Reset,
}

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub platform: Platform,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            platform: Platform::default(),
        }
    }
}

/// Handle to the polling task.
///
/// The task owns the presence tracker; the handle only sends commands.
/// Dropping the handle stops the task.
pub struct PollScheduler {
    commands: mpsc::Sender<Command>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollScheduler {
    /// Spawn the polling task. The first fetch happens immediately.
    pub fn start(
        source: Arc<dyn WorldStateSource>,
        config: PollerConfig,
    ) -> (Self, EventReceiver) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(100);
        let (stop_tx, stop_rx) = watch::channel(false);

        info!(
            "Starting poller for {} every {:?}",
            config.platform, config.interval
        );
        let task = tokio::spawn(run(source, config, command_rx, stop_rx, event_tx));

        (
            Self {
                commands: command_tx,
                stop: stop_tx,
                task,
            },
            event_rx,
        )
    }

    /// Fetch now without disturbing the periodic cadence
    pub async fn trigger_now(&self) {
        self.send(Command::TriggerNow).await;
    }

    /// Retarget future ticks; does not fetch by itself
    pub async fn set_platform(&self, platform: Platform) {
        self.send(Command::SetPlatform(platform)).await;
    }

    pub async fn switch_platform(&self, platform: Platform) {
        self.set_platform(platform).await;
        self.trigger_now().await;
    }

    /// Forget the active platform's state and timestamps
    pub async fn reset(&self) {
        self.send(Command::Reset).await;
    }

    /// Cancel the timer and any in-flight fetch. Idempotent.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Stop and wait for the task to wind down
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            warn!("Poller task ended abnormally: {e}");
        }
    }

    async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            debug!("Poller already stopped, dropping {command:?}");
        }
    }
}

async fn run(
    source: Arc<dyn WorldStateSource>,
    config: PollerConfig,
    mut commands: mpsc::Receiver<Command>,
    mut stop: watch::Receiver<bool>,
    events: EventSender,
) {
    let mut tracker = PresenceTracker::new();
    let mut active = config.platform;
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let platform = tokio::select! {
            biased;
            _ = stop.changed() => break,
            command = commands.recv() => match command {
                Some(Command::SetPlatform(platform)) => {
                    if platform != active {
                        info!("Switching platform from {active} to {platform}");
                        active = platform;
                    }
                    continue;
                }
                Some(Command::Reset) => {
                    info!("Resetting state for {active}");
                    tracker.reset(active);
                    continue;
                }
                Some(Command::TriggerNow) => {
                    debug!("Manual refresh for {active}");
                    active
                }
                None => break,
            },
            _ = ticker.tick() => active,
        };

        // The result is routed by the platform it was requested for, so a
        // switch queued behind this fetch cannot leak into the new platform.
        let result = tokio::select! {
            biased;
            _ = stop.changed() => break,
            result = source.fetch(platform) => result,
        };

        if let Some(event) = tracker.process(platform, result) {
            debug!("Emitting {event:?}, status now {:?}", tracker.status(platform));
            let delivered = tokio::select! {
                biased;
                _ = stop.changed() => break,
                sent = events.send(event) => sent.is_ok(),
            };
            if !delivered {
                info!("Event receiver closed, stopping poller");
                break;
            }
        }
    }

    info!("Poller stopped");
}
