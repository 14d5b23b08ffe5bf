use crate::core::{
    config::{ConfigService, TrackerConfig, validate_endpoint_template},
    fetcher::{HttpFetcher, WorldStateSource},
    models::DataPath,
    notify::{NotificationSink, deliver_events},
    platform::{Platform, PlatformRegistry},
    scheduler::PollScheduler,
    tracker::PresenceTracker,
};
use crate::terminal::ConsoleSink;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "anomaly-tracker")]
#[command(about = "Watches the world state and notifies when a sentient anomaly spawns or despawns.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets a custom data path
    #[arg(long, value_name = "DIR")]
    pub data_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll continuously and report every spawn and despawn
    Watch {
        /// Platform to watch (PC, PS4, XB1); defaults to the configured one
        #[arg(long)]
        platform: Option<Platform>,
        /// Endpoint template containing {suffix}
        #[arg(long, value_name = "TEMPLATE")]
        endpoint: Option<String>,
    },
    /// Fetch once and print the current status
    Check {
        /// Platform to check (PC, PS4, XB1); defaults to the configured one
        #[arg(long)]
        platform: Option<Platform>,
        /// Endpoint template containing {suffix}
        #[arg(long, value_name = "TEMPLATE")]
        endpoint: Option<String>,
    },
    /// List the known anomaly locations
    Locations,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// The key to get
        key: String,
    },
    /// Set a configuration value
    Set {
        /// The key to set
        key: String,
        /// The value to set
        value: String,
    },
}

/// A line typed by the user while watching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    Refresh,
    Switch(Platform),
    Reset,
    Quit,
    Help,
}

impl WatchCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => None,
            "r" | "refresh" => Some(WatchCommand::Refresh),
            "reset" => Some(WatchCommand::Reset),
            "q" | "quit" | "exit" => Some(WatchCommand::Quit),
            _ => Some(
                line.parse()
                    .map(WatchCommand::Switch)
                    .unwrap_or(WatchCommand::Help),
            ),
        }
    }
}

const WATCH_HELP: &str = "Commands: r = refresh now, pc/ps4/xb1 = switch platform, reset = forget timestamps, q = quit";

fn effective_config(
    data_path: &DataPath,
    platform: Option<Platform>,
    endpoint: &Option<String>,
) -> io::Result<TrackerConfig> {
    let mut config = ConfigService::load_config(data_path)?;
    if let Some(platform) = platform {
        config.platform = platform;
    }
    if let Some(endpoint) = endpoint {
        validate_endpoint_template(endpoint)?;
        config.endpoint_template = endpoint.clone();
    }
    Ok(config)
}

/// Persist only the platform, leaving command-line overrides out of the file
fn remember_platform(data_path: &DataPath, platform: Platform) -> io::Result<()> {
    let mut stored = ConfigService::load_config(data_path)?;
    stored.platform = platform;
    ConfigService::save_config(&stored, data_path)
}

pub async fn handle_check_command(
    data_path: &DataPath,
    platform: Option<Platform>,
    endpoint: &Option<String>,
) -> io::Result<()> {
    let config = effective_config(data_path, platform, endpoint)?;
    let fetcher = HttpFetcher::new(&config.endpoint_template, config.request_timeout())?;

    let result = fetcher.fetch(config.platform).await;
    let mut tracker = PresenceTracker::new();
    let mut sink = ConsoleSink::stdout(false, false);
    if let Some(event) = tracker.process(config.platform, result) {
        sink.notify(&event);
    }
    Ok(())
}

pub async fn handle_watch_command(
    data_path: &DataPath,
    platform: Option<Platform>,
    endpoint: &Option<String>,
) -> io::Result<()> {
    let config = effective_config(data_path, platform, endpoint)?;
    let fetcher = HttpFetcher::new(&config.endpoint_template, config.request_timeout())?;
    let mut active = config.platform;

    println!(
        "Watching {} (every {}s). {WATCH_HELP}",
        config.platform, config.poll_interval_secs
    );

    let (scheduler, mut events) = PollScheduler::start(Arc::new(fetcher), config.poller_config());
    let mut sink = ConsoleSink::stdout(config.sounds, config.messages);
    let mut delivery = tokio::spawn(async move { deliver_events(&mut events, &mut sink).await });

    let mut input = spawn_stdin_reader();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping");
                break;
            }
            _ = &mut delivery => {
                warn!("Event delivery ended unexpectedly");
                break;
            }
            Some(command) = input.recv() => match command {
                WatchCommand::Refresh => scheduler.trigger_now().await,
                WatchCommand::Switch(platform) => {
                    if platform != active {
                        active = platform;
                        println!("Switched to {platform}");
                        if let Err(e) = remember_platform(data_path, platform) {
                            warn!("Failed to save platform choice: {e}");
                        }
                    }
                    scheduler.switch_platform(platform).await;
                }
                WatchCommand::Reset => {
                    scheduler.reset().await;
                    scheduler.trigger_now().await;
                }
                WatchCommand::Quit => break,
                WatchCommand::Help => println!("{WATCH_HELP}"),
            },
        }
    }

    scheduler.shutdown().await;
    if !delivery.is_finished() {
        match delivery.await {
            Ok(count) => info!("Delivered {count} notifications"),
            Err(e) => warn!("Event delivery task failed: {e}"),
        }
    }
    Ok(())
}

/// Blocking stdin reads live on a detached thread so they never hold up shutdown
fn spawn_stdin_reader() -> mpsc::Receiver<WatchCommand> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            };
            if let Some(command) = WatchCommand::parse(&line)
                && tx.blocking_send(command).is_err()
            {
                break;
            }
        }
    });
    rx
}

pub fn handle_locations_command() {
    println!("Known anomaly locations:");
    for (code, name) in PlatformRegistry::locations() {
        println!("  {code}  {name}");
    }
}

pub fn handle_config_command(
    data_path: &DataPath,
    command: &Option<ConfigCommands>,
) -> io::Result<()> {
    match command {
        Some(ConfigCommands::Get { key }) => {
            let config = ConfigService::load_config(data_path)?;
            println!("{key}: {}", config.get(key)?);
        }
        Some(ConfigCommands::Set { key, value }) => {
            let mut config = ConfigService::load_config(data_path)?;
            config.set(key, value)?;
            ConfigService::save_config(&config, data_path)?;
            info!("Updated {key} configuration");
            println!("{key} set to: {}", config.get(key)?);
            println!("Config file: {}", data_path.config_path().display());
        }
        None => {
            let config = ConfigService::load_config(data_path)?;
            println!("Current Configuration:");
            println!("======================");
            for key in TrackerConfig::KEYS {
                println!("{key}: {}", config.get(key)?);
            }
            println!();
            println!("Config file: {}", data_path.config_path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_command_parsing() {
        assert_eq!(WatchCommand::parse("r"), Some(WatchCommand::Refresh));
        assert_eq!(WatchCommand::parse(" Refresh \n"), Some(WatchCommand::Refresh));
        assert_eq!(
            WatchCommand::parse("ps4"),
            Some(WatchCommand::Switch(Platform::Ps4))
        );
        assert_eq!(
            WatchCommand::parse("XB1"),
            Some(WatchCommand::Switch(Platform::Xb1))
        );
        assert_eq!(WatchCommand::parse("reset"), Some(WatchCommand::Reset));
        assert_eq!(WatchCommand::parse("q"), Some(WatchCommand::Quit));
        assert_eq!(WatchCommand::parse("what"), Some(WatchCommand::Help));
        assert_eq!(WatchCommand::parse("   "), None);
    }
}
