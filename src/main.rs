// MIT License - Copyright (c) 2026 Peter Wright
// Headless dashboard monitor

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::RwLock;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use homehub::{
    AiBackoff, AiClient, HubConfig, HubError, HubEvent, Mode, NotableEvent, Preferences,
    ReconnectPolicy, SensorSnapshot, StateHub,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "homehub")]
#[command(about = "Headless monitor for a smart-home MQTT installation")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    broker: BrokerToml,
    ai: Option<AiToml>,
    /// Where notification/theme preferences are persisted.
    prefs_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BrokerToml {
    host: String,
    port: u16,
    client_id: String,
    namespace: String,
    idle_grace_secs: u64,
    reconnect_pause_ms: u64,
    keep_alive_secs: u64,
}

impl Default for BrokerToml {
    fn default() -> Self {
        let hub = HubConfig::default();
        let reconnect = ReconnectPolicy::default();
        Self {
            host: hub.broker_host,
            port: hub.broker_port,
            client_id: hub.client_id,
            namespace: hub.namespace,
            idle_grace_secs: hub.idle_grace.as_secs(),
            reconnect_pause_ms: reconnect.pause.as_millis() as u64,
            keep_alive_secs: reconnect.keep_alive.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AiToml {
    /// Base URL of the AI function endpoints.
    base_url: String,
    #[serde(default = "default_ai_base_delay")]
    base_delay_secs: u64,
    #[serde(default = "default_ai_max_delay")]
    max_delay_secs: u64,
}

fn default_ai_base_delay() -> u64 {
    60
}
fn default_ai_max_delay() -> u64 {
    600
}

fn load_config(path: &str) -> Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(text) => toml::from_str(&text).context("Failed to parse config file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {path} not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("Failed to read config file"),
    }
}

fn build_hub_config(toml: &BrokerToml) -> HubConfig {
    HubConfig::builder()
        .broker_host(&toml.host)
        .broker_port(toml.port)
        .client_id(&toml.client_id)
        .namespace(&toml.namespace)
        .idle_grace(Duration::from_secs(toml.idle_grace_secs))
        .reconnect(ReconnectPolicy {
            pause: Duration::from_millis(toml.reconnect_pause_ms),
            keep_alive: Duration::from_secs(toml.keep_alive_secs),
        })
        .build()
}

// ---------------------------------------------------------------------------
// Event monitor
// ---------------------------------------------------------------------------

/// Consume hub events: log connection transitions, notable events and
/// threshold crossings.
async fn run_monitor(hub: StateHub, prefs: Arc<RwLock<Preferences>>) {
    let mut sub = hub.attach();
    let mut last_connected = None;
    let mut last_sensors: Option<SensorSnapshot> = None;

    loop {
        match sub.recv().await {
            Ok(HubEvent::StateChanged(state)) => {
                if last_connected != Some(state.connection.connected) {
                    if state.connection.connected {
                        info!("Connected to smart home");
                    } else {
                        warn!("Disconnected from smart home ({:?})", state.connection.reason);
                    }
                    last_connected = Some(state.connection.connected);
                }

                let sensors_changed = last_sensors.as_ref() != Some(&state.sensors);
                if sensors_changed {
                    debug!(
                        "{:.1}°C {:.1}% bulb={} fan={} speed={}% mode={}",
                        state.sensors.temperature,
                        state.sensors.humidity,
                        state.sensors.bulb.as_payload(),
                        state.sensors.fan.as_payload(),
                        state.sensors.fan_speed,
                        state.sensors.mode.as_payload(),
                    );
                    let prefs = prefs.read().await;
                    for alert in prefs.notifications.check(&state.sensors) {
                        warn!("{alert}");
                    }
                    last_sensors = Some(state.sensors);
                }
            }
            Ok(HubEvent::Notable(NotableEvent::MotionDetected)) => {
                info!("Motion detected!");
            }
            Ok(HubEvent::Notable(NotableEvent::Alert(message))) => {
                warn!("Alert: {message}");
            }
            Ok(HubEvent::PublishRejected { channel }) => {
                warn!("Command on {channel} dropped, not connected");
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event receiver lagged, missed {n} events");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!("Event channel closed");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AUTO fan loop
// ---------------------------------------------------------------------------

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Periodically ask the AI endpoint for a fan speed while the system is
/// in AUTO mode and a real temperature reading exists.
///
/// The timer is disarmed the moment the mode leaves AUTO. Rate-limit
/// responses double the delay via [`AiBackoff`]; skipped calls are never
/// queued.
async fn run_auto_fan(hub: StateHub, ai: AiClient, mut backoff: AiBackoff) {
    let mut sub = hub.attach();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            event = sub.recv() => match event {
                Ok(HubEvent::StateChanged(state)) => {
                    let eligible =
                        state.sensors.mode == Mode::Auto && state.sensors.temperature > 0.0;
                    if eligible && deadline.is_none() {
                        debug!("AUTO mode active, next AI call in {:?}", backoff.delay());
                        deadline = Some(Instant::now() + backoff.delay());
                    } else if !eligible && deadline.is_some() {
                        debug!("Leaving AUTO mode, AI timer cleared");
                        deadline = None;
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("AI loop lagged, missed {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            () = wait_until(deadline) => {
                deadline = None;
                let state = hub.snapshot().await;
                if state.sensors.mode != Mode::Auto || state.sensors.temperature <= 0.0 {
                    continue;
                }

                match ai
                    .suggest_fan_speed(state.sensors.temperature, state.sensors.humidity)
                    .await
                {
                    Ok(suggestion) => {
                        info!(
                            "AI suggests fan speed {}%: {}",
                            suggestion.clamped_speed(),
                            suggestion.reason
                        );
                        hub.set_fan_speed(suggestion.clamped_speed());
                        backoff.on_success();
                    }
                    Err(HubError::AiRateLimited) => {
                        backoff.on_rate_limit();
                        warn!("AI endpoint rate limited, backing off to {:?}", backoff.delay());
                    }
                    Err(e) => {
                        warn!("AI fan suggestion failed: {e}");
                    }
                }
                deadline = Some(Instant::now() + backoff.delay());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=homehub=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let prefs_path = config
        .prefs_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("prefs.toml"));
    let prefs = Preferences::load(&prefs_path).context("Failed to load preferences")?;
    debug!("Preferences loaded: theme={:?}", prefs.theme);
    let prefs = Arc::new(RwLock::new(prefs));

    info!(
        "Connecting hub to {}:{} (namespace {})",
        config.broker.host, config.broker.port, config.broker.namespace
    );
    let hub = StateHub::new(build_hub_config(&config.broker));

    let monitor_handle = tokio::spawn(run_monitor(hub.clone(), prefs.clone()));

    let fan_handle = config.ai.as_ref().map(|ai_toml| {
        let ai = AiClient::new(&ai_toml.base_url);
        let backoff = AiBackoff::new(
            Duration::from_secs(ai_toml.base_delay_secs),
            Duration::from_secs(ai_toml.max_delay_secs),
        );
        tokio::spawn(run_auto_fan(hub.clone(), ai, backoff))
    });
    if fan_handle.is_none() {
        info!("No [ai] section configured, AUTO fan loop disabled");
    }

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    info!("Monitor running. Send SIGHUP to reload preferences, SIGINT/SIGTERM to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading preferences from {}", prefs_path.display());
                match Preferences::load(&prefs_path) {
                    Ok(new_prefs) => {
                        *prefs.write().await = new_prefs;
                        info!("Preferences reloaded");
                    }
                    Err(e) => warn!("Failed to reload preferences, keeping previous: {e}"),
                }
            }
        }
    }

    monitor_handle.abort();
    if let Some(handle) = fan_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}
