// MIT License - Copyright (c) 2026 Peter Wright
// homehub library
//
//! # homehub
//!
//! Shared MQTT state hub for a small smart-home installation
//! (temperature/humidity sensors, a light, a fan, an RGB light, a
//! motion sensor) plus a client for two AI helper endpoints.
//!
//! The centerpiece is [`StateHub`]: a lazily connected, interest-counted
//! owner of a single broker session. Any number of consumers attach and
//! detach independently; the hub keeps the connection alive while at
//! least one subscription exists and tears it down 60 seconds after the
//! last one is dropped, retaining the last known snapshot for consumers
//! that arrive later.
//!
//! Inbound payloads are decoded per channel ([`topic`]), folded into an
//! immutable snapshot by a pure reducer ([`state`]), and fanned out to
//! every subscriber as [`HubEvent`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use homehub::{HubConfig, HubEvent, StateHub, SwitchState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HubConfig::builder()
//!         .broker_host("broker.hivemq.com")
//!         .namespace("yuvraj/home")
//!         .build();
//!
//!     let hub = StateHub::new(config);
//!     let mut sub = hub.attach();
//!
//!     tokio::spawn(async move {
//!         while let Ok(event) = sub.recv().await {
//!             match event {
//!                 HubEvent::StateChanged(state) => {
//!                     println!("{:.1}°C, {:.1}%", state.sensors.temperature, state.sensors.humidity);
//!                 }
//!                 HubEvent::Notable(notable) => println!("Notable: {notable:?}"),
//!                 HubEvent::PublishRejected { channel } => println!("Dropped: {channel}"),
//!             }
//!         }
//!     });
//!
//!     hub.set_bulb(SwitchState::On);
//!
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod config;
pub mod error;
pub mod event;
pub mod hub;
pub mod policy;
pub mod prefs;
pub mod state;
pub mod topic;

// Re-exports for convenience
pub use ai::{AiClient, Anomaly, AnomalyReport, AnomalyStatistics, FanSuggestion, TimeFrame};
pub use config::{HubConfig, HubConfigBuilder};
pub use error::{HubError, Result};
pub use event::{EventReceiver, EventSender, HubEvent};
pub use hub::{BrokerLink, HubSubscription, LinkEvent, LinkFactory, LinkHandle, StateHub};
pub use policy::{AiBackoff, ReconnectPolicy};
pub use prefs::{NotificationPrefs, Preferences, Theme, ThresholdAlert};
pub use state::{
    AiLogEntry, AlertEntry, ConnectionStatus, DashboardState, DisconnectReason, Mode, MotionState,
    NotableEvent, SensorSnapshot, SwitchState, TimeSeriesPoint,
};
pub use topic::{Channel, Command, Reading};
