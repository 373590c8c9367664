// MIT License - Copyright (c) 2026 Peter Wright
// Observer fan-out channel

use crate::state::{DashboardState, NotableEvent};

/// All events broadcast to hub observers.
///
/// Consumers subscribe via `StateHub::attach()` and receive a
/// `tokio::sync::broadcast::Receiver<HubEvent>`.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// The shared snapshot changed (inbound reading folded in, or a
    /// connection transition). Carries the complete new snapshot.
    StateChanged(DashboardState),
    /// Transient signal for one-shot notification (motion edge, alert).
    Notable(NotableEvent),
    /// A command was dropped because the broker link was not live.
    /// Reported once per attempt; the command is never queued.
    PublishRejected {
        /// Control topic suffix of the dropped command.
        channel: String,
    },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<HubEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<HubEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
