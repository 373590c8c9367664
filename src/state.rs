// MIT License - Copyright (c) 2026 Peter Wright
// Dashboard state and reducer

use chrono::{DateTime, Local};

use crate::topic::Reading;

/// Maximum retained alert entries, most recent first.
pub const ALERT_CAP: usize = 5;
/// Maximum retained AI log entries, most recent first.
pub const AI_LOG_CAP: usize = 10;
/// Maximum points per sensor history series, oldest evicted.
pub const HISTORY_CAP: usize = 20;

/// On/off state of a switched device (bulb, fan).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwitchState {
    On,
    #[default]
    Off,
}

impl SwitchState {
    /// Parse the wire literal ("ON"/"OFF"). Anything else is rejected.
    pub fn from_payload(s: &str) -> Option<Self> {
        match s {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_payload(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

/// Whether fan speed is driven by the AI suggestion loop or the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    Auto,
    #[default]
    Manual,
}

impl Mode {
    pub fn from_payload(s: &str) -> Option<Self> {
        match s {
            "AUTO" => Some(Self::Auto),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }

    pub fn as_payload(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
        }
    }
}

/// Motion sensor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionState {
    Detected,
    #[default]
    None,
}

impl MotionState {
    pub fn from_payload(s: &str) -> Option<Self> {
        match s {
            "DETECTED" => Some(Self::Detected),
            "NONE" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_payload(&self) -> &'static str {
        match self {
            Self::Detected => "DETECTED",
            Self::None => "NONE",
        }
    }
}

/// Last known value of every sensor channel.
///
/// Fields hold fixed defaults until the first reading for that channel
/// arrives; after that they always reflect the most recent reading.
/// Only the reducer writes these.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    pub bulb: SwitchState,
    pub fan: SwitchState,
    /// Fan speed in percent (0-100).
    pub fan_speed: u8,
    /// RGB light color as "#RRGGBB".
    pub rgb_color: String,
    pub mode: Mode,
    pub motion: MotionState,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            bulb: SwitchState::Off,
            fan: SwitchState::Off,
            fan_speed: 0,
            rgb_color: "#FFFFFF".to_string(),
            mode: Mode::Manual,
            motion: MotionState::None,
        }
    }
}

/// An alert message received on the alert channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEntry {
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// A log line received on the ai/log channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AiLogEntry {
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// One point of a sensor history series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    /// Local time of day ("%H:%M:%S") when the reading arrived.
    pub label: String,
    pub value: f64,
}

/// Why the broker link is down. Meaningful only while disconnected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisconnectReason {
    #[default]
    None,
    IdleTimeout,
    BrokerLost,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub reason: DisconnectReason,
}

/// The complete shared snapshot handed to observers.
///
/// A fresh value is produced on every change; consumers receive clones
/// and must treat them as immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub sensors: SensorSnapshot,
    /// Most recent first, capped at [`ALERT_CAP`].
    pub alerts: Vec<AlertEntry>,
    /// Most recent first, capped at [`AI_LOG_CAP`].
    pub ai_logs: Vec<AiLogEntry>,
    /// Oldest first, capped at [`HISTORY_CAP`].
    pub temperature_history: Vec<TimeSeriesPoint>,
    /// Oldest first, capped at [`HISTORY_CAP`].
    pub humidity_history: Vec<TimeSeriesPoint>,
    pub connection: ConnectionStatus,
}

/// A transient signal for one-shot user notification, emitted alongside
/// the state update rather than stored in it.
#[derive(Debug, Clone, PartialEq)]
pub enum NotableEvent {
    /// Motion transitioned from NONE to DETECTED.
    MotionDetected,
    /// An alert message arrived.
    Alert(String),
}

/// Fold one decoded reading into the state.
///
/// Pure: no I/O, no clock access (the arrival time is passed in).
/// Returns the successor state and, for motion edges and alerts, a
/// notable event.
pub fn reduce(
    state: &DashboardState,
    reading: &Reading,
    at: DateTime<Local>,
) -> (DashboardState, Option<NotableEvent>) {
    let mut next = state.clone();
    let mut notable = None;

    match reading {
        Reading::Temperature(value) => {
            next.sensors.temperature = *value;
            push_point(&mut next.temperature_history, at, *value);
        }
        Reading::Humidity(value) => {
            next.sensors.humidity = *value;
            push_point(&mut next.humidity_history, at, *value);
        }
        Reading::Bulb(switch) => next.sensors.bulb = *switch,
        Reading::Fan(switch) => next.sensors.fan = *switch,
        Reading::FanSpeed(speed) => next.sensors.fan_speed = *speed,
        Reading::Color(color) => next.sensors.rgb_color = color.clone(),
        Reading::Mode(mode) => next.sensors.mode = *mode,
        Reading::Motion(motion) => {
            // Edge-triggered: a repeated DETECTED updates state but does
            // not signal again.
            if *motion == MotionState::Detected && state.sensors.motion != MotionState::Detected {
                notable = Some(NotableEvent::MotionDetected);
            }
            next.sensors.motion = *motion;
        }
        Reading::Alert(message) => {
            push_recent(
                &mut next.alerts,
                AlertEntry { message: message.clone(), timestamp: at },
                ALERT_CAP,
            );
            notable = Some(NotableEvent::Alert(message.clone()));
        }
        Reading::AiLog(message) => {
            push_recent(
                &mut next.ai_logs,
                AiLogEntry { message: message.clone(), timestamp: at },
                AI_LOG_CAP,
            );
        }
    }

    (next, notable)
}

fn push_point(history: &mut Vec<TimeSeriesPoint>, at: DateTime<Local>, value: f64) {
    if history.len() >= HISTORY_CAP {
        history.remove(0);
    }
    history.push(TimeSeriesPoint {
        label: at.format("%H:%M:%S").to_string(),
        value,
    });
}

fn push_recent<T>(list: &mut Vec<T>, entry: T, cap: usize) {
    list.insert(0, entry);
    list.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 2, 7, 12, 30, 45).unwrap()
    }

    fn fold(state: DashboardState, reading: Reading) -> (DashboardState, Option<NotableEvent>) {
        reduce(&state, &reading, at())
    }

    #[test]
    fn test_defaults() {
        let sensors = SensorSnapshot::default();
        assert_eq!(sensors.temperature, 0.0);
        assert_eq!(sensors.humidity, 0.0);
        assert_eq!(sensors.bulb, SwitchState::Off);
        assert_eq!(sensors.fan, SwitchState::Off);
        assert_eq!(sensors.fan_speed, 0);
        assert_eq!(sensors.rgb_color, "#FFFFFF");
        assert_eq!(sensors.mode, Mode::Manual);
        assert_eq!(sensors.motion, MotionState::None);
    }

    #[test]
    fn test_basic_reading_sequence() {
        let state = DashboardState::default();
        let (state, _) = fold(state, Reading::Temperature(21.5));
        let (state, _) = fold(state, Reading::Humidity(55.0));
        let (state, _) = fold(state, Reading::Bulb(SwitchState::On));

        assert_eq!(state.sensors.temperature, 21.5);
        assert_eq!(state.sensors.humidity, 55.0);
        assert_eq!(state.sensors.bulb, SwitchState::On);
        // Untouched fields keep their defaults
        assert_eq!(state.sensors.fan, SwitchState::Off);
        assert_eq!(state.sensors.mode, Mode::Manual);

        assert_eq!(state.temperature_history.len(), 1);
        assert_eq!(state.temperature_history[0].value, 21.5);
        assert_eq!(state.temperature_history[0].label, "12:30:45");
        assert_eq!(state.humidity_history.len(), 1);
        assert_eq!(state.humidity_history[0].value, 55.0);
    }

    #[test]
    fn test_last_write_wins_per_channel() {
        let state = DashboardState::default();
        let (state, _) = fold(state, Reading::Temperature(20.0));
        let (state, _) = fold(state, Reading::FanSpeed(40));
        let (state, _) = fold(state, Reading::Temperature(22.0));
        let (state, _) = fold(state, Reading::FanSpeed(75));

        assert_eq!(state.sensors.temperature, 22.0);
        assert_eq!(state.sensors.fan_speed, 75);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut state = DashboardState::default();
        for i in 0..25 {
            state = fold(state, Reading::Temperature(f64::from(i))).0;
        }
        assert_eq!(state.temperature_history.len(), HISTORY_CAP);
        // Last 20 values in arrival order: 5..=24
        assert_eq!(state.temperature_history[0].value, 5.0);
        assert_eq!(state.temperature_history[19].value, 24.0);
        assert_eq!(state.sensors.temperature, 24.0);
    }

    #[test]
    fn test_alert_cap_most_recent_first() {
        let mut state = DashboardState::default();
        for i in 0..7 {
            state = fold(state, Reading::Alert(format!("alert {i}"))).0;
        }
        assert_eq!(state.alerts.len(), ALERT_CAP);
        assert_eq!(state.alerts[0].message, "alert 6");
        assert_eq!(state.alerts[4].message, "alert 2");
    }

    #[test]
    fn test_ai_log_cap() {
        let mut state = DashboardState::default();
        for i in 0..12 {
            state = fold(state, Reading::AiLog(format!("log {i}"))).0;
        }
        assert_eq!(state.ai_logs.len(), AI_LOG_CAP);
        assert_eq!(state.ai_logs[0].message, "log 11");
        assert_eq!(state.ai_logs[9].message, "log 2");
    }

    #[test]
    fn test_alert_is_notable() {
        let (_, notable) = fold(DashboardState::default(), Reading::Alert("smoke".into()));
        assert_eq!(notable, Some(NotableEvent::Alert("smoke".into())));
    }

    #[test]
    fn test_motion_edge_signals_once() {
        let state = DashboardState::default();
        let (state, notable) = fold(state, Reading::Motion(MotionState::Detected));
        assert_eq!(notable, Some(NotableEvent::MotionDetected));
        assert_eq!(state.sensors.motion, MotionState::Detected);

        // Repeated DETECTED with no intervening NONE: state update only
        let (state, notable) = fold(state, Reading::Motion(MotionState::Detected));
        assert_eq!(notable, None);
        assert_eq!(state.sensors.motion, MotionState::Detected);

        // Back to NONE, then DETECTED again signals again
        let (state, notable) = fold(state, Reading::Motion(MotionState::None));
        assert_eq!(notable, None);
        let (_, notable) = fold(state, Reading::Motion(MotionState::Detected));
        assert_eq!(notable, Some(NotableEvent::MotionDetected));
    }

    #[test]
    fn test_nan_reading_is_stored() {
        let (state, _) = fold(DashboardState::default(), Reading::Temperature(f64::NAN));
        assert!(state.sensors.temperature.is_nan());
        assert_eq!(state.temperature_history.len(), 1);
        assert!(state.temperature_history[0].value.is_nan());
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let state = DashboardState::default();
        let (next, _) = fold(state.clone(), Reading::Temperature(30.0));
        assert_eq!(state.sensors.temperature, 0.0);
        assert_eq!(next.sensors.temperature, 30.0);
    }
}
