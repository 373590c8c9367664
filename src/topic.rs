// MIT License - Copyright (c) 2026 Peter Wright
// Topic and payload codec

use crate::state::{Mode, MotionState, SwitchState};

/// The ten inbound logical channels (broker -> client).
///
/// Each maps to one wire topic `<namespace>/<suffix>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Temperature,
    Humidity,
    Bulb,
    Fan,
    FanSpeed,
    Color,
    Mode,
    Motion,
    Alert,
    AiLog,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Bulb,
        Channel::Fan,
        Channel::FanSpeed,
        Channel::Color,
        Channel::Mode,
        Channel::Motion,
        Channel::Alert,
        Channel::AiLog,
    ];

    /// The topic suffix under the namespace prefix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Channel::Temperature => "temp",
            Channel::Humidity => "hum",
            Channel::Bulb => "bulb",
            Channel::Fan => "fan",
            Channel::FanSpeed => "fan/speed",
            Channel::Color => "color",
            Channel::Mode => "mode",
            Channel::Motion => "motion",
            Channel::Alert => "alert",
            Channel::AiLog => "ai/log",
        }
    }

    /// Full wire topic for this channel.
    pub fn topic(&self, namespace: &str) -> String {
        format!("{}/{}", namespace, self.suffix())
    }

    /// Map a wire topic back to its channel. Topics outside the
    /// namespace, and unknown suffixes, yield `None`.
    pub fn from_topic(namespace: &str, topic: &str) -> Option<Self> {
        let suffix = topic.strip_prefix(namespace)?.strip_prefix('/')?;
        Self::ALL.iter().copied().find(|c| c.suffix() == suffix)
    }
}

/// A decoded inbound message, ready for the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Temperature(f64),
    Humidity(f64),
    Bulb(SwitchState),
    Fan(SwitchState),
    FanSpeed(u8),
    Color(String),
    Mode(Mode),
    Motion(MotionState),
    Alert(String),
    AiLog(String),
}

/// Decode a raw payload for a channel.
///
/// Parse rules per channel:
/// - temperature/humidity: float parse, failures become NaN (stored
///   as-is, never rejected)
/// - fan speed: integer parse, failures become 0
/// - color/alert/ai-log: passthrough string (lossy UTF-8)
/// - bulb/fan/mode/motion: validated literal; malformed payloads yield
///   `None` and the previous value is retained
///
/// No side effects; the caller decides whether to log rejects.
pub fn decode(channel: Channel, payload: &[u8]) -> Option<Reading> {
    let text = String::from_utf8_lossy(payload);
    match channel {
        Channel::Temperature => {
            Some(Reading::Temperature(text.trim().parse().unwrap_or(f64::NAN)))
        }
        Channel::Humidity => Some(Reading::Humidity(text.trim().parse().unwrap_or(f64::NAN))),
        Channel::Bulb => SwitchState::from_payload(&text).map(Reading::Bulb),
        Channel::Fan => SwitchState::from_payload(&text).map(Reading::Fan),
        Channel::FanSpeed => Some(Reading::FanSpeed(text.trim().parse().unwrap_or(0))),
        Channel::Color => Some(Reading::Color(text.into_owned())),
        Channel::Mode => Mode::from_payload(&text).map(Reading::Mode),
        Channel::Motion => MotionState::from_payload(&text).map(Reading::Motion),
        Channel::Alert => Some(Reading::Alert(text.into_owned())),
        Channel::AiLog => Some(Reading::AiLog(text.into_owned())),
    }
}

/// A typed outbound command (client -> broker).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bulb(SwitchState),
    Fan(SwitchState),
    FanSpeed(u8),
    Color(String),
    ToggleMode,
}

impl Command {
    /// The control topic suffix under the namespace prefix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Command::Bulb(_) => "control/bulb",
            Command::Fan(_) => "control/fan",
            Command::FanSpeed(_) => "control/fan/speed",
            Command::Color(_) => "control/color",
            Command::ToggleMode => "control/mode",
        }
    }

    /// Full wire topic for this command.
    pub fn topic(&self, namespace: &str) -> String {
        format!("{}/{}", namespace, self.suffix())
    }

    /// The plain-text wire payload.
    pub fn payload(&self) -> String {
        match self {
            Command::Bulb(state) | Command::Fan(state) => state.as_payload().to_string(),
            Command::FanSpeed(speed) => speed.to_string(),
            Command::Color(color) => color.clone(),
            Command::ToggleMode => "TOGGLE".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "yuvraj/home";

    #[test]
    fn test_channel_suffixes() {
        assert_eq!(Channel::Temperature.suffix(), "temp");
        assert_eq!(Channel::Humidity.suffix(), "hum");
        assert_eq!(Channel::FanSpeed.suffix(), "fan/speed");
        assert_eq!(Channel::AiLog.suffix(), "ai/log");
        assert_eq!(Channel::Motion.topic(NS), "yuvraj/home/motion");
    }

    #[test]
    fn test_topic_roundtrip_all_channels() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_topic(NS, &channel.topic(NS)), Some(channel));
        }
    }

    #[test]
    fn test_unknown_topic_is_none() {
        assert_eq!(Channel::from_topic(NS, "yuvraj/home/doorbell"), None);
        assert_eq!(Channel::from_topic(NS, "other/home/temp"), None);
        assert_eq!(Channel::from_topic(NS, "temp"), None);
    }

    #[test]
    fn test_decode_floats() {
        assert_eq!(
            decode(Channel::Temperature, b"21.5"),
            Some(Reading::Temperature(21.5))
        );
        assert_eq!(decode(Channel::Humidity, b"55"), Some(Reading::Humidity(55.0)));
        // Parse failures pass through as NaN rather than being rejected
        match decode(Channel::Temperature, b"warm") {
            Some(Reading::Temperature(v)) => assert!(v.is_nan()),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_fan_speed_defaults_to_zero() {
        assert_eq!(decode(Channel::FanSpeed, b"75"), Some(Reading::FanSpeed(75)));
        assert_eq!(decode(Channel::FanSpeed, b"fast"), Some(Reading::FanSpeed(0)));
        assert_eq!(decode(Channel::FanSpeed, b"-3"), Some(Reading::FanSpeed(0)));
    }

    #[test]
    fn test_decode_enum_channels_reject_malformed() {
        assert_eq!(
            decode(Channel::Bulb, b"ON"),
            Some(Reading::Bulb(SwitchState::On))
        );
        assert_eq!(decode(Channel::Bulb, b"on"), None);
        assert_eq!(decode(Channel::Fan, b"MAYBE"), None);
        assert_eq!(decode(Channel::Mode, b"AUTO"), Some(Reading::Mode(Mode::Auto)));
        assert_eq!(decode(Channel::Mode, b"TOGGLE"), None); // control-only literal
        assert_eq!(
            decode(Channel::Motion, b"DETECTED"),
            Some(Reading::Motion(MotionState::Detected))
        );
        assert_eq!(decode(Channel::Motion, b"GHOST"), None);
    }

    #[test]
    fn test_decode_passthrough_channels() {
        assert_eq!(
            decode(Channel::Color, b"#FFD580"),
            Some(Reading::Color("#FFD580".into()))
        );
        assert_eq!(
            decode(Channel::Alert, b"Temperature critical!"),
            Some(Reading::Alert("Temperature critical!".into()))
        );
        assert_eq!(
            decode(Channel::AiLog, b"fan speed set to 60%"),
            Some(Reading::AiLog("fan speed set to 60%".into()))
        );
    }

    #[test]
    fn test_command_encoding() {
        let cases = [
            (Command::Bulb(SwitchState::On), "control/bulb", "ON"),
            (Command::Fan(SwitchState::Off), "control/fan", "OFF"),
            (Command::FanSpeed(60), "control/fan/speed", "60"),
            (Command::Color("#0011FF".into()), "control/color", "#0011FF"),
            (Command::ToggleMode, "control/mode", "TOGGLE"),
        ];
        for (command, suffix, payload) in cases {
            assert_eq!(command.suffix(), suffix);
            assert_eq!(command.topic(NS), format!("{NS}/{suffix}"));
            assert_eq!(command.payload(), payload);
        }
    }
}
