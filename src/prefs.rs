// MIT License - Copyright (c) 2026 Peter Wright
// Persisted local preferences

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::{MotionState, SensorSnapshot};

/// Dashboard color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Threshold-alert preferences.
///
/// Disabled by default; the thresholds mirror the dashboard defaults
/// (30/15 degrees Celsius, 70/30 percent humidity, motion alerts on).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPrefs {
    pub enabled: bool,
    pub high_temp: f64,
    pub low_temp: f64,
    pub high_humidity: f64,
    pub low_humidity: f64,
    pub motion_alerts: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: false,
            high_temp: 30.0,
            low_temp: 15.0,
            high_humidity: 70.0,
            low_humidity: 30.0,
            motion_alerts: true,
        }
    }
}

/// A threshold crossing worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdAlert {
    HighTemperature { value: f64, limit: f64 },
    LowTemperature { value: f64, limit: f64 },
    HighHumidity { value: f64, limit: f64 },
    LowHumidity { value: f64, limit: f64 },
    Motion,
}

impl fmt::Display for ThresholdAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighTemperature { value, limit } => {
                write!(f, "High temperature: {value:.1}°C (threshold: {limit}°C)")
            }
            Self::LowTemperature { value, limit } => {
                write!(f, "Low temperature: {value:.1}°C (threshold: {limit}°C)")
            }
            Self::HighHumidity { value, limit } => {
                write!(f, "High humidity: {value:.1}% (threshold: {limit}%)")
            }
            Self::LowHumidity { value, limit } => {
                write!(f, "Low humidity: {value:.1}% (threshold: {limit}%)")
            }
            Self::Motion => write!(f, "Motion sensor has detected activity"),
        }
    }
}

impl NotificationPrefs {
    /// Evaluate the current readings against the thresholds.
    ///
    /// Pure; returns nothing while disabled. NaN readings (decode
    /// fallbacks) never cross a threshold.
    pub fn check(&self, sensors: &SensorSnapshot) -> Vec<ThresholdAlert> {
        if !self.enabled {
            return Vec::new();
        }
        let mut alerts = Vec::new();

        if sensors.temperature >= self.high_temp {
            alerts.push(ThresholdAlert::HighTemperature {
                value: sensors.temperature,
                limit: self.high_temp,
            });
        } else if sensors.temperature <= self.low_temp {
            alerts.push(ThresholdAlert::LowTemperature {
                value: sensors.temperature,
                limit: self.low_temp,
            });
        }

        if sensors.humidity >= self.high_humidity {
            alerts.push(ThresholdAlert::HighHumidity {
                value: sensors.humidity,
                limit: self.high_humidity,
            });
        } else if sensors.humidity <= self.low_humidity {
            alerts.push(ThresholdAlert::LowHumidity {
                value: sensors.humidity,
                limit: self.low_humidity,
            });
        }

        if self.motion_alerts && sensors.motion == MotionState::Detected {
            alerts.push(ThresholdAlert::Motion);
        }

        alerts
    }
}

/// All locally persisted preferences, stored as one TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub notifications: NotificationPrefs,
    pub theme: Theme,
}

impl Preferences {
    /// Load preferences, falling back to defaults when the file does
    /// not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
