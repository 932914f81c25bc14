//! Energy check-in log.
//!
//! Logs are append-only. Several logs may share one `date`; the one with the
//! latest `timestamp` is that day's reading.

use super::intention::EnergyOctave;
use super::{validate_iso_date, validate_percent, EpochMs, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyLog {
    pub id: String,
    pub date: String,
    /// 0..=100
    pub level: u8,
    pub octave: EnergyOctave,
    /// Store time at write, millisecond resolution; not unique per user.
    pub timestamp: EpochMs,
}

/// Caller-supplied fields for one energy check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyLog {
    pub date: String,
    pub level: u8,
    pub octave: EnergyOctave,
}

impl NewEnergyLog {
    /// Check-in whose octave is derived from `level`.
    pub fn from_level(date: impl Into<String>, level: u8) -> Self {
        Self {
            date: date.into(),
            level,
            octave: EnergyOctave::from_level(level),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_iso_date(&self.date)?;
        validate_percent("level", self.level)
    }
}
