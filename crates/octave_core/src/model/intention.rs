//! Intention (task) model and energy octave bands.
//!
//! # Invariants
//! - `id` and `user_id` are assigned at creation and never rewritten.
//! - `completed_at` is only meaningful while `completed == true`.

use super::{validate_clock_time, validate_iso_date, EpochMs, UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Coarse energy band used to color-code schedule items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyOctave {
    High,
    Medium,
    Low,
    Recovery,
}

impl EnergyOctave {
    /// Maps a 0..=100 energy level onto its octave band.
    pub fn from_level(level: u8) -> Self {
        match level {
            75.. => Self::High,
            50..=74 => Self::Medium,
            25..=49 => Self::Low,
            _ => Self::Recovery,
        }
    }

    /// Short display label for the band.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Focus",
            Self::Medium => "Steady",
            Self::Low => "Light",
            Self::Recovery => "Recovery",
        }
    }
}

/// Where an intention came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentionSource {
    Manual,
    Voice,
    BrainDump,
    AiSuggested,
}

/// Persisted intention at `users/{uid}/intentions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intention {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub energy_octave: EnergyOctave,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<EpochMs>,
    pub source: IntentionSource,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

/// Caller-supplied fields for a new intention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIntention {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub energy_octave: EnergyOctave,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub completed: bool,
    pub source: IntentionSource,
}

impl NewIntention {
    /// Unscheduled, incomplete, manually entered intention.
    pub fn new(title: impl Into<String>, energy_octave: EnergyOctave) -> Self {
        Self {
            title: title.into(),
            description: None,
            energy_octave,
            scheduled_date: None,
            scheduled_time: None,
            duration_minutes: None,
            completed: false,
            source: IntentionSource::Manual,
        }
    }

    pub fn on_date(mut self, date: impl Into<String>) -> Self {
        self.scheduled_date = Some(date.into());
        self
    }

    pub fn at_time(mut self, time: impl Into<String>) -> Self {
        self.scheduled_time = Some(time.into());
        self
    }

    pub fn with_source(mut self, source: IntentionSource) -> Self {
        self.source = source;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        validate_schedule(self.scheduled_date.as_deref(), self.scheduled_time.as_deref())
    }
}

/// Field-by-field intention update.
///
/// Outer `None` leaves the stored field untouched; `Some(None)` stores `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_octave: Option<EnergyOctave>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<EpochMs>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<IntentionSource>,
}

impl IntentionPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyField("title"));
            }
        }
        validate_schedule(
            self.scheduled_date.as_ref().and_then(|d| d.as_deref()),
            self.scheduled_time.as_ref().and_then(|t| t.as_deref()),
        )
    }
}

fn validate_schedule(date: Option<&str>, time: Option<&str>) -> Result<(), ValidationError> {
    if let Some(date) = date {
        validate_iso_date(date)?;
    }
    if let Some(time) = time {
        validate_clock_time(time)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EnergyOctave, IntentionPatch, IntentionSource, NewIntention};
    use crate::model::ValidationError;
    use serde_json::json;

    #[test]
    fn octave_bands_follow_level_thresholds() {
        assert_eq!(EnergyOctave::from_level(100), EnergyOctave::High);
        assert_eq!(EnergyOctave::from_level(75), EnergyOctave::High);
        assert_eq!(EnergyOctave::from_level(74), EnergyOctave::Medium);
        assert_eq!(EnergyOctave::from_level(50), EnergyOctave::Medium);
        assert_eq!(EnergyOctave::from_level(25), EnergyOctave::Low);
        assert_eq!(EnergyOctave::from_level(24), EnergyOctave::Recovery);
        assert_eq!(EnergyOctave::from_level(0), EnergyOctave::Recovery);
    }

    #[test]
    fn octave_labels_name_each_band() {
        assert_eq!(EnergyOctave::from_level(90).label(), "High Focus");
        assert_eq!(EnergyOctave::Medium.label(), "Steady");
        assert_eq!(EnergyOctave::Low.label(), "Light");
        assert_eq!(EnergyOctave::from_level(10).label(), "Recovery");
    }

    #[test]
    fn source_serializes_in_kebab_case() {
        assert_eq!(
            serde_json::to_value(IntentionSource::BrainDump).expect("serialize"),
            json!("brain-dump")
        );
        assert_eq!(
            serde_json::to_value(IntentionSource::AiSuggested).expect("serialize"),
            json!("ai-suggested")
        );
    }

    #[test]
    fn new_intention_requires_title_and_valid_schedule() {
        let blank = NewIntention::new("  ", EnergyOctave::Low);
        assert_eq!(blank.validate(), Err(ValidationError::EmptyField("title")));

        let bad_time = NewIntention::new("Walk", EnergyOctave::Low)
            .on_date("2025-06-01")
            .at_time("7am");
        assert!(matches!(
            bad_time.validate(),
            Err(ValidationError::InvalidTime(_))
        ));
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let patch = IntentionPatch {
            scheduled_time: Some(None),
            completed: Some(true),
            ..IntentionPatch::default()
        };
        assert!(patch.validate().is_ok());
        let value = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(value, json!({ "scheduledTime": null, "completed": true }));
    }
}
