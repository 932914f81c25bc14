//! Celestial signature documents: birth data, roles, focus windows, natal
//! chart and the daily transit cache.
//!
//! # Invariants
//! - Roles and focus windows are always written as whole arrays.
//! - `BirthData` latitude/longitude stay `0.0` until geocoding exists.
//! - A `DailyTransitCache` is only meaningful on the calendar day in `date`.

use super::intention::EnergyOctave;
use super::{validate_clock_time, validate_iso_date, validate_percent, EpochMs, ValidationError};
use serde::{Deserialize, Serialize};

/// Birth date, time and place captured during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthData {
    /// ISO calendar date, e.g. `1990-05-15`.
    pub date: String,
    /// 24h clock time, e.g. `14:30`.
    pub time: String,
    /// Free text place name.
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone id.
    pub timezone: String,
}

impl BirthData {
    /// Builds birth data with coordinates left unpopulated.
    ///
    /// `location` is not geocoded; latitude and longitude are `0.0`.
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            location: location.into(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: timezone.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_iso_date(&self.date)?;
        validate_clock_time(&self.time)?;
        if self.timezone.trim().is_empty() {
            return Err(ValidationError::EmptyField("timezone"));
        }
        Ok(())
    }
}

/// One life role, e.g. "Designer" or "Parent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub id: String,
    pub label: String,
    pub is_primary: bool,
}

/// Recurring block of the week reserved for one energy octave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SovereignWindow {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_hour: u8,
    pub end_hour: u8,
    pub energy_octave: EnergyOctave,
    /// 0 = Sunday .. 6 = Saturday.
    pub days_of_week: Vec<u8>,
}

impl SovereignWindow {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for hour in [self.start_hour, self.end_hour] {
            if hour > 23 {
                return Err(ValidationError::HourOutOfRange(hour));
            }
        }
        if let Some(day) = self.days_of_week.iter().copied().find(|day| *day > 6) {
            return Err(ValidationError::DayOutOfRange(day));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetPosition {
    pub planet: String,
    pub sign: String,
    pub degree: f64,
    pub minute: u8,
    pub house: u8,
    pub retrograde: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousePosition {
    /// 1..=12
    pub house: u8,
    pub sign: String,
    pub degree: f64,
}

/// Sign and degree of a chart angle (ascendant, midheaven).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub sign: String,
    pub degree: f64,
}

/// Computed natal chart. Chart computation itself lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalChart {
    pub birth_data: BirthData,
    pub planets: Vec<PlanetPosition>,
    pub houses: Vec<HousePosition>,
    pub ascendant: ChartPoint,
    pub midheaven: ChartPoint,
    /// Overwritten with the store commit time on save.
    #[serde(default)]
    pub calculated_at: EpochMs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectType {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitAspect {
    pub transit_planet: String,
    pub natal_planet: String,
    pub aspect_type: AspectType,
    pub orb: f64,
    pub applying: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transit {
    pub planet: String,
    pub sign: String,
    pub degree: f64,
    pub minute: u8,
    pub retrograde: bool,
    pub aspects: Vec<TransitAspect>,
}

/// Transit payload written by a (re)computation, before the store stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTransits {
    /// Calendar day the payload was computed for.
    pub date: String,
    pub transits: Vec<Transit>,
    pub significant_aspect: Option<TransitAspect>,
    /// 0..=100
    pub solar_peak: u8,
}

impl DailyTransits {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_iso_date(&self.date)?;
        validate_percent("solarPeak", self.solar_peak)
    }

    pub fn into_cache(self, calculated_at: EpochMs) -> DailyTransitCache {
        DailyTransitCache {
            date: self.date,
            transits: self.transits,
            significant_aspect: self.significant_aspect,
            solar_peak: self.solar_peak,
            calculated_at,
        }
    }
}

/// Singleton cache slot at `users/{uid}/cache/dailyTransits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTransitCache {
    pub date: String,
    pub transits: Vec<Transit>,
    pub significant_aspect: Option<TransitAspect>,
    pub solar_peak: u8,
    pub calculated_at: EpochMs,
}

impl DailyTransitCache {
    /// Staleness rule: the cache only counts on the day it was computed for.
    pub fn is_fresh_on(&self, today: &str) -> bool {
        self.date == today
    }
}

#[cfg(test)]
mod tests {
    use super::{BirthData, DailyTransits, SovereignWindow};
    use crate::model::intention::EnergyOctave;
    use crate::model::ValidationError;

    fn window(start: u8, end: u8, days: Vec<u8>) -> SovereignWindow {
        SovereignWindow {
            id: "w1".to_string(),
            label: "Deep Work".to_string(),
            description: None,
            start_hour: start,
            end_hour: end,
            energy_octave: EnergyOctave::High,
            days_of_week: days,
        }
    }

    #[test]
    fn birth_data_defaults_coordinates_to_zero() {
        let birth = BirthData::new("1990-05-15", "14:30", "Austin, TX", "America/Chicago");
        assert_eq!(birth.latitude, 0.0);
        assert_eq!(birth.longitude, 0.0);
        assert!(birth.validate().is_ok());
    }

    #[test]
    fn birth_data_rejects_bad_time() {
        let birth = BirthData::new("1990-05-15", "2:30pm", "Austin, TX", "America/Chicago");
        assert_eq!(
            birth.validate(),
            Err(ValidationError::InvalidTime("2:30pm".to_string()))
        );
    }

    #[test]
    fn window_validation_checks_hours_and_days() {
        assert!(window(9, 12, vec![1, 2, 3]).validate().is_ok());
        assert_eq!(
            window(9, 24, vec![]).validate(),
            Err(ValidationError::HourOutOfRange(24))
        );
        assert_eq!(
            window(9, 12, vec![0, 7]).validate(),
            Err(ValidationError::DayOutOfRange(7))
        );
    }

    #[test]
    fn transits_reject_solar_peak_over_hundred() {
        let transits = DailyTransits {
            date: "2025-06-01".to_string(),
            transits: vec![],
            significant_aspect: None,
            solar_peak: 101,
        };
        assert!(matches!(
            transits.validate(),
            Err(ValidationError::LevelOutOfRange { .. })
        ));
    }

    #[test]
    fn cache_freshness_compares_calendar_day() {
        let cache = DailyTransits {
            date: "2025-06-01".to_string(),
            transits: vec![],
            significant_aspect: None,
            solar_peak: 40,
        }
        .into_cache(10);
        assert!(cache.is_fresh_on("2025-06-01"));
        assert!(!cache.is_fresh_on("2025-06-02"));
    }
}
