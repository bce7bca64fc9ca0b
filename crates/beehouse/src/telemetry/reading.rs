//! Sensor readings
//!
//! Readings belong to the telemetry collaborator and reference their hive by
//! identity only. They are immutable once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hive::{HiveId, ReadingId};

/// What a sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    /// Hive weight in grams; the only indicator feeding yield
    Weight,
    TemperatureInside,
    TemperatureOutside,
    HumidityInside,
    HumidityOutside,
    BeeMovementIn,
    BeeMovementOut,
    SoundInside,
    SoundOutside,
    LightInside,
    LightOutside,
    WindSpeed,
    WindDirection,
    HiveOpened,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorType::Weight => "weight",
            IndicatorType::TemperatureInside => "temperature_inside",
            IndicatorType::TemperatureOutside => "temperature_outside",
            IndicatorType::HumidityInside => "humidity_inside",
            IndicatorType::HumidityOutside => "humidity_outside",
            IndicatorType::BeeMovementIn => "bee_movement_in",
            IndicatorType::BeeMovementOut => "bee_movement_out",
            IndicatorType::SoundInside => "sound_inside",
            IndicatorType::SoundOutside => "sound_outside",
            IndicatorType::LightInside => "light_inside",
            IndicatorType::LightOutside => "light_outside",
            IndicatorType::WindSpeed => "wind_speed",
            IndicatorType::WindDirection => "wind_direction",
            IndicatorType::HiveOpened => "hive_opened",
        };
        write!(f, "{}", name)
    }
}

/// Where on or around the hive the sensor sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementLocation {
    Inside,
    Outside,
    Base,
    Extension,
    Frame,
}

/// One immutable sensor observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: ReadingId,
    pub hive: HiveId,
    pub indicator: IndicatorType,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub location: Option<MeasurementLocation>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl SensorReading {
    /// Reading taken now
    pub fn new(hive: HiveId, indicator: IndicatorType, value: f64, unit: impl Into<String>) -> Self {
        Self {
            id: ReadingId::new(),
            hive,
            indicator,
            value,
            unit: unit.into(),
            timestamp: Utc::now(),
            sensor_id: None,
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Weight reading in grams
    pub fn weight(hive: HiveId, grams: f64) -> Self {
        Self::new(hive, IndicatorType::Weight, grams, "g")
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_sensor(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensor_id = Some(sensor_id.into());
        self
    }

    pub fn with_location(mut self, location: MeasurementLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn is_weight(&self) -> bool {
        self.indicator == IndicatorType::Weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_display_matches_serde() {
        for indicator in [
            IndicatorType::Weight,
            IndicatorType::TemperatureInside,
            IndicatorType::BeeMovementOut,
            IndicatorType::HiveOpened,
        ] {
            let json = serde_json::to_value(indicator).unwrap();
            assert_eq!(json.as_str().unwrap(), indicator.to_string());
        }
    }

    #[test]
    fn test_weight_reading_builder() {
        let hive = HiveId::new();
        let reading = SensorReading::weight(hive, 1200.0)
            .with_sensor("scale-01")
            .with_location(MeasurementLocation::Base);
        assert!(reading.is_weight());
        assert_eq!(reading.unit, "g");
        assert_eq!(reading.sensor_id.as_deref(), Some("scale-01"));
        assert_eq!(reading.hive, hive);
    }
}
