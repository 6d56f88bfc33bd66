//! Validated value objects and the enumerations shared by the aggregates.
//!
//! Every constructor trims and checks its input once; after that the wrapped
//! primitive is known to be valid for the lifetime of the value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field}: minimum must not exceed maximum")]
    InvertedRange { field: &'static str },
    #[error("{field} has unknown value '{value}'")]
    UnknownVariant { field: &'static str, value: String },
    #[error("planted date {0} is in the future")]
    FutureDate(NaiveDate),
}

fn required_text(field: &'static str, raw: &str, max: usize) -> Result<String, ValueError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValueError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValueError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValueError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) if text.chars().count() > max => Err(ValueError::TooLong { field, max }),
        Some(text) => Ok(Some(text.to_string())),
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValueError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValueError::OutOfRange { field, min, max });
    }
    Ok(value)
}

/// Display name of a location, growing unit, plant or species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    pub const MAX_LEN: usize = 100;

    pub fn new(raw: &str) -> Result<Self, ValueError> {
        Self::for_field("name", raw)
    }

    pub fn for_field(field: &'static str, raw: &str) -> Result<Self, ValueError> {
        required_text(field, raw, Self::MAX_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(Option<String>);

impl Description {
    pub const MAX_LEN: usize = 500;

    pub fn new(raw: Option<&str>) -> Result<Self, ValueError> {
        optional_text("description", raw, Self::MAX_LEN).map(Self)
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notes(Option<String>);

impl Notes {
    pub const MAX_LEN: usize = 1000;

    pub fn new(raw: Option<&str>) -> Result<Self, ValueError> {
        optional_text("notes", raw, Self::MAX_LEN).map(Self)
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScientificName(String);

impl ScientificName {
    pub const MAX_LEN: usize = 150;

    pub fn new(raw: &str) -> Result<Self, ValueError> {
        required_text("scientific_name", raw, Self::MAX_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Number of plants a growing unit can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Capacity(i64);

impl Capacity {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 1000;

    pub fn new(value: i64) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                field: "capacity",
                min: Self::MIN as f64,
                max: Self::MAX as f64,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Whether `occupied` slots still leave room for one more plant.
    pub fn has_room_for_one_more(self, occupied: i64) -> bool {
        occupied < self.0
    }
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[sqlx(type_name = "dimension_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DimensionUnit {
    Cm,
    M,
    In,
    Ft,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: DimensionUnit,
}

impl Dimensions {
    pub const MAX: f64 = 10_000.0;

    pub fn new(length: f64, width: f64, height: f64, unit: DimensionUnit) -> Result<Self, ValueError> {
        for (field, value) in [("length", length), ("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 || value > Self::MAX {
                return Err(ValueError::OutOfRange {
                    field,
                    min: 0.0,
                    max: Self::MAX,
                });
            }
        }
        Ok(Self {
            length,
            width,
            height,
            unit,
        })
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// Soil pH tolerance of a species.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
pub struct PhRange {
    pub min: f64,
    pub max: f64,
}

impl PhRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ValueError> {
        let min = in_range("ph_range", min, 0.0, 14.0)?;
        let max = in_range("ph_range", max, 0.0, 14.0)?;
        if min > max {
            return Err(ValueError::InvertedRange { field: "ph_range" });
        }
        Ok(Self { min, max })
    }
}

/// Temperature tolerance of a species, in °C.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

impl TemperatureRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ValueError> {
        let min = in_range("temperature_range", min, -50.0, 60.0)?;
        let max = in_range("temperature_range", max, -50.0, 60.0)?;
        if min > max {
            return Err(ValueError::InvertedRange {
                field: "temperature_range",
            });
        }
        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaysToMaturity(i64);

impl DaysToMaturity {
    pub fn new(days: i64) -> Result<Self, ValueError> {
        if !(1..=3650).contains(&days) {
            return Err(ValueError::OutOfRange {
                field: "days_to_maturity",
                min: 1.0,
                max: 3650.0,
            });
        }
        Ok(Self(days))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantedDate(NaiveDate);

impl PlantedDate {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Result<Self, ValueError> {
        if date > today {
            return Err(ValueError::FutureDate(date));
        }
        Ok(Self(date))
    }

    pub fn value(self) -> NaiveDate {
        self.0
    }
}

/// Parse an enumeration from its wire form, reporting the field on failure.
pub fn parse_variant<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ValueError> {
    raw.trim().parse().map_err(|_| ValueError::UnknownVariant {
        field,
        value: raw.to_string(),
    })
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
    EnumIter,
)]
#[sqlx(type_name = "location_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    Room,
    Garden,
    Balcony,
    Terrace,
    Greenhouse,
    Windowsill,
    Patio,
    Other,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
    EnumIter,
)]
#[sqlx(type_name = "growing_unit_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GrowingUnitType {
    Pot,
    GardenBed,
    RaisedBed,
    Planter,
    WindowBox,
    HangingBasket,
    GrowBag,
    Hydroponic,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    EnumIter,
    Default,
)]
#[sqlx(type_name = "plant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlantStatus {
    #[default]
    Planted,
    Growing,
    Flowering,
    Fruiting,
    Harvested,
    Dormant,
    Dead,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
    EnumIter,
)]
#[sqlx(type_name = "plant_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlantCategory {
    Vegetable,
    Herb,
    Fruit,
    Flower,
    Succulent,
    Houseplant,
    Shrub,
    Tree,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "growth_rate", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GrowthRate {
    Slow,
    #[default]
    Medium,
    Fast,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "sun_requirement", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SunRequirement {
    #[default]
    FullSun,
    PartialShade,
    FullShade,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "water_requirement", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WaterRequirement {
    Low,
    #[default]
    Medium,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(Name::new("  Kitchen  ").unwrap().as_str(), "Kitchen");
        assert_eq!(
            Name::new("   "),
            Err(ValueError::Required { field: "name" })
        );
        let long = "x".repeat(Name::MAX_LEN + 1);
        assert_eq!(
            Name::new(&long),
            Err(ValueError::TooLong {
                field: "name",
                max: Name::MAX_LEN
            })
        );
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(Description::new(Some("  ")).unwrap().into_inner(), None);
        assert_eq!(
            Description::new(Some(" sunny ")).unwrap().into_inner(),
            Some("sunny".to_string())
        );
        assert!(Description::new(Some(&"d".repeat(501))).is_err());
    }

    #[test]
    fn capacity_bounds() {
        assert!(Capacity::new(0).is_err());
        assert!(Capacity::new(1001).is_err());
        let capacity = Capacity::new(2).unwrap();
        assert!(capacity.has_room_for_one_more(1));
        assert!(!capacity.has_room_for_one_more(2));
    }

    #[test]
    fn dimensions_must_be_positive() {
        assert!(Dimensions::new(10.0, 0.0, 5.0, DimensionUnit::Cm).is_err());
        assert!(Dimensions::new(10.0, 5.0, f64::NAN, DimensionUnit::Cm).is_err());
        let dims = Dimensions::new(2.0, 3.0, 4.0, DimensionUnit::M).unwrap();
        assert_eq!(dims.volume(), 24.0);
    }

    #[test]
    fn ranges_reject_inverted_bounds() {
        assert_eq!(
            PhRange::new(7.5, 6.0),
            Err(ValueError::InvertedRange { field: "ph_range" })
        );
        assert!(PhRange::new(-1.0, 6.0).is_err());
        assert!(PhRange::new(6.0, 6.0).is_ok());
        assert!(TemperatureRange::new(-60.0, 10.0).is_err());
        assert!(TemperatureRange::new(5.0, 30.0).is_ok());
    }

    #[test]
    fn planted_date_cannot_be_in_the_future() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        assert!(PlantedDate::new(today, today).is_ok());
        assert_eq!(
            PlantedDate::new(tomorrow, today),
            Err(ValueError::FutureDate(tomorrow))
        );
    }

    #[test]
    fn enum_membership_is_enforced() {
        let parsed: GrowingUnitType = parse_variant("unit_type", "raised_bed").unwrap();
        assert_eq!(parsed, GrowingUnitType::RaisedBed);
        let err = parse_variant::<PlantStatus>("status", "sleeping").unwrap_err();
        assert_eq!(
            err,
            ValueError::UnknownVariant {
                field: "status",
                value: "sleeping".to_string()
            }
        );
    }
}
