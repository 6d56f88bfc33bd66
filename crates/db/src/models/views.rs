//! Denormalised view models served by the query side.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::values::{
    Dimensions, GrowingUnitType, GrowthRate, LocationType, PhRange, PlantCategory, PlantStatus,
    SunRequirement, TemperatureRange, WaterRequirement,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub location_type: LocationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct GrowingUnitSummary {
    pub id: Uuid,
    pub name: String,
    pub unit_type: GrowingUnitType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct SpeciesSummary {
    pub id: Uuid,
    pub common_name: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantSummary {
    pub id: Uuid,
    pub name: String,
    pub status: PlantStatus,
    pub species_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct LocationView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location_type: LocationType,
    pub description: Option<String>,
    pub growing_units_count: i64,
    pub plants_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct GrowingUnitView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub location: LocationSummary,
    pub name: String,
    pub unit_type: GrowingUnitType,
    pub capacity: i64,
    pub dimensions: Option<Dimensions>,
    pub plants_count: i64,
    pub remaining_capacity: i64,
    pub occupancy_percentage: f64,
    pub plants: Vec<PlantSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub status: PlantStatus,
    pub planted_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub growing_unit: GrowingUnitSummary,
    pub location: LocationSummary,
    pub species: Option<SpeciesSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantSpeciesView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub common_name: String,
    pub scientific_name: String,
    pub family: Option<String>,
    pub category: PlantCategory,
    pub growth_rate: GrowthRate,
    pub sun_requirement: SunRequirement,
    pub water_requirement: WaterRequirement,
    pub ph_range: Option<PhRange>,
    pub temperature_range: Option<TemperatureRange>,
    pub days_to_maturity: Option<i64>,
    pub description: Option<String>,
    pub plants_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Totals {
    pub locations: i64,
    pub growing_units: i64,
    pub plants: i64,
    pub plant_species: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CapacityStats {
    pub total_capacity: i64,
    pub occupied: i64,
    pub free: i64,
    pub occupancy_percentage: f64,
    pub average_unit_occupancy: f64,
    pub median_unit_occupancy: f64,
    pub full_units: i64,
    pub empty_units: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantDistribution {
    pub average_per_unit: f64,
    pub median_per_unit: f64,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct UnitOccupancy {
    pub id: Uuid,
    pub name: String,
    pub plants_count: i64,
    pub capacity: i64,
    pub occupancy_percentage: f64,
}

/// Tenant-wide statistics computed from the read side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct OverviewView {
    pub totals: Totals,
    pub capacity: CapacityStats,
    pub plants: PlantDistribution,
    pub growing_units_by_type: BTreeMap<String, i64>,
    pub locations_by_type: BTreeMap<String, i64>,
    pub most_occupied_units: Vec<UnitOccupancy>,
}
