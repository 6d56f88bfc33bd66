//! Tenant-wide garden statistics, computed from the read side.

use std::collections::BTreeMap;

use db::{
    models::{
        values::{GrowingUnitType, LocationType, PlantStatus},
        views::{
            CapacityStats, GrowingUnitView, LocationView, OverviewView, PlantDistribution,
            PlantView, Totals, UnitOccupancy,
        },
    },
    read_store::{Collection, ReadStoreError},
};
use strum::IntoEnumIterator;
use utils::stats::{average, median, percentage, round2};
use uuid::Uuid;

use super::context::ServiceContext;

/// How many units `most_occupied_units` lists.
pub const TOP_UNITS: usize = 5;

/// Every variant starts at zero so clients always see the full set of keys.
fn zeroed<T: IntoEnumIterator + ToString>() -> BTreeMap<String, i64> {
    T::iter().map(|variant| (variant.to_string(), 0)).collect()
}

#[derive(Clone)]
pub struct OverviewService {
    ctx: ServiceContext,
}

impl OverviewService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn overview(&self, owner_id: Uuid) -> Result<OverviewView, ReadStoreError> {
        let store = &self.ctx.read_store;
        let locations: Vec<LocationView> = store.list(Collection::Locations, owner_id).await?;
        let units: Vec<GrowingUnitView> = store.list(Collection::GrowingUnits, owner_id).await?;
        let plants: Vec<PlantView> = store.list(Collection::Plants, owner_id).await?;
        let plant_species = store.count(Collection::PlantSpecies, owner_id).await?;

        Ok(compute(&locations, &units, &plants, plant_species))
    }
}

pub fn compute(
    locations: &[LocationView],
    units: &[GrowingUnitView],
    plants: &[PlantView],
    plant_species: i64,
) -> OverviewView {
    let total_capacity: i64 = units.iter().map(|u| u.capacity).sum();
    let occupied: i64 = units.iter().map(|u| u.plants_count).sum();
    let free: i64 = units.iter().map(|u| u.remaining_capacity).sum();
    let occupancies: Vec<f64> = units.iter().map(|u| u.occupancy_percentage).collect();
    let per_unit: Vec<f64> = units.iter().map(|u| u.plants_count as f64).collect();

    let capacity = CapacityStats {
        total_capacity,
        occupied,
        free,
        occupancy_percentage: percentage(occupied as f64, total_capacity as f64),
        average_unit_occupancy: round2(average(&occupancies)),
        median_unit_occupancy: round2(median(&occupancies)),
        full_units: units.iter().filter(|u| u.remaining_capacity == 0).count() as i64,
        empty_units: units.iter().filter(|u| u.plants_count == 0).count() as i64,
    };

    let mut by_status = zeroed::<PlantStatus>();
    for plant in plants {
        *by_status.entry(plant.status.to_string()).or_default() += 1;
    }
    let mut growing_units_by_type = zeroed::<GrowingUnitType>();
    for unit in units {
        *growing_units_by_type
            .entry(unit.unit_type.to_string())
            .or_default() += 1;
    }
    let mut locations_by_type = zeroed::<LocationType>();
    for location in locations {
        *locations_by_type
            .entry(location.location_type.to_string())
            .or_default() += 1;
    }

    let mut ranked: Vec<&GrowingUnitView> = units.iter().collect();
    ranked.sort_by(|a, b| {
        b.occupancy_percentage
            .total_cmp(&a.occupancy_percentage)
            .then_with(|| b.plants_count.cmp(&a.plants_count))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    let most_occupied_units = ranked
        .into_iter()
        .take(TOP_UNITS)
        .map(|u| UnitOccupancy {
            id: u.id,
            name: u.name.clone(),
            plants_count: u.plants_count,
            capacity: u.capacity,
            occupancy_percentage: u.occupancy_percentage,
        })
        .collect();

    OverviewView {
        totals: Totals {
            locations: locations.len() as i64,
            growing_units: units.len() as i64,
            plants: plants.len() as i64,
            plant_species,
        },
        capacity,
        plants: PlantDistribution {
            average_per_unit: round2(average(&per_unit)),
            median_per_unit: round2(median(&per_unit)),
            by_status,
        },
        growing_units_by_type,
        locations_by_type,
        most_occupied_units,
    }
}
