//! Plants: the only aggregate whose commands are bounded by another
//! aggregate's invariant (the capacity of its growing unit).

use chrono::{DateTime, NaiveDate, Utc};
use db::{
    models::{
        growing_unit::GrowingUnit,
        plant::{ChangePlantStatus, CreatePlant, Plant, PlantChanges, TransplantPlant, UpdatePlant},
        plant_species::PlantSpecies,
        values::{Capacity, Name, Notes, PlantStatus, PlantedDate, ValueError},
        views::PlantView,
    },
    read_store::{Collection, ReadStoreError},
};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    context::ServiceContext,
    events::DomainEvent,
    query::{ListParams, Paginated, Sortable, name_matches, parse_filter},
};

#[derive(Debug, Error)]
pub enum PlantError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("read store error: {0}")]
    ReadStore(#[from] ReadStoreError),
    #[error(transparent)]
    Validation(#[from] ValueError),
    #[error("plant {0} not found")]
    NotFound(Uuid),
    #[error("growing unit {0} not found")]
    GrowingUnitNotFound(Uuid),
    #[error("plant species {0} not found")]
    SpeciesNotFound(Uuid),
    #[error("growing unit {growing_unit_id} is full (capacity {capacity})")]
    CapacityExceeded { growing_unit_id: Uuid, capacity: i64 },
    #[error("plant is already in growing unit {0}")]
    SameGrowingUnit(Uuid),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PlantFilter {
    pub growing_unit_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub species_id: Option<Uuid>,
    pub status: Option<String>,
    pub name: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Sortable for PlantView {
    fn sort_name(&self) -> &str {
        &self.name
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn planted_date(date: NaiveDate) -> Result<PlantedDate, ValueError> {
    PlantedDate::new(date, Utc::now().date_naive())
}

/// Load a unit and make sure it can take one more plant.
async fn unit_with_room(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    growing_unit_id: Uuid,
) -> Result<GrowingUnit, PlantError> {
    let unit = GrowingUnit::find_by_id(&mut *conn, owner_id, growing_unit_id)
        .await?
        .ok_or(PlantError::GrowingUnitNotFound(growing_unit_id))?;
    let occupied = Plant::count_by_growing_unit_id(&mut *conn, growing_unit_id).await?;
    if !Capacity::new(unit.capacity)?.has_room_for_one_more(occupied) {
        warn!(
            growing_unit_id = %growing_unit_id,
            capacity = unit.capacity,
            "Growing unit is full"
        );
        return Err(PlantError::CapacityExceeded {
            growing_unit_id,
            capacity: unit.capacity,
        });
    }
    Ok(unit)
}

async fn ensure_species(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    species_id: Uuid,
) -> Result<(), PlantError> {
    PlantSpecies::find_by_id(conn, owner_id, species_id)
        .await?
        .map(|_| ())
        .ok_or(PlantError::SpeciesNotFound(species_id))
}

#[derive(Clone)]
pub struct PlantService {
    ctx: ServiceContext,
}

impl PlantService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn add(&self, owner_id: Uuid, data: CreatePlant) -> Result<Plant, PlantError> {
        let name = Name::new(&data.name)?;
        let notes = Notes::new(data.notes.as_deref())?;
        let planted = data.planted_date.map(planted_date).transpose()?;

        let mut tx = self.ctx.pool().begin().await?;
        unit_with_room(&mut tx, owner_id, data.growing_unit_id).await?;
        if let Some(species_id) = data.species_id {
            ensure_species(&mut tx, owner_id, species_id).await?;
        }

        let plant = Plant::new(
            owner_id,
            data.growing_unit_id,
            name,
            data.species_id,
            data.status.unwrap_or_default(),
            planted,
            notes,
        );
        plant.insert(&mut *tx).await?;
        tx.commit().await?;

        info!(
            plant_id = %plant.id,
            growing_unit_id = %plant.growing_unit_id,
            "Plant added"
        );
        self.ctx.events.publish(DomainEvent::PlantAdded {
            owner_id,
            plant_id: plant.id,
            growing_unit_id: plant.growing_unit_id,
            species_id: plant.species_id,
            occurred_at: plant.created_at,
        });
        Ok(plant)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: UpdatePlant,
    ) -> Result<Plant, PlantError> {
        let changes = PlantChanges {
            name: data.name.as_deref().map(Name::new).transpose()?,
            species_id: data.species_id,
            planted_date: data
                .planted_date
                .map(|d| d.map(planted_date).transpose())
                .transpose()?,
            notes: data
                .notes
                .map(|n| Notes::new(n.as_deref()))
                .transpose()?,
        };

        let mut tx = self.ctx.pool().begin().await?;
        let mut plant = Plant::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        if let Some(Some(species_id)) = changes.species_id {
            ensure_species(&mut tx, owner_id, species_id).await?;
        }

        let previous_species_id = plant.species_id;
        if !plant.apply(changes) {
            return Ok(plant);
        }
        plant.save(&mut *tx).await?;
        tx.commit().await?;

        self.ctx.events.publish(DomainEvent::PlantUpdated {
            owner_id,
            plant_id: id,
            growing_unit_id: plant.growing_unit_id,
            species_id: plant.species_id,
            previous_species_id,
            occurred_at: plant.updated_at,
        });
        Ok(plant)
    }

    pub async fn change_status(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: ChangePlantStatus,
    ) -> Result<Plant, PlantError> {
        let mut plant = Plant::find_by_id(self.ctx.pool(), owner_id, id)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        let Some(from) = plant.change_status(data.status) else {
            return Ok(plant);
        };
        plant.save(self.ctx.pool()).await?;

        info!(plant_id = %id, %from, to = %data.status, "Plant status changed");
        self.ctx.events.publish(DomainEvent::PlantStatusChanged {
            owner_id,
            plant_id: id,
            growing_unit_id: plant.growing_unit_id,
            from,
            to: data.status,
            occurred_at: plant.updated_at,
        });
        Ok(plant)
    }

    /// Move a plant into another unit of the same owner that still has room.
    pub async fn transplant(
        &self,
        owner_id: Uuid,
        id: Uuid,
        data: TransplantPlant,
    ) -> Result<Plant, PlantError> {
        let target = data.target_growing_unit_id;
        let mut tx = self.ctx.pool().begin().await?;
        let mut plant = Plant::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        if plant.growing_unit_id == target {
            return Err(PlantError::SameGrowingUnit(target));
        }
        unit_with_room(&mut tx, owner_id, target).await?;

        let from_growing_unit_id = plant.transplant_to(target);
        plant.save(&mut *tx).await?;
        tx.commit().await?;

        info!(
            plant_id = %id,
            from_growing_unit_id = %from_growing_unit_id,
            to_growing_unit_id = %target,
            "Plant transplanted"
        );
        self.ctx.events.publish(DomainEvent::PlantTransplanted {
            owner_id,
            plant_id: id,
            from_growing_unit_id,
            to_growing_unit_id: target,
            occurred_at: plant.updated_at,
        });
        Ok(plant)
    }

    pub async fn remove(&self, owner_id: Uuid, id: Uuid) -> Result<(), PlantError> {
        let mut tx = self.ctx.pool().begin().await?;
        let plant = Plant::find_by_id(&mut *tx, owner_id, id)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        Plant::delete(&mut *tx, owner_id, id).await?;
        tx.commit().await?;

        info!(plant_id = %id, growing_unit_id = %plant.growing_unit_id, "Plant removed");
        self.ctx.events.publish(DomainEvent::PlantRemoved {
            owner_id,
            plant_id: id,
            growing_unit_id: plant.growing_unit_id,
            species_id: plant.species_id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<PlantView, PlantError> {
        self.ctx
            .read_store
            .get(Collection::Plants, owner_id, id)
            .await?
            .ok_or(PlantError::NotFound(id))
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &PlantFilter,
    ) -> Result<Paginated<PlantView>, PlantError> {
        let listing = ListParams {
            sort_by: filter.sort_by.as_deref(),
            direction: filter.direction.as_deref(),
            page: filter.page,
            per_page: filter.per_page,
        }
        .resolve(self.ctx.pagination)?;
        let status: Option<PlantStatus> = parse_filter("status", filter.status.as_deref())?;

        let views: Vec<PlantView> = self.ctx.read_store.list(Collection::Plants, owner_id).await?;
        let matching = views
            .into_iter()
            .filter(|v| filter.growing_unit_id.is_none_or(|id| v.growing_unit.id == id))
            .filter(|v| filter.location_id.is_none_or(|id| v.location.id == id))
            .filter(|v| {
                filter
                    .species_id
                    .is_none_or(|id| v.species.as_ref().is_some_and(|s| s.id == id))
            })
            .filter(|v| status.is_none_or(|s| v.status == s))
            .filter(|v| name_matches(&v.name, filter.name.as_deref()))
            .collect();

        Ok(listing.apply(matching))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;
    use crate::services::test_support::{TestGarden, create_species};

    fn basil(growing_unit_id: Uuid) -> CreatePlant {
        CreatePlant {
            growing_unit_id,
            name: "Basil".into(),
            species_id: None,
            status: None,
            planted_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn add_respects_unit_capacity() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 2).await;

        garden.plants.add(owner, basil(unit.id)).await.unwrap();
        garden.plants.add(owner, basil(unit.id)).await.unwrap();
        let err = garden.plants.add(owner, basil(unit.id)).await.unwrap_err();
        assert!(matches!(err, PlantError::CapacityExceeded { capacity: 2, .. }));

        garden.project().await;
        let view = garden.growing_units.find(owner, unit.id).await.unwrap();
        assert_eq!(view.plants_count, 2);
        assert_eq!(view.remaining_capacity, 0);
        assert_eq!(view.plants.len(), 2);
    }

    #[tokio::test]
    async fn add_defaults_status_and_rejects_future_dates() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 5).await;

        let plant = garden.plants.add(owner, basil(unit.id)).await.unwrap();
        assert_eq!(plant.status, PlantStatus::Planted);

        let tomorrow = Utc::now().date_naive() + Days::new(1);
        let err = garden
            .plants
            .add(
                owner,
                CreatePlant {
                    planted_date: Some(tomorrow),
                    ..basil(unit.id)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlantError::Validation(ValueError::FutureDate(_))));
    }

    #[tokio::test]
    async fn add_checks_unit_and_species_ownership() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 5).await;
        let foreign_species = create_species(&garden, stranger, "Ocimum basilicum").await;

        let err = garden.plants.add(stranger, basil(unit.id)).await.unwrap_err();
        assert!(matches!(err, PlantError::GrowingUnitNotFound(_)));

        let err = garden
            .plants
            .add(
                owner,
                CreatePlant {
                    species_id: Some(foreign_species.id),
                    ..basil(unit.id)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlantError::SpeciesNotFound(_)));
    }

    #[tokio::test]
    async fn view_carries_unit_location_and_species() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (location, unit) = garden.seed_unit(owner, 5).await;
        let species = create_species(&garden, owner, "Ocimum basilicum").await;

        let plant = garden
            .plants
            .add(
                owner,
                CreatePlant {
                    species_id: Some(species.id),
                    ..basil(unit.id)
                },
            )
            .await
            .unwrap();
        garden.project().await;

        let view = garden.plants.find(owner, plant.id).await.unwrap();
        assert_eq!(view.growing_unit.id, unit.id);
        assert_eq!(view.location.id, location.id);
        assert_eq!(
            view.species.map(|s| s.scientific_name),
            Some("Ocimum basilicum".to_string())
        );

        let species_view = garden.plant_species.find(owner, species.id).await.unwrap();
        assert_eq!(species_view.plants_count, 1);
    }

    #[tokio::test]
    async fn status_change_emits_only_on_difference() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 5).await;
        let plant = garden.plants.add(owner, basil(unit.id)).await.unwrap();
        garden.drain().await;

        garden
            .plants
            .change_status(owner, plant.id, ChangePlantStatus { status: PlantStatus::Planted })
            .await
            .unwrap();
        assert!(garden.drain().await.is_empty());

        let changed = garden
            .plants
            .change_status(owner, plant.id, ChangePlantStatus { status: PlantStatus::Flowering })
            .await
            .unwrap();
        assert_eq!(changed.status, PlantStatus::Flowering);
        let events = garden.drain().await;
        assert!(matches!(
            events.as_slice(),
            [DomainEvent::PlantStatusChanged {
                from: PlantStatus::Planted,
                to: PlantStatus::Flowering,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn transplant_moves_between_units_with_room() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (source_location, source) = garden.seed_unit(owner, 2).await;
        let (_, full) = garden.seed_unit(owner, 1).await;
        let (target_location, target) = garden.seed_unit(owner, 3).await;
        let plant = garden.plants.add(owner, basil(source.id)).await.unwrap();
        garden.plants.add(owner, basil(full.id)).await.unwrap();

        let err = garden
            .plants
            .transplant(owner, plant.id, TransplantPlant { target_growing_unit_id: source.id })
            .await
            .unwrap_err();
        assert!(matches!(err, PlantError::SameGrowingUnit(_)));

        let err = garden
            .plants
            .transplant(owner, plant.id, TransplantPlant { target_growing_unit_id: full.id })
            .await
            .unwrap_err();
        assert!(matches!(err, PlantError::CapacityExceeded { .. }));

        let moved = garden
            .plants
            .transplant(owner, plant.id, TransplantPlant { target_growing_unit_id: target.id })
            .await
            .unwrap();
        assert_eq!(moved.growing_unit_id, target.id);
        garden.project().await;

        let source_view = garden.growing_units.find(owner, source.id).await.unwrap();
        let target_view = garden.growing_units.find(owner, target.id).await.unwrap();
        assert_eq!(source_view.plants_count, 0);
        assert_eq!(target_view.plants_count, 1);
        let view = garden.plants.find(owner, plant.id).await.unwrap();
        assert_eq!(view.growing_unit.id, target.id);
        assert_eq!(view.location.id, target_location.id);

        let source_location = garden.locations.find(owner, source_location.id).await.unwrap();
        let target_location = garden.locations.find(owner, target_location.id).await.unwrap();
        assert_eq!(source_location.plants_count, 0);
        assert_eq!(target_location.plants_count, 1);
    }

    #[tokio::test]
    async fn removing_frees_capacity_and_drops_the_view() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 1).await;
        let plant = garden.plants.add(owner, basil(unit.id)).await.unwrap();
        garden.project().await;

        garden.plants.remove(owner, plant.id).await.unwrap();
        garden.project().await;
        assert!(matches!(
            garden.plants.find(owner, plant.id).await,
            Err(PlantError::NotFound(_))
        ));
        garden.plants.add(owner, basil(unit.id)).await.unwrap();
    }

    #[tokio::test]
    async fn update_can_clear_species() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (_, unit) = garden.seed_unit(owner, 3).await;
        let species = create_species(&garden, owner, "Mentha spicata").await;
        let plant = garden
            .plants
            .add(
                owner,
                CreatePlant {
                    species_id: Some(species.id),
                    ..basil(unit.id)
                },
            )
            .await
            .unwrap();
        garden.project().await;

        let updated = garden
            .plants
            .update(
                owner,
                plant.id,
                UpdatePlant {
                    species_id: Some(None),
                    notes: Some(Some("pinch the tops".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.species_id, None);
        garden.project().await;

        let species_view = garden.plant_species.find(owner, species.id).await.unwrap();
        assert_eq!(species_view.plants_count, 0);
        let view = garden.plants.find(owner, plant.id).await.unwrap();
        assert!(view.species.is_none());
        assert_eq!(view.notes.as_deref(), Some("pinch the tops"));
    }

    #[tokio::test]
    async fn list_filters_by_status_and_location() {
        let garden = TestGarden::new().await;
        let owner = Uuid::new_v4();
        let (location, unit) = garden.seed_unit(owner, 5).await;
        let (_, other_unit) = garden.seed_unit(owner, 5).await;
        let plant = garden.plants.add(owner, basil(unit.id)).await.unwrap();
        garden.plants.add(owner, basil(other_unit.id)).await.unwrap();
        garden
            .plants
            .change_status(owner, plant.id, ChangePlantStatus { status: PlantStatus::Dead })
            .await
            .unwrap();
        garden.project().await;

        let filter = PlantFilter {
            status: Some("dead".into()),
            ..Default::default()
        };
        let page = garden.plants.list(owner, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, plant.id);

        let filter = PlantFilter {
            location_id: Some(location.id),
            ..Default::default()
        };
        assert_eq!(garden.plants.list(owner, &filter).await.unwrap().total, 1);
        assert_eq!(
            garden.plants.list(owner, &PlantFilter::default()).await.unwrap().total,
            2
        );
    }
}
