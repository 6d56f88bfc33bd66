//! Domain events and the in-process bus that carries them to the projector.

use chrono::{DateTime, Utc};
use db::models::values::PlantStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

/// A committed change to one aggregate, with the ids of every aggregate whose
/// view depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    LocationCreated {
        owner_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    LocationUpdated {
        owner_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    LocationDeleted {
        owner_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GrowingUnitCreated {
        owner_id: Uuid,
        growing_unit_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GrowingUnitUpdated {
        owner_id: Uuid,
        growing_unit_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GrowingUnitMoved {
        owner_id: Uuid,
        growing_unit_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    GrowingUnitDeleted {
        owner_id: Uuid,
        growing_unit_id: Uuid,
        location_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    PlantAdded {
        owner_id: Uuid,
        plant_id: Uuid,
        growing_unit_id: Uuid,
        species_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
    },
    PlantUpdated {
        owner_id: Uuid,
        plant_id: Uuid,
        growing_unit_id: Uuid,
        species_id: Option<Uuid>,
        previous_species_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
    },
    PlantStatusChanged {
        owner_id: Uuid,
        plant_id: Uuid,
        growing_unit_id: Uuid,
        from: PlantStatus,
        to: PlantStatus,
        occurred_at: DateTime<Utc>,
    },
    PlantTransplanted {
        owner_id: Uuid,
        plant_id: Uuid,
        from_growing_unit_id: Uuid,
        to_growing_unit_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    PlantRemoved {
        owner_id: Uuid,
        plant_id: Uuid,
        growing_unit_id: Uuid,
        species_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
    },
    PlantSpeciesCreated {
        owner_id: Uuid,
        species_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    PlantSpeciesUpdated {
        owner_id: Uuid,
        species_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    PlantSpeciesDeleted {
        owner_id: Uuid,
        species_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn owner_id(&self) -> Uuid {
        match self {
            Self::LocationCreated { owner_id, .. }
            | Self::LocationUpdated { owner_id, .. }
            | Self::LocationDeleted { owner_id, .. }
            | Self::GrowingUnitCreated { owner_id, .. }
            | Self::GrowingUnitUpdated { owner_id, .. }
            | Self::GrowingUnitMoved { owner_id, .. }
            | Self::GrowingUnitDeleted { owner_id, .. }
            | Self::PlantAdded { owner_id, .. }
            | Self::PlantUpdated { owner_id, .. }
            | Self::PlantStatusChanged { owner_id, .. }
            | Self::PlantTransplanted { owner_id, .. }
            | Self::PlantRemoved { owner_id, .. }
            | Self::PlantSpeciesCreated { owner_id, .. }
            | Self::PlantSpeciesUpdated { owner_id, .. }
            | Self::PlantSpeciesDeleted { owner_id, .. } => *owner_id,
        }
    }

    /// Id of the aggregate the event was raised by.
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            Self::LocationCreated { location_id, .. }
            | Self::LocationUpdated { location_id, .. }
            | Self::LocationDeleted { location_id, .. } => *location_id,
            Self::GrowingUnitCreated {
                growing_unit_id, ..
            }
            | Self::GrowingUnitUpdated {
                growing_unit_id, ..
            }
            | Self::GrowingUnitMoved {
                growing_unit_id, ..
            }
            | Self::GrowingUnitDeleted {
                growing_unit_id, ..
            } => *growing_unit_id,
            Self::PlantAdded { plant_id, .. }
            | Self::PlantUpdated { plant_id, .. }
            | Self::PlantStatusChanged { plant_id, .. }
            | Self::PlantTransplanted { plant_id, .. }
            | Self::PlantRemoved { plant_id, .. } => *plant_id,
            Self::PlantSpeciesCreated { species_id, .. }
            | Self::PlantSpeciesUpdated { species_id, .. }
            | Self::PlantSpeciesDeleted { species_id, .. } => *species_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LocationCreated { .. } => "location_created",
            Self::LocationUpdated { .. } => "location_updated",
            Self::LocationDeleted { .. } => "location_deleted",
            Self::GrowingUnitCreated { .. } => "growing_unit_created",
            Self::GrowingUnitUpdated { .. } => "growing_unit_updated",
            Self::GrowingUnitMoved { .. } => "growing_unit_moved",
            Self::GrowingUnitDeleted { .. } => "growing_unit_deleted",
            Self::PlantAdded { .. } => "plant_added",
            Self::PlantUpdated { .. } => "plant_updated",
            Self::PlantStatusChanged { .. } => "plant_status_changed",
            Self::PlantTransplanted { .. } => "plant_transplanted",
            Self::PlantRemoved { .. } => "plant_removed",
            Self::PlantSpeciesCreated { .. } => "plant_species_created",
            Self::PlantSpeciesUpdated { .. } => "plant_species_updated",
            Self::PlantSpeciesDeleted { .. } => "plant_species_deleted",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a committed event. Having no subscriber is fine: the read side
    /// is rebuilt from the write store on the next start.
    pub fn publish(&self, event: DomainEvent) {
        debug!(
            event = event.name(),
            owner_id = %event.owner_id(),
            aggregate_id = %event.aggregate_id(),
            "Publishing domain event"
        );
        if self.sender.send(event).is_err() {
            trace!("No projector subscribed, event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
