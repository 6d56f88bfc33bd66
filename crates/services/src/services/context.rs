use db::{DBService, ReadStore};
use sqlx::SqlitePool;

use super::{config::PaginationConfig, events::EventBus};

/// Handles every bounded-context service needs: the write pool, the read
/// store, the event bus and the paging limits.
#[derive(Clone)]
pub struct ServiceContext {
    pub db: DBService,
    pub read_store: ReadStore,
    pub events: EventBus,
    pub pagination: PaginationConfig,
}

impl ServiceContext {
    pub fn new(
        db: DBService,
        read_store: ReadStore,
        events: EventBus,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            db,
            read_store,
            events,
            pagination,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
