//! Catalog persistence: the store port and its adapters.
//!
//! - `in_memory`: `RwLock`-guarded maps for tests/dev
//! - `postgres`: SQLx/PostgreSQL for production

use async_trait::async_trait;
use thiserror::Error;

use eventdesk_core::{DomainError, EntityId};
use eventdesk_ids::{IdentifierSource, ScanError};
use eventdesk_inventory::{
    Client, InventoryItem, Payment, Reservation, ReservationStatus, ServiceDefinition, UsageGraph,
    UsageRecord,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog store operation error.
///
/// Infrastructure failures (storage, broken references, duplicate keys) as opposed
/// to domain validation, which is wrapped in `Domain` when it surfaces here.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: EntityId },

    #[error("no store for entity type: {0}")]
    UnknownEntityType(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: &EntityId) -> Self {
        Self::NotFound {
            entity,
            id: id.clone(),
        }
    }
}

impl From<StoreError> for ScanError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UnknownEntityType(t) => ScanError::UnknownEntityType(t),
            other => ScanError::Unavailable(other.to_string()),
        }
    }
}

/// Create/read/update/delete over the catalog plus the usage-graph read.
///
/// Extends [`IdentifierSource`] so one store instance serves both startup recovery
/// and request traffic.
///
/// Writes are independent statements: nothing here makes a usage-record write and the
/// availability write that follows it atomic.
#[async_trait]
pub trait CatalogStore: IdentifierSource + Send + Sync {
    async fn insert_client(&self, client: Client) -> StoreResult<()>;

    async fn insert_payment(&self, payment: Payment) -> StoreResult<()>;

    async fn insert_item(&self, item: InventoryItem) -> StoreResult<()>;

    async fn get_item(&self, id: &EntityId) -> StoreResult<Option<InventoryItem>>;

    /// All items, ordered by id.
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>>;

    /// Overwrite the cached availability. Returns `false` if the item is gone.
    async fn set_available_stock(&self, id: &EntityId, available: i64) -> StoreResult<bool>;

    async fn insert_service(&self, service: ServiceDefinition) -> StoreResult<()>;

    async fn get_service(&self, id: &EntityId) -> StoreResult<Option<ServiceDefinition>>;

    /// Fails with `NotFound` if the item or the (present) service does not exist.
    async fn insert_usage(&self, usage: UsageRecord) -> StoreResult<()>;

    async fn get_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>>;

    async fn update_usage_quantity(&self, id: &EntityId, quantity: f64) -> StoreResult<UsageRecord>;

    /// Returns the removed record, or `None` if there was nothing to remove.
    async fn delete_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>>;

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<()>;

    async fn get_reservation(&self, id: &EntityId) -> StoreResult<Option<Reservation>>;

    async fn update_reservation_status(
        &self,
        id: &EntityId,
        status: ReservationStatus,
    ) -> StoreResult<Reservation>;

    /// The item with its usage records and every reservation referencing one of
    /// their services. `None` if the item does not exist.
    async fn load_usage_graph(&self, item_id: &EntityId) -> StoreResult<Option<UsageGraph>>;
}
