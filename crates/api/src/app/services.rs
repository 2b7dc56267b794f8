use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use eventdesk_core::{DomainError, Entity, EntityId};
use eventdesk_ids::IdAllocator;
use eventdesk_infra::{CatalogStore, ConsistencyUpdater, InMemoryCatalogStore, RecomputeOutcome, StoreError};
use eventdesk_inventory::{
    AvailabilityEngine, Client, InventoryItem, Payment, Reservation, ReservationStatus,
    ServiceDefinition, ServiceUsage, UsageRecord,
};

/// Application-level failure, mapped to an HTTP response in `errors.rs`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Business rule rejected the request (e.g. reopening a cancelled reservation).
    #[error("{0}")]
    Invariant(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Invariant(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(format!("{what} not found")),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => ServiceError::NotFound(value.to_string()),
            StoreError::AlreadyExists { .. } => ServiceError::Conflict(value.to_string()),
            StoreError::Domain(e) => e.into(),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Item as returned by the detail endpoint.
#[derive(Debug, Clone)]
pub struct ItemDetail {
    pub item: InventoryItem,
    pub in_use: f64,
    pub breakdown: Vec<ServiceUsage>,
}

/// A usage-record mutation together with the recomputation it triggered.
#[derive(Debug, Clone)]
pub struct UsageChange {
    pub usage: UsageRecord,
    pub availability: RecomputeOutcome,
}

/// Shared application services: allocator, catalog and availability upkeep.
pub struct AppServices {
    ids: Arc<IdAllocator>,
    store: Arc<dyn CatalogStore>,
    updater: ConsistencyUpdater<dyn CatalogStore>,
}

impl AppServices {
    pub fn new(ids: Arc<IdAllocator>, store: Arc<dyn CatalogStore>, engine: AvailabilityEngine) -> Self {
        let updater = ConsistencyUpdater::new(store.clone(), engine);
        Self { ids, store, updater }
    }

    /// Fresh allocator over an empty in-memory catalog (dev/tests).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(IdAllocator::new()),
            Arc::new(InMemoryCatalogStore::new()),
            AvailabilityEngine::default(),
        )
    }

    pub fn ids(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    fn next_id<T: Entity>(&self) -> EntityId {
        let id = self.ids.generate(T::KIND.as_str());
        tracing::debug!(entity_type = %T::KIND, id = %id, "identifier allocated");
        id
    }

    // -------------------------
    // Clients / payments
    // -------------------------

    pub async fn create_client(&self, name: String, email: Option<String>) -> ServiceResult<Client> {
        let client = Client::new(self.next_id::<Client>(), name, email)?;
        self.store.insert_client(client.clone()).await?;
        Ok(client)
    }

    pub async fn record_payment(
        &self,
        reservation_id: EntityId,
        amount: u64,
        payment_type: String,
    ) -> ServiceResult<Payment> {
        let payment = Payment::new(self.next_id::<Payment>(), reservation_id, amount, payment_type, Utc::now())?;
        self.store.insert_payment(payment.clone()).await?;
        Ok(payment)
    }

    // -------------------------
    // Items
    // -------------------------

    pub async fn create_item(&self, name: String, total_stock: Option<i64>) -> ServiceResult<InventoryItem> {
        let item = InventoryItem::new(self.next_id::<InventoryItem>(), name, total_stock, Utc::now())?;
        self.store.insert_item(item.clone()).await?;
        Ok(item)
    }

    /// Every item with freshly recomputed (and persisted) availability.
    pub async fn list_items(&self) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self.updater.recompute_all().await?)
    }

    /// Stored item plus the per-service usage behind its availability.
    pub async fn item_detail(&self, id: &EntityId) -> ServiceResult<ItemDetail> {
        let graph = self
            .store
            .load_usage_graph(id)
            .await?
            .ok_or_else(|| StoreError::not_found("item", id))?;

        let engine = self.updater.engine();
        let breakdown = engine.breakdown(&graph);
        let in_use = engine.in_use(&graph);

        Ok(ItemDetail {
            item: graph.item,
            in_use,
            breakdown,
        })
    }

    // -------------------------
    // Services / usage records
    // -------------------------

    pub async fn create_service(&self, name: String, description: Option<String>) -> ServiceResult<ServiceDefinition> {
        let service = ServiceDefinition::new(self.next_id::<ServiceDefinition>(), name, description)?;
        self.store.insert_service(service.clone()).await?;
        Ok(service)
    }

    pub async fn add_usage(
        &self,
        service_id: EntityId,
        item_id: EntityId,
        quantity: f64,
    ) -> ServiceResult<UsageChange> {
        let usage = UsageRecord::new(self.next_id::<UsageRecord>(), item_id, Some(service_id), quantity)?;
        self.store.insert_usage(usage.clone()).await?;
        let availability = self.updater.recompute(&usage.item_id).await?;
        Ok(UsageChange { usage, availability })
    }

    pub async fn update_usage(&self, id: &EntityId, quantity: f64) -> ServiceResult<UsageChange> {
        let usage = self.store.update_usage_quantity(id, quantity).await?;
        let availability = self.updater.recompute(&usage.item_id).await?;
        Ok(UsageChange { usage, availability })
    }

    pub async fn remove_usage(&self, id: &EntityId) -> ServiceResult<UsageChange> {
        let usage = self
            .store
            .delete_usage(id)
            .await?
            .ok_or_else(|| StoreError::not_found("usage record", id))?;
        let availability = self.updater.recompute(&usage.item_id).await?;
        Ok(UsageChange { usage, availability })
    }

    // -------------------------
    // Reservations
    // -------------------------

    /// Availability caches are left as they are; see `ConsistencyUpdater`.
    pub async fn create_reservation(
        &self,
        client_id: Option<EntityId>,
        service_id: Option<EntityId>,
    ) -> ServiceResult<Reservation> {
        let reservation = Reservation::new(self.next_id::<Reservation>(), client_id, service_id, Utc::now());
        self.store.insert_reservation(reservation.clone()).await?;
        Ok(reservation)
    }

    pub async fn change_reservation_status(
        &self,
        id: &EntityId,
        status: ReservationStatus,
    ) -> ServiceResult<Reservation> {
        Ok(self.store.update_reservation_status(id, status).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creation_paths_use_kind_prefixes() {
        let services = AppServices::in_memory();
        let year = services.ids().clock().current_year();

        let client = services.create_client("Ana".into(), None).await.unwrap();
        let item = services.create_item("Chair".into(), Some(10)).await.unwrap();
        let service = services.create_service("Wedding".into(), None).await.unwrap();

        assert_eq!(client.id, EntityId::format("CLE", 1, year));
        assert_eq!(item.id, EntityId::format("ITM", 1, year));
        assert_eq!(service.id, EntityId::format("DSV", 1, year));
        assert_eq!(item.available_stock, 10);
    }

    #[tokio::test]
    async fn usage_mutations_recompute_but_reservations_do_not() {
        let services = AppServices::in_memory();
        let item = services.create_item("Chair".into(), Some(10)).await.unwrap();
        let service = services.create_service("Wedding".into(), None).await.unwrap();
        for _ in 0..3 {
            services.create_reservation(None, Some(service.id.clone())).await.unwrap();
        }

        let added = services.add_usage(service.id.clone(), item.id.clone(), 2.0).await.unwrap();
        assert_eq!(added.availability, RecomputeOutcome::Changed { previous: 10, available: 4 });

        services.create_reservation(None, Some(service.id.clone())).await.unwrap();
        let cached = services.store().get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(cached.available_stock, 4);

        let updated = services.update_usage(&added.usage.id, 1.0).await.unwrap();
        assert_eq!(updated.availability.available(), Some(6));

        let removed = services.remove_usage(&added.usage.id).await.unwrap();
        assert_eq!(removed.availability.available(), Some(10));
    }

    #[tokio::test]
    async fn errors_map_to_service_errors() {
        let services = AppServices::in_memory();
        let year = services.ids().clock().current_year();

        let err = services.create_item("  ".into(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let missing = EntityId::format("LIT", 42, year);
        let err = services.remove_usage(&missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let r = services.create_reservation(None, None).await.unwrap();
        services.change_reservation_status(&r.id, ReservationStatus::Cancelled).await.unwrap();
        let err = services
            .change_reservation_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invariant(_)));
    }
}
