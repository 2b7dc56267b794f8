use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use eventdesk_core::{EntityId, EntityKind};
use eventdesk_ids::{IdentifierSource, ScanError};
use eventdesk_inventory::{
    Client, InventoryItem, Payment, Reservation, ReservationStatus, ServiceDefinition, UsageGraph,
    UsageRecord,
};

use super::{CatalogStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    clients: BTreeMap<EntityId, Client>,
    payments: BTreeMap<EntityId, Payment>,
    items: BTreeMap<EntityId, InventoryItem>,
    services: BTreeMap<EntityId, ServiceDefinition>,
    usages: BTreeMap<EntityId, UsageRecord>,
    reservations: BTreeMap<EntityId, Reservation>,
}

/// In-memory catalog for tests/dev.
///
/// One lock over all tables: each call sees a consistent snapshot, but consecutive
/// calls are not atomic with each other (same as the SQL adapter).
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Storage("catalog lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Storage("catalog lock poisoned".to_string()))
    }
}

fn insert_new<V>(
    table: &mut BTreeMap<EntityId, V>,
    entity: &'static str,
    id: EntityId,
    value: V,
) -> StoreResult<()> {
    if table.contains_key(&id) {
        return Err(StoreError::AlreadyExists { entity, id });
    }
    table.insert(id, value);
    Ok(())
}

#[async_trait]
impl IdentifierSource for InMemoryCatalogStore {
    async fn list_identifiers(&self, entity_type: &str) -> Result<Vec<String>, ScanError> {
        let tables = self.read()?;
        let ids: Vec<&EntityId> = match EntityKind::from_type_name(entity_type) {
            Some(EntityKind::Client) => tables.clients.keys().collect(),
            Some(EntityKind::Payment) => tables.payments.keys().collect(),
            Some(EntityKind::Item) => tables.items.keys().collect(),
            Some(EntityKind::ServiceDetail) => tables.services.keys().collect(),
            Some(EntityKind::ItemList) => tables.usages.keys().collect(),
            Some(EntityKind::Reservation) => tables.reservations.keys().collect(),
            _ => return Err(ScanError::UnknownEntityType(entity_type.to_string())),
        };
        Ok(ids.into_iter().map(|id| id.as_str().to_string()).collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_client(&self, client: Client) -> StoreResult<()> {
        let mut tables = self.write()?;
        insert_new(&mut tables.clients, "client", client.id.clone(), client)
    }

    async fn insert_payment(&self, payment: Payment) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.reservations.contains_key(&payment.reservation_id) {
            return Err(StoreError::not_found("reservation", &payment.reservation_id));
        }
        insert_new(&mut tables.payments, "payment", payment.id.clone(), payment)
    }

    async fn insert_item(&self, item: InventoryItem) -> StoreResult<()> {
        let mut tables = self.write()?;
        insert_new(&mut tables.items, "item", item.id.clone(), item)
    }

    async fn get_item(&self, id: &EntityId) -> StoreResult<Option<InventoryItem>> {
        Ok(self.read()?.items.get(id).cloned())
    }

    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    async fn set_available_stock(&self, id: &EntityId, available: i64) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.items.get_mut(id) {
            Some(item) => {
                item.available_stock = available;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_service(&self, service: ServiceDefinition) -> StoreResult<()> {
        let mut tables = self.write()?;
        insert_new(&mut tables.services, "service", service.id.clone(), service)
    }

    async fn get_service(&self, id: &EntityId) -> StoreResult<Option<ServiceDefinition>> {
        Ok(self.read()?.services.get(id).cloned())
    }

    async fn insert_usage(&self, usage: UsageRecord) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.items.contains_key(&usage.item_id) {
            return Err(StoreError::not_found("item", &usage.item_id));
        }
        if let Some(service_id) = &usage.service_id {
            if !tables.services.contains_key(service_id) {
                return Err(StoreError::not_found("service", service_id));
            }
        }
        insert_new(&mut tables.usages, "usage record", usage.id.clone(), usage)
    }

    async fn get_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>> {
        Ok(self.read()?.usages.get(id).cloned())
    }

    async fn update_usage_quantity(&self, id: &EntityId, quantity: f64) -> StoreResult<UsageRecord> {
        let mut tables = self.write()?;
        let usage = tables
            .usages
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("usage record", id))?;
        usage.set_quantity(quantity)?;
        Ok(usage.clone())
    }

    async fn delete_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>> {
        Ok(self.write()?.usages.remove(id))
    }

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<()> {
        let mut tables = self.write()?;
        if let Some(service_id) = &reservation.service_id {
            if !tables.services.contains_key(service_id) {
                return Err(StoreError::not_found("service", service_id));
            }
        }
        if let Some(client_id) = &reservation.client_id {
            if !tables.clients.contains_key(client_id) {
                return Err(StoreError::not_found("client", client_id));
            }
        }
        insert_new(&mut tables.reservations, "reservation", reservation.id.clone(), reservation)
    }

    async fn get_reservation(&self, id: &EntityId) -> StoreResult<Option<Reservation>> {
        Ok(self.read()?.reservations.get(id).cloned())
    }

    async fn update_reservation_status(
        &self,
        id: &EntityId,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut tables = self.write()?;
        let reservation = tables
            .reservations
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("reservation", id))?;
        reservation.transition(status)?;
        Ok(reservation.clone())
    }

    async fn load_usage_graph(&self, item_id: &EntityId) -> StoreResult<Option<UsageGraph>> {
        let tables = self.read()?;
        let Some(item) = tables.items.get(item_id).cloned() else {
            return Ok(None);
        };

        let usages: Vec<UsageRecord> = tables
            .usages
            .values()
            .filter(|u| &u.item_id == item_id)
            .cloned()
            .collect();

        let reservations = tables
            .reservations
            .values()
            .filter(|r| {
                r.service_id
                    .as_ref()
                    .is_some_and(|s| usages.iter().any(|u| u.service_id.as_ref() == Some(s)))
            })
            .cloned()
            .collect();

        Ok(Some(UsageGraph {
            item,
            usages,
            reservations,
        }))
    }
}
