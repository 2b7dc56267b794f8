//! Postgres-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Storage` (callers pre-check existence; a race surfaces here) |
//! | Database (foreign key violation) | `23503` | `Storage` |
//! | Database (undefined table) | `42P01` | `UnknownEntityType` for identifier scans, `Storage` otherwise |
//! | Any other | N/A | `Storage` |
//!
//! ## Identifier scans
//!
//! Table names for `list_identifiers` come from a fixed entity type → table map;
//! caller input never reaches the SQL text. Tables owned by other parts of the
//! system (`users`, `organizers`, `payment_types`) are scanned too but are not created
//! by [`PostgresCatalogStore::ensure_schema`]; if they are missing the scan for that
//! type fails and recovery skips it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use eventdesk_core::{EntityId, EntityKind};
use eventdesk_ids::{IdentifierSource, ScanError};
use eventdesk_inventory::{
    Client, InventoryItem, Payment, Reservation, ReservationStatus, ServiceDefinition, UsageGraph,
    UsageRecord,
};

use super::{CatalogStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        total_stock BIGINT,
        available_stock BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_items (
        id TEXT PRIMARY KEY,
        item_id TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
        quantity DOUBLE PRECISION NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id TEXT PRIMARY KEY,
        client_id TEXT REFERENCES clients(id),
        service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        reservation_id TEXT NOT NULL REFERENCES reservations(id),
        amount BIGINT NOT NULL,
        payment_type TEXT NOT NULL,
        paid_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS service_items_item_idx ON service_items (item_id)",
    "CREATE INDEX IF NOT EXISTS reservations_service_idx ON reservations (service_id)",
];

/// Table holding identifiers for one entity type.
fn table_for(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Client => Some("clients"),
        EntityKind::User => Some("users"),
        EntityKind::Organizer => Some("organizers"),
        EntityKind::Reservation => Some("reservations"),
        EntityKind::Payment => Some("payments"),
        EntityKind::PaymentType => Some("payment_types"),
        EntityKind::Item => Some("items"),
        EntityKind::ServiceDetail => Some("services"),
        EntityKind::ItemList => Some("service_items"),
        EntityKind::ServiceList => None,
    }
}

/// Postgres-backed catalog store.
///
/// `Send + Sync`; all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the catalog tables exist.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn exists(&self, table: &'static str, id: &EntityId) -> StoreResult<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists", e))
    }

    async fn ensure_absent(&self, table: &'static str, entity: &'static str, id: &EntityId) -> StoreResult<()> {
        if self.exists(table, id).await? {
            return Err(StoreError::AlreadyExists {
                entity,
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn ensure_present(&self, table: &'static str, entity: &'static str, id: &EntityId) -> StoreResult<()> {
        if !self.exists(table, id).await? {
            return Err(StoreError::not_found(entity, id));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentifierSource for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn list_identifiers(&self, entity_type: &str) -> Result<Vec<String>, ScanError> {
        let table = EntityKind::from_type_name(entity_type)
            .and_then(table_for)
            .ok_or_else(|| ScanError::UnknownEntityType(entity_type.to_string()))?;

        let sql = format!("SELECT id FROM {table}");
        sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| {
                if is_undefined_table(&e) {
                    ScanError::UnknownEntityType(entity_type.to_string())
                } else {
                    ScanError::from(map_sqlx_error("list_identifiers", e))
                }
            })
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self, client), fields(client_id = %client.id), err)]
    async fn insert_client(&self, client: Client) -> StoreResult<()> {
        self.ensure_absent("clients", "client", &client.id).await?;
        sqlx::query("INSERT INTO clients (id, name, email) VALUES ($1, $2, $3)")
            .bind(client.id.as_str())
            .bind(&client.name)
            .bind(&client.email)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_client", e))?;
        Ok(())
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id), err)]
    async fn insert_payment(&self, payment: Payment) -> StoreResult<()> {
        self.ensure_present("reservations", "reservation", &payment.reservation_id).await?;
        self.ensure_absent("payments", "payment", &payment.id).await?;
        let amount = i64::try_from(payment.amount)
            .map_err(|_| StoreError::Storage(format!("payment amount {} out of range", payment.amount)))?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, reservation_id, amount, payment_type, paid_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(payment.id.as_str())
        .bind(payment.reservation_id.as_str())
        .bind(amount)
        .bind(&payment.payment_type)
        .bind(payment.paid_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_payment", e))?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn insert_item(&self, item: InventoryItem) -> StoreResult<()> {
        self.ensure_absent("items", "item", &item.id).await?;
        sqlx::query(
            r#"
            INSERT INTO items (id, name, total_stock, available_stock, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(item.total_stock)
        .bind(item.available_stock)
        .bind(item.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, id: &EntityId) -> StoreResult<Option<InventoryItem>> {
        let row = sqlx::query(
            "SELECT id, name, total_stock, available_stock, created_at FROM items WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;

        row.map(|r| item_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            "SELECT id, name, total_stock, available_stock, created_at FROM items ORDER BY id ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn set_available_stock(&self, id: &EntityId, available: i64) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE items SET available_stock = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(available)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_available_stock", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, service), fields(service_id = %service.id), err)]
    async fn insert_service(&self, service: ServiceDefinition) -> StoreResult<()> {
        self.ensure_absent("services", "service", &service.id).await?;
        sqlx::query("INSERT INTO services (id, name, description) VALUES ($1, $2, $3)")
            .bind(service.id.as_str())
            .bind(&service.name)
            .bind(&service.description)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_service", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(service_id = %id), err)]
    async fn get_service(&self, id: &EntityId) -> StoreResult<Option<ServiceDefinition>> {
        let row = sqlx::query("SELECT id, name, description FROM services WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_service", e))?;

        row.map(|r| {
            Ok(ServiceDefinition {
                id: entity_id(&r, "id")?,
                name: get(&r, "name")?,
                description: get(&r, "description")?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, usage), fields(usage_id = %usage.id), err)]
    async fn insert_usage(&self, usage: UsageRecord) -> StoreResult<()> {
        self.ensure_present("items", "item", &usage.item_id).await?;
        if let Some(service_id) = &usage.service_id {
            self.ensure_present("services", "service", service_id).await?;
        }
        self.ensure_absent("service_items", "usage record", &usage.id).await?;

        sqlx::query(
            "INSERT INTO service_items (id, item_id, service_id, quantity) VALUES ($1, $2, $3, $4)",
        )
        .bind(usage.id.as_str())
        .bind(usage.item_id.as_str())
        .bind(usage.service_id.as_ref().map(EntityId::as_str))
        .bind(usage.quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_usage", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(usage_id = %id), err)]
    async fn get_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>> {
        let row = sqlx::query("SELECT id, item_id, service_id, quantity FROM service_items WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_usage", e))?;

        row.map(|r| usage_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(usage_id = %id), err)]
    async fn update_usage_quantity(&self, id: &EntityId, quantity: f64) -> StoreResult<UsageRecord> {
        let mut usage = self
            .get_usage(id)
            .await?
            .ok_or_else(|| StoreError::not_found("usage record", id))?;
        usage.set_quantity(quantity)?;

        sqlx::query("UPDATE service_items SET quantity = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(quantity)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_usage_quantity", e))?;
        Ok(usage)
    }

    #[instrument(skip(self), fields(usage_id = %id), err)]
    async fn delete_usage(&self, id: &EntityId) -> StoreResult<Option<UsageRecord>> {
        let row = sqlx::query(
            "DELETE FROM service_items WHERE id = $1 RETURNING id, item_id, service_id, quantity",
        )
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_usage", e))?;

        row.map(|r| usage_from_row(&r)).transpose()
    }

    #[instrument(skip(self, reservation), fields(reservation_id = %reservation.id), err)]
    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<()> {
        if let Some(service_id) = &reservation.service_id {
            self.ensure_present("services", "service", service_id).await?;
        }
        if let Some(client_id) = &reservation.client_id {
            self.ensure_present("clients", "client", client_id).await?;
        }
        self.ensure_absent("reservations", "reservation", &reservation.id).await?;

        sqlx::query(
            r#"
            INSERT INTO reservations (id, client_id, service_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reservation.id.as_str())
        .bind(reservation.client_id.as_ref().map(EntityId::as_str))
        .bind(reservation.service_id.as_ref().map(EntityId::as_str))
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reservation", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(reservation_id = %id), err)]
    async fn get_reservation(&self, id: &EntityId) -> StoreResult<Option<Reservation>> {
        let row = sqlx::query(
            "SELECT id, client_id, service_id, status, created_at FROM reservations WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_reservation", e))?;

        row.map(|r| reservation_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(reservation_id = %id), err)]
    async fn update_reservation_status(
        &self,
        id: &EntityId,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut reservation = self
            .get_reservation(id)
            .await?
            .ok_or_else(|| StoreError::not_found("reservation", id))?;
        reservation.transition(status)?;

        sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_reservation_status", e))?;
        Ok(reservation)
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn load_usage_graph(&self, item_id: &EntityId) -> StoreResult<Option<UsageGraph>> {
        let Some(item) = self.get_item(item_id).await? else {
            return Ok(None);
        };

        let usage_rows = sqlx::query(
            "SELECT id, item_id, service_id, quantity FROM service_items WHERE item_id = $1 ORDER BY id",
        )
        .bind(item_id.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_usage_graph", e))?;
        let usages = usage_rows
            .iter()
            .map(usage_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut service_ids: Vec<String> = usages
            .iter()
            .filter_map(|u| u.service_id.as_ref().map(|s| s.as_str().to_string()))
            .collect();
        service_ids.sort();
        service_ids.dedup();

        let reservations = if service_ids.is_empty() {
            Vec::new()
        } else {
            let rows = sqlx::query(
                r#"
                SELECT id, client_id, service_id, status, created_at
                FROM reservations
                WHERE service_id = ANY($1)
                ORDER BY id
                "#,
            )
            .bind(&service_ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_usage_graph", e))?;
            rows.iter()
                .map(reservation_from_row)
                .collect::<StoreResult<Vec<_>>>()?
        };

        Ok(Some(UsageGraph {
            item,
            usages,
            reservations,
        }))
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Storage(format!("column {column}: {e}")))
}

fn entity_id(row: &PgRow, column: &str) -> StoreResult<EntityId> {
    let raw: String = get(row, column)?;
    Ok(raw.parse::<EntityId>()?)
}

fn optional_entity_id(row: &PgRow, column: &str) -> StoreResult<Option<EntityId>> {
    let raw: Option<String> = get(row, column)?;
    Ok(raw.map(|s| s.parse::<EntityId>()).transpose()?)
}

fn item_from_row(row: &PgRow) -> StoreResult<InventoryItem> {
    Ok(InventoryItem {
        id: entity_id(row, "id")?,
        name: get(row, "name")?,
        total_stock: get(row, "total_stock")?,
        available_stock: get(row, "available_stock")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn usage_from_row(row: &PgRow) -> StoreResult<UsageRecord> {
    Ok(UsageRecord {
        id: entity_id(row, "id")?,
        item_id: entity_id(row, "item_id")?,
        service_id: optional_entity_id(row, "service_id")?,
        quantity: get(row, "quantity")?,
    })
}

fn reservation_from_row(row: &PgRow) -> StoreResult<Reservation> {
    let status: String = get(row, "status")?;
    Ok(Reservation {
        id: entity_id(row, "id")?,
        client_id: optional_entity_id(row, "client_id")?,
        service_id: optional_entity_id(row, "service_id")?,
        status: status.parse::<ReservationStatus>()?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("42P01"),
        _ => false,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            StoreError::Storage(format!(
                "database error in {operation} ({code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => StoreError::Storage(format!("connection pool closed in {operation}")),
        _ => StoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scanned_kind_except_service_list_has_a_table() {
        for kind in EntityKind::ALL {
            match kind {
                EntityKind::ServiceList => assert_eq!(table_for(kind), None),
                _ => assert!(table_for(kind).is_some(), "{kind} has no table"),
            }
        }
    }

    #[test]
    fn table_names_are_plain_identifiers() {
        for kind in EntityKind::ALL {
            if let Some(table) = table_for(kind) {
                assert!(table.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
            }
        }
    }
}
