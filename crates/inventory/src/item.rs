use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventdesk_core::{DomainError, DomainResult, Entity, EntityId, EntityKind};

/// Inventory item with a cached availability figure.
///
/// `available_stock` is derived (see [`crate::AvailabilityEngine`]); only the
/// consistency updater writes it. Create/update paths never take it from input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: EntityId,
    pub name: String,
    /// Units owned. Absent is treated as zero.
    pub total_stock: Option<i64>,
    pub available_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// New item; nothing is in use yet, so everything owned is available.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        total_stock: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(total) = total_stock {
            if total < 0 {
                return Err(DomainError::validation("total_stock cannot be negative"));
            }
        }

        Ok(Self {
            id,
            name,
            total_stock,
            available_stock: total_stock.unwrap_or(0),
            created_at,
        })
    }

    pub fn total_stock_or_zero(&self) -> i64 {
        self.total_stock.unwrap_or(0)
    }
}

impl Entity for InventoryItem {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
