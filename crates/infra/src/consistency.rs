//! Keeps each item's cached `available_stock` in line with its usage graph.
//!
//! Triggered by usage-record writes (add, quantity change, removal) and by the
//! availability listing. Reservation writes do not trigger it: an item's cached
//! number only moves when something touches one of its usage records.
//!
//! ## Concurrency
//!
//! No locking. The graph read and the availability write are separate statements, so
//! two recomputations of one item (or a recomputation racing a usage write) may leave
//! a stale value behind; the last writer wins and the next trigger repairs it.

use std::sync::Arc;

use eventdesk_core::EntityId;
use eventdesk_inventory::{AvailabilityEngine, InventoryItem};

use crate::store::{CatalogStore, StoreResult};

/// Result of one recomputation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// The item does not exist (any more).
    NotFound,
    /// Cached value already matched; nothing was written.
    Unchanged { available: i64 },
    /// Cached value was replaced.
    Changed { previous: i64, available: i64 },
}

impl RecomputeOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, RecomputeOutcome::Changed { .. })
    }

    pub fn available(&self) -> Option<i64> {
        match *self {
            RecomputeOutcome::NotFound => None,
            RecomputeOutcome::Unchanged { available } | RecomputeOutcome::Changed { available, .. } => {
                Some(available)
            }
        }
    }
}

/// Recomputes and persists derived availability.
pub struct ConsistencyUpdater<S: ?Sized> {
    store: Arc<S>,
    engine: AvailabilityEngine,
}

impl<S> ConsistencyUpdater<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>, engine: AvailabilityEngine) -> Self {
        Self { store, engine }
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }

    /// Recompute one item; writes only when the value differs from the cached one.
    pub async fn recompute(&self, item_id: &EntityId) -> StoreResult<RecomputeOutcome> {
        let Some(graph) = self.store.load_usage_graph(item_id).await? else {
            tracing::debug!(item_id = %item_id, "recompute skipped; item not found");
            return Ok(RecomputeOutcome::NotFound);
        };

        let previous = graph.item.available_stock;
        let available = self.engine.available(&graph);
        if available == previous {
            return Ok(RecomputeOutcome::Unchanged { available });
        }

        if !self.store.set_available_stock(item_id, available).await? {
            return Ok(RecomputeOutcome::NotFound);
        }
        if available < 0 {
            tracing::warn!(item_id = %item_id, available, "item is oversold");
        }
        tracing::debug!(item_id = %item_id, previous, available, "availability updated");

        Ok(RecomputeOutcome::Changed { previous, available })
    }

    /// Recompute every item and return them with fresh availability.
    ///
    /// Items deleted while the listing runs are left out.
    pub async fn recompute_all(&self) -> StoreResult<Vec<InventoryItem>> {
        let items = self.store.list_items().await?;
        let mut fresh = Vec::with_capacity(items.len());
        let mut changed = 0usize;

        for mut item in items {
            let outcome = self.recompute(&item.id).await?;
            let Some(available) = outcome.available() else {
                continue;
            };
            if outcome.changed() {
                changed += 1;
            }
            item.available_stock = available;
            fresh.push(item);
        }

        tracing::debug!(items = fresh.len(), changed, "availability listing recomputed");
        Ok(fresh)
    }
}
