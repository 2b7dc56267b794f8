//! Derived availability: how much of an item is committed to reservations.
//!
//! ```text
//! item ──< usage record >── service ──< reservation
//! ```
//!
//! For each service using the item, the quantity it needs per occurrence is the sum
//! of its usage records for that item; every reservation referencing the service is
//! one occurrence. `available = total_stock - Σ(per_occurrence × occurrences)`,
//! truncated toward zero and never clamped: an oversold item reports a negative number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eventdesk_core::EntityId;

use crate::item::InventoryItem;
use crate::reservation::Reservation;
use crate::service::UsageRecord;

/// Everything needed to compute one item's availability.
///
/// `reservations` may include reservations for unrelated services; they are
/// matched per service.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageGraph {
    pub item: InventoryItem,
    pub usages: Vec<UsageRecord>,
    pub reservations: Vec<Reservation>,
}

/// Which reservations count as occurrences of a service.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationCounting {
    /// Every reservation referencing the service, cancelled and finished included.
    #[default]
    AllStates,
    /// Only pending and confirmed reservations.
    OpenOnly,
}

/// One service's share of an item's in-use quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceUsage {
    pub service_id: EntityId,
    pub quantity_per_occurrence: f64,
    pub occurrences: usize,
    pub in_use: f64,
}

/// Decimal places kept for quantities. Binary float error below this is dropped
/// before truncation, so `0.1 + 0.2` counts as `0.3`.
pub const QUANTITY_DECIMALS: i32 = 6;

fn round_quantity(value: f64) -> f64 {
    let scale = 10f64.powi(QUANTITY_DECIMALS);
    (value * scale).round() / scale
}

/// Pure availability computation (no IO).
#[derive(Debug, Default, Copy, Clone)]
pub struct AvailabilityEngine {
    counting: ReservationCounting,
}

impl AvailabilityEngine {
    pub fn new(counting: ReservationCounting) -> Self {
        Self { counting }
    }

    pub fn counting(&self) -> ReservationCounting {
        self.counting
    }

    /// Per-service usage lines, ordered by service id.
    pub fn breakdown(&self, graph: &UsageGraph) -> Vec<ServiceUsage> {
        let mut per_service: BTreeMap<&EntityId, f64> = BTreeMap::new();
        for usage in &graph.usages {
            if usage.item_id != graph.item.id {
                continue;
            }
            if let Some(service_id) = &usage.service_id {
                *per_service.entry(service_id).or_insert(0.0) += usage.quantity;
            }
        }

        per_service
            .into_iter()
            .map(|(service_id, quantity)| {
                let occurrences = self.occurrences(graph, service_id);
                let quantity_per_occurrence = round_quantity(quantity);
                ServiceUsage {
                    service_id: service_id.clone(),
                    quantity_per_occurrence,
                    occurrences,
                    in_use: round_quantity(quantity_per_occurrence * occurrences as f64),
                }
            })
            .collect()
    }

    /// Total quantity of the item committed across all services' reservations.
    pub fn in_use(&self, graph: &UsageGraph) -> f64 {
        round_quantity(self.breakdown(graph).iter().map(|line| line.in_use).sum())
    }

    /// `total_stock - in_use`, truncated toward zero. May be negative.
    pub fn available(&self, graph: &UsageGraph) -> i64 {
        let total = graph.item.total_stock_or_zero() as f64;
        round_quantity(total - self.in_use(graph)).trunc() as i64
    }

    fn occurrences(&self, graph: &UsageGraph, service_id: &EntityId) -> usize {
        graph
            .reservations
            .iter()
            .filter(|r| r.service_id.as_ref() == Some(service_id))
            .filter(|r| match self.counting {
                ReservationCounting::AllStates => true,
                ReservationCounting::OpenOnly => r.status.is_open(),
            })
            .count()
    }
}
