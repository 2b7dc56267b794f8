use serde::Deserialize;
use serde_json::{json, Value};

use eventdesk_infra::RecomputeOutcome;

use crate::app::services::{ItemDetail, UsageChange};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub total_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddUsageRequest {
    pub item_id: String,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsageRequest {
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub client_id: Option<String>,
    pub service_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeReservationStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub reservation_id: String,
    /// Cents.
    pub amount: u64,
    pub payment_type: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn availability_to_json(outcome: &RecomputeOutcome) -> Value {
    json!({
        "available_stock": outcome.available(),
        "changed": outcome.changed(),
    })
}

pub fn usage_change_to_json(change: &UsageChange) -> Value {
    json!({
        "usage": change.usage,
        "availability": availability_to_json(&change.availability),
    })
}

pub fn item_detail_to_json(detail: &ItemDetail) -> Value {
    let services = detail
        .breakdown
        .iter()
        .map(|line| {
            json!({
                "service_id": line.service_id,
                "quantity_per_occurrence": line.quantity_per_occurrence,
                "occurrences": line.occurrences,
                "in_use": line.in_use,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "id": detail.item.id,
        "name": detail.item.name,
        "total_stock": detail.item.total_stock,
        "available_stock": detail.item.available_stock,
        "created_at": detail.item.created_at,
        "in_use": detail.in_use,
        "services": services,
    })
}
