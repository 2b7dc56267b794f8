//! Clients and payments: plain records whose only stake here is their identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventdesk_core::{DomainError, DomainResult, Entity, EntityId, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
}

impl Client {
    pub fn new(id: EntityId, name: impl Into<String>, email: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self { id, name, email })
    }
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Client;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: EntityId,
    pub reservation_id: EntityId,
    /// Amount in the smallest currency unit (e.g. cents).
    pub amount: u64,
    pub payment_type: String,
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        id: EntityId,
        reservation_id: EntityId,
        amount: u64,
        payment_type: impl Into<String>,
        paid_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount == 0 {
            return Err(DomainError::validation("amount must be greater than zero"));
        }
        Ok(Self {
            id,
            reservation_id,
            amount,
            payment_type: payment_type.into(),
            paid_at,
        })
    }
}

impl Entity for Payment {
    const KIND: EntityKind = EntityKind::Payment;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
