use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventdesk_core::{DomainError, DomainResult, Entity, EntityId, EntityKind};

/// Reservation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Finished,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Finished => "finished",
        }
    }

    /// Still holding its service (pending or confirmed).
    pub fn is_open(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Allowed lifecycle moves. Closed reservations are terminal.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Pending, Confirmed | Cancelled) => true,
            (Confirmed, Cancelled | Finished) => true,
            _ => false,
        }
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "finished" => Ok(ReservationStatus::Finished),
            other => Err(DomainError::validation(format!(
                "unknown reservation status '{other}' (expected pending, confirmed, cancelled, finished)"
            ))),
        }
    }
}

/// A booking of (at most) one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: EntityId,
    pub client_id: Option<EntityId>,
    pub service_id: Option<EntityId>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// New pending reservation.
    pub fn new(
        id: EntityId,
        client_id: Option<EntityId>,
        service_id: Option<EntityId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client_id,
            service_id,
            status: ReservationStatus::Pending,
            created_at,
        }
    }

    pub fn transition(&mut self, next: ReservationStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "reservation {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

impl Entity for Reservation {
    const KIND: EntityKind = EntityKind::Reservation;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
