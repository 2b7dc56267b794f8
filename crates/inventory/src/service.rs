use serde::{Deserialize, Serialize};

use eventdesk_core::{DomainError, DomainResult, Entity, EntityId, EntityKind};

/// A sellable service composed of inventory usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
}

impl ServiceDefinition {
    pub fn new(id: EntityId, name: impl Into<String>, description: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self { id, name, description })
    }
}

impl Entity for ServiceDefinition {
    const KIND: EntityKind = EntityKind::ServiceDetail;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Links `quantity` units of one item to one service (per occurrence of the service).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: EntityId,
    pub item_id: EntityId,
    /// Owning service. Records whose service is gone are ignored by availability.
    pub service_id: Option<EntityId>,
    /// Fractional quantities are allowed (e.g. 1.5 units).
    pub quantity: f64,
}

impl UsageRecord {
    pub fn new(
        id: EntityId,
        item_id: EntityId,
        service_id: Option<EntityId>,
        quantity: f64,
    ) -> DomainResult<Self> {
        validate_quantity(quantity)?;
        Ok(Self {
            id,
            item_id,
            service_id,
            quantity,
        })
    }

    pub fn set_quantity(&mut self, quantity: f64) -> DomainResult<()> {
        validate_quantity(quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

impl Entity for UsageRecord {
    const KIND: EntityKind = EntityKind::ItemList;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

fn validate_quantity(quantity: f64) -> DomainResult<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(DomainError::validation("quantity must be a finite, non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (EntityId, EntityId, EntityId) {
        (
            EntityId::format("LIT", 1, 2025),
            EntityId::format("ITM", 1, 2025),
            EntityId::format("DSV", 1, 2025),
        )
    }

    #[test]
    fn usage_accepts_fractional_quantity() {
        let (id, item, service) = ids();
        let usage = UsageRecord::new(id, item, Some(service), 1.5).unwrap();
        assert_eq!(usage.quantity, 1.5);
    }

    #[test]
    fn usage_rejects_negative_and_nan() {
        let (id, item, service) = ids();
        assert!(UsageRecord::new(id.clone(), item.clone(), Some(service.clone()), -1.0).is_err());
        assert!(UsageRecord::new(id, item, Some(service), f64::NAN).is_err());
    }

    #[test]
    fn set_quantity_validates() {
        let (id, item, service) = ids();
        let mut usage = UsageRecord::new(id, item, Some(service), 2.0).unwrap();
        usage.set_quantity(4.0).unwrap();
        assert_eq!(usage.quantity, 4.0);
        assert!(usage.set_quantity(f64::INFINITY).is_err());
        assert_eq!(usage.quantity, 4.0);
    }

    #[test]
    fn service_requires_name() {
        let (_, _, service) = ids();
        assert!(ServiceDefinition::new(service, "", None).is_err());
    }
}
