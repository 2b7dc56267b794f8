//! Inventory and booking domain.
//!
//! Business records (items, services, usage records, reservations, clients,
//! payments) plus the pure availability computation. No IO, no HTTP, no storage.

pub mod availability;
pub mod item;
pub mod party;
pub mod reservation;
pub mod service;

pub use availability::{AvailabilityEngine, ReservationCounting, ServiceUsage, UsageGraph};
pub use item::InventoryItem;
pub use party::{Client, Payment};
pub use reservation::{Reservation, ReservationStatus};
pub use service::{ServiceDefinition, UsageRecord};
