//! Process-wide identifier allocator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eventdesk_core::EntityId;

use crate::clock::{Clock, SystemClock};
use crate::prefix::prefix_for;

/// One independent sequence: entity type name + calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterKey {
    pub entity_type: String,
    pub year: i32,
}

impl CounterKey {
    pub fn new(entity_type: impl Into<String>, year: i32) -> Self {
        Self {
            entity_type: entity_type.into(),
            year,
        }
    }
}

impl core::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.year)
    }
}

/// Highest sequence number issued or accepted as a seed.
pub const MAX_SEQUENCE: u64 = 999_999_999_999;

/// Mints `PREFIX00001-YYYY` identifiers.
///
/// ## Concurrency
///
/// A single mutex guards the whole counter table; the lookup, increment and read of
/// one `generate` call happen under it, so concurrent callers for the same key always
/// observe distinct, gap-free sequence numbers.
///
/// ## Lifetime
///
/// Counters are never persisted. After a restart they are rebuilt from stored
/// identifiers (see [`crate::RecoveryScanner`]) through [`IdAllocator::load_counters`].
/// Construct one allocator per process and share it (`Arc<IdAllocator>`).
pub struct IdAllocator {
    counters: Mutex<HashMap<CounterKey, u64>>,
    clock: Arc<dyn Clock>,
}

impl IdAllocator {
    /// Allocator keyed on the UTC wall-clock year.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Generate the next identifier for `entity_type`.
    ///
    /// Unknown or blank entity types fall back to a derived or generic prefix; this
    /// never fails. A counter that reaches [`MAX_SEQUENCE`] stays there and every
    /// further call logs an error.
    pub fn generate(&self, entity_type: &str) -> EntityId {
        let prefix = prefix_for(entity_type);
        let year = self.clock.current_year();
        let key = CounterKey::new(entity_type, year);

        let sequence = {
            let mut counters = self.lock();
            let counter = counters.entry(key).or_insert(0);
            match counter.checked_add(1).filter(|next| *next <= MAX_SEQUENCE) {
                Some(next) => {
                    *counter = next;
                    next
                }
                None => {
                    tracing::error!(entity_type, year, sequence = *counter, "identifier sequence exhausted");
                    *counter
                }
            }
        };

        let id = EntityId::format(&prefix, sequence, year);
        tracing::debug!(entity_type, id = %id, "allocated identifier");
        id
    }

    /// Current value of one counter, if it has been touched.
    pub fn peek(&self, entity_type: &str, year: i32) -> Option<u64> {
        self.lock().get(&CounterKey::new(entity_type, year)).copied()
    }

    /// Seed counters, raising but never lowering existing values.
    ///
    /// Seeds above [`MAX_SEQUENCE`] are dropped (and logged).
    pub fn load_counters(&self, initial: impl IntoIterator<Item = (CounterKey, u64)>) {
        let mut counters = self.lock();
        for (key, value) in initial {
            if value > MAX_SEQUENCE {
                tracing::error!(counter = %key, value, "seed above sequence limit ignored");
                continue;
            }
            let counter = counters.entry(key).or_insert(value);
            if value > *counter {
                *counter = value;
            }
        }
    }

    /// Drop every counter (tests/support only).
    pub fn reset(&self) {
        self.lock().clear();
    }

    // The table stays consistent across a panicking holder (each critical section is
    // a single entry update), so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, HashMap<CounterKey, u64>> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdAllocator")
            .field("counters", &self.lock().len())
            .finish_non_exhaustive()
    }
}
