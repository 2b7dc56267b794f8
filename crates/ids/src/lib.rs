//! Identifier allocation for business entities.
//!
//! - [`IdAllocator`]: mutex-guarded `(entity type, year)` counters that mint
//!   `PREFIX00001-YYYY` identifiers.
//! - [`RecoveryScanner`]: seeds those counters from persisted identifiers at startup.

pub mod allocator;
pub mod clock;
pub mod prefix;
pub mod recovery;

pub use allocator::{CounterKey, IdAllocator, MAX_SEQUENCE};
pub use clock::{Clock, FixedClock, SystemClock};
pub use prefix::{prefix_for, GENERIC_PREFIX};
pub use recovery::{
    max_sequence, IdentifierSource, RecoveryError, RecoveryPolicy, RecoveryScanner, RecoverySummary,
    ScanError, DEFAULT_SCANNED_KINDS,
};
