//! Startup recovery: seed allocator counters from persisted identifiers.
//!
//! Counters are never stored; the identifiers already written are the source of
//! truth. Running the scan before any allocation traffic keeps freshly generated ids
//! from colliding with historical rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use eventdesk_core::EntityKind;

use crate::allocator::{CounterKey, IdAllocator, MAX_SEQUENCE};
use crate::prefix::prefix_for;

/// Entity types scanned by default.
pub const DEFAULT_SCANNED_KINDS: [EntityKind; 9] = [
    EntityKind::Client,
    EntityKind::User,
    EntityKind::Organizer,
    EntityKind::Reservation,
    EntityKind::Payment,
    EntityKind::PaymentType,
    EntityKind::Item,
    EntityKind::ServiceDetail,
    EntityKind::ItemList,
];

/// Failure to read identifiers for one entity type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("no store for entity type: {0}")]
    UnknownEntityType(String),

    #[error("identifier source unavailable: {0}")]
    Unavailable(String),

    /// A stored id carries a sequence the allocator cannot continue from.
    #[error("stored sequence {0} exceeds the allocator limit")]
    SequenceOutOfRange(u64),
}

/// Read side of the persistence layer used by the scan.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// Every stored identifier for one entity type.
    async fn list_identifiers(&self, entity_type: &str) -> Result<Vec<String>, ScanError>;
}

#[async_trait]
impl<S> IdentifierSource for Arc<S>
where
    S: IdentifierSource + ?Sized,
{
    async fn list_identifiers(&self, entity_type: &str) -> Result<Vec<String>, ScanError> {
        (**self).list_identifiers(entity_type).await
    }
}

/// What to do when one entity type cannot be scanned.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Skip the type (no seed) and keep going.
    #[default]
    Lenient,
    /// Abort recovery when a source is unavailable or holds an out-of-range
    /// sequence; nothing is loaded.
    ///
    /// Types the source has no storage for hold no ids to collide with and are
    /// still skipped.
    Strict,
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("identifier scan failed for {entity_type}: {source}")]
    ScanFailed {
        entity_type: String,
        #[source]
        source: ScanError,
    },
}

/// Outcome of one recovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoverySummary {
    /// Seed value per counter key, as handed to the allocator.
    pub seeded: BTreeMap<CounterKey, u64>,
    /// Entity types whose scan failed and contributed nothing.
    pub failed: Vec<(String, ScanError)>,
}

/// Highest sequence among `ids` carrying `prefix`.
///
/// Ids with another prefix or a non-numeric sequence are ignored.
pub fn max_sequence<'a>(prefix: &str, ids: impl IntoIterator<Item = &'a str>) -> u64 {
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|rest| rest.split('-').next())
        .filter_map(|seq| seq.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Seeds an [`IdAllocator`] from an [`IdentifierSource`].
pub struct RecoveryScanner<S> {
    allocator: Arc<IdAllocator>,
    source: S,
    entity_types: Vec<String>,
    policy: RecoveryPolicy,
}

impl<S> RecoveryScanner<S>
where
    S: IdentifierSource,
{
    pub fn new(allocator: Arc<IdAllocator>, source: S) -> Self {
        Self {
            allocator,
            source,
            entity_types: DEFAULT_SCANNED_KINDS.iter().map(|k| k.as_str().to_string()).collect(),
            policy: RecoveryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the scanned entity types.
    pub fn with_entity_types<I, T>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.entity_types = entity_types.into_iter().map(Into::into).collect();
        self
    }

    /// Scan every configured entity type and load the maxima into the allocator.
    ///
    /// Every seed is keyed on the *current* year, whatever year the stored ids carry.
    pub async fn initialize_counters(&self) -> Result<RecoverySummary, RecoveryError> {
        let year = self.allocator.clock().current_year();
        let mut summary = RecoverySummary::default();

        for entity_type in &self.entity_types {
            let scanned = self.source.list_identifiers(entity_type).await.and_then(|ids| {
                let max = max_sequence(&prefix_for(entity_type), ids.iter().map(String::as_str));
                tracing::debug!(entity_type = %entity_type, scanned = ids.len(), max, "identifier scan complete");
                if max > MAX_SEQUENCE {
                    return Err(ScanError::SequenceOutOfRange(max));
                }
                Ok(max)
            });

            match scanned {
                Ok(0) => {}
                Ok(max) => {
                    summary.seeded.insert(CounterKey::new(entity_type.clone(), year), max);
                }
                Err(source) => {
                    let fatal = !matches!(source, ScanError::UnknownEntityType(_));
                    if fatal && self.policy == RecoveryPolicy::Strict {
                        return Err(RecoveryError::ScanFailed {
                            entity_type: entity_type.clone(),
                            source,
                        });
                    }
                    tracing::warn!(
                        entity_type = %entity_type,
                        error = %source,
                        "identifier scan failed; counter not seeded"
                    );
                    summary.failed.push((entity_type.clone(), source));
                }
            }
        }

        self.allocator.load_counters(summary.seeded.clone());
        tracing::info!(
            seeded = summary.seeded.len(),
            failed = summary.failed.len(),
            year,
            "allocator counters recovered"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::clock::FixedClock;

    #[derive(Default)]
    struct FakeSource {
        ids: HashMap<String, Result<Vec<String>, ScanError>>,
    }

    impl FakeSource {
        fn with(mut self, entity_type: &str, ids: &[&str]) -> Self {
            self.ids.insert(
                entity_type.to_string(),
                Ok(ids.iter().map(|s| s.to_string()).collect()),
            );
            self
        }

        fn failing(mut self, entity_type: &str) -> Self {
            self.ids.insert(
                entity_type.to_string(),
                Err(ScanError::Unavailable("connection refused".to_string())),
            );
            self
        }
    }

    #[async_trait]
    impl IdentifierSource for FakeSource {
        async fn list_identifiers(&self, entity_type: &str) -> Result<Vec<String>, ScanError> {
            self.ids
                .get(entity_type)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn allocator(year: i32) -> Arc<IdAllocator> {
        Arc::new(IdAllocator::with_clock(Arc::new(FixedClock(year))))
    }

    #[test]
    fn max_sequence_skips_foreign_and_malformed_ids() {
        let ids = ["REA00003-2025", "REA00007-2025", "PGO00099-2025", "REAxx-2025", "REA-2025"];
        assert_eq!(max_sequence("REA", ids), 7);
        assert_eq!(max_sequence("CLE", ids), 0);
    }

    #[test]
    fn max_sequence_ignores_year_component() {
        let ids = ["REA00012-2023", "REA00004-2025"];
        assert_eq!(max_sequence("REA", ids), 12);
    }

    #[tokio::test]
    async fn recovered_counter_continues_after_max() {
        let ids = allocator(2025);
        let source = FakeSource::default().with("reserva", &["REA00003-2025", "REA00007-2025"]);

        let summary = RecoveryScanner::new(ids.clone(), source)
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(summary.seeded.get(&CounterKey::new("reserva", 2025)), Some(&7));
        assert_eq!(ids.generate("reserva").as_str(), "REA00008-2025");
    }

    #[tokio::test]
    async fn empty_types_are_not_seeded() {
        let ids = allocator(2025);
        let summary = RecoveryScanner::new(ids.clone(), FakeSource::default())
            .initialize_counters()
            .await
            .unwrap();

        assert!(summary.seeded.is_empty());
        assert_eq!(ids.peek("cliente", 2025), None);
    }

    #[tokio::test]
    async fn lenient_policy_swallows_per_type_failures() {
        let ids = allocator(2025);
        let source = FakeSource::default()
            .failing("cliente")
            .with("pago", &["PGO00010-2025"]);

        let summary = RecoveryScanner::new(ids.clone(), source)
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "cliente");
        assert_eq!(ids.generate("pago").as_str(), "PGO00011-2025");
        assert_eq!(ids.generate("cliente").as_str(), "CLE00001-2025");
    }

    #[tokio::test]
    async fn strict_policy_aborts_without_loading() {
        let ids = allocator(2025);
        let source = FakeSource::default()
            .with("cliente", &["CLE00005-2025"])
            .failing("reserva");

        let err = RecoveryScanner::new(ids.clone(), source)
            .with_policy(RecoveryPolicy::Strict)
            .initialize_counters()
            .await
            .unwrap_err();

        assert!(matches!(err, RecoveryError::ScanFailed { ref entity_type, .. } if entity_type == "reserva"));
        assert_eq!(ids.peek("cliente", 2025), None);
    }

    #[tokio::test]
    async fn strict_policy_skips_types_without_storage() {
        let ids = allocator(2025);
        let mut source = FakeSource::default().with("cliente", &["CLE00005-2025"]);
        source.ids.insert(
            "usuario".to_string(),
            Err(ScanError::UnknownEntityType("usuario".to_string())),
        );

        let summary = RecoveryScanner::new(ids.clone(), source)
            .with_policy(RecoveryPolicy::Strict)
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(ids.peek("cliente", 2025), Some(5));
    }

    #[tokio::test]
    async fn oversized_sequence_is_reported_not_seeded() {
        let ids = allocator(2025);
        let source = FakeSource::default()
            .with("reserva", &["REA00004-2025", "REA18446744073709551615-2025"])
            .with("pago", &["PGO00002-2025"]);

        let summary = RecoveryScanner::new(ids.clone(), source)
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(
            summary.failed,
            vec![("reserva".to_string(), ScanError::SequenceOutOfRange(u64::MAX))]
        );
        assert_eq!(ids.peek("reserva", 2025), None);
        assert_eq!(ids.generate("reserva").as_str(), "REA00001-2025");
        assert_eq!(ids.generate("pago").as_str(), "PGO00003-2025");
    }

    #[tokio::test]
    async fn strict_policy_aborts_on_oversized_sequence() {
        let ids = allocator(2025);
        let source = FakeSource::default().with("reserva", &["REA18446744073709551615-2025"]);

        let err = RecoveryScanner::new(ids.clone(), source)
            .with_policy(RecoveryPolicy::Strict)
            .initialize_counters()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RecoveryError::ScanFailed { source: ScanError::SequenceOutOfRange(_), .. }
        ));
    }

    #[tokio::test]
    async fn recovery_never_lowers_live_counters() {
        let ids = allocator(2025);
        for _ in 0..20 {
            ids.generate("reserva");
        }
        let source = FakeSource::default().with("reserva", &["REA00007-2025"]);

        RecoveryScanner::new(ids.clone(), source)
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(ids.generate("reserva").as_str(), "REA00021-2025");
    }

    #[tokio::test]
    async fn custom_entity_types_use_derived_prefix() {
        let ids = allocator(2025);
        let source = FakeSource::default().with("evento", &["ENO00002-2025", "EVT00050-2025"]);

        RecoveryScanner::new(ids.clone(), source)
            .with_entity_types(["evento"])
            .initialize_counters()
            .await
            .unwrap();

        assert_eq!(ids.generate("evento").as_str(), "ENO00003-2025");
    }
}
