//! Human-readable business identifiers (`REA00007-2025`).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Width the sequence part is zero-padded to. Larger values widen the id.
pub const SEQUENCE_WIDTH: usize = 5;

/// Length, in characters, of every generated prefix.
pub const PREFIX_LEN: usize = 3;

/// Namespace for name-based UUIDs derived from string identifiers.
///
/// Stable forever: changing it would orphan every row keyed by a derived UUID.
const LEGACY_UUID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_93c2_5b7e_4a0c_9e3f_1c2d_7a88_04b1);

/// Entity types that own a dedicated prefix.
///
/// The string form is the entity type name used as counter key (and by callers of
/// the allocator). Anything outside this table gets a derived prefix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Client,
    User,
    Organizer,
    Reservation,
    Payment,
    PaymentType,
    Item,
    ServiceDetail,
    ItemList,
    ServiceList,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Client,
        EntityKind::User,
        EntityKind::Organizer,
        EntityKind::Reservation,
        EntityKind::Payment,
        EntityKind::PaymentType,
        EntityKind::Item,
        EntityKind::ServiceDetail,
        EntityKind::ItemList,
        EntityKind::ServiceList,
    ];

    /// Entity type name (counter key component).
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Client => "cliente",
            EntityKind::User => "usuario",
            EntityKind::Organizer => "organizador",
            EntityKind::Reservation => "reserva",
            EntityKind::Payment => "pago",
            EntityKind::PaymentType => "tipoPago",
            EntityKind::Item => "item",
            EntityKind::ServiceDetail => "detalleServicio",
            EntityKind::ItemList => "listaItems",
            EntityKind::ServiceList => "listaServicios",
        }
    }

    /// Fixed 3-letter prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Client => "CLE",
            EntityKind::User => "USR",
            EntityKind::Organizer => "ORG",
            EntityKind::Reservation => "REA",
            EntityKind::Payment => "PGO",
            EntityKind::PaymentType => "TPG",
            EntityKind::Item => "ITM",
            EntityKind::ServiceDetail => "DSV",
            EntityKind::ItemList => "LIT",
            EntityKind::ServiceList => "LSV",
        }
    }

    /// Exact (case-sensitive) lookup by entity type name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated business identifier: `PREFIX + seq(5) + "-" + year`.
///
/// Stored and transported as a plain string. Parsing accepts any three-character
/// prefix (digits included) so ids minted under derived prefixes round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Format a new identifier from its parts.
    pub fn format(prefix: &str, sequence: u64, year: i32) -> Self {
        Self(format!("{prefix}{sequence:0width$}-{year}", width = SEQUENCE_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split into `(prefix, sequence, year)`.
    pub fn parts(&self) -> Result<(&str, u64, i32), DomainError> {
        let (head, year) = self
            .0
            .split_once('-')
            .ok_or_else(|| DomainError::invalid_id(format!("{}: missing year separator", self.0)))?;
        let (prefix, seq) = split_prefix(head);
        if seq.is_empty() {
            return Err(DomainError::invalid_id(format!("{}: missing sequence", self.0)));
        }
        if prefix.is_empty() {
            return Err(DomainError::invalid_id(format!("{}: missing prefix", self.0)));
        }
        let sequence = seq
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("{}: sequence: {e}", self.0)))?;
        let year = year
            .parse::<i32>()
            .map_err(|e| DomainError::invalid_id(format!("{}: year: {e}", self.0)))?;
        Ok((prefix, sequence, year))
    }

    /// Name-based UUID (v5) for tables keyed by a binary identifier.
    ///
    /// Deterministic: the same string always maps to the same UUID, so existing
    /// binary-keyed rows can be re-keyed to their string id and back.
    pub fn legacy_uuid(&self) -> Uuid {
        Uuid::new_v5(&LEGACY_UUID_NAMESPACE, self.0.as_bytes())
    }
}

/// Split `PREFIX` from the sequence digits.
///
/// Generated prefixes are three characters and may contain digits (`a1` derives
/// `A1X`), so a three-character prefix followed by a full-width run of digits wins.
/// Otherwise the sequence is the trailing run of digits.
fn split_prefix(head: &str) -> (&str, &str) {
    if let Some((at, _)) = head.char_indices().nth(PREFIX_LEN) {
        let (prefix, seq) = head.split_at(at);
        let prefix_is_numeric = prefix.chars().all(|c| c.is_ascii_digit());
        if !prefix_is_numeric && seq.len() >= SEQUENCE_WIDTH && seq.bytes().all(|b| b.is_ascii_digit()) {
            return (prefix, seq);
        }
    }
    let digits_at = head
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    head.split_at(digits_at)
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.trim().to_string());
        id.parts()?;
        Ok(id)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
