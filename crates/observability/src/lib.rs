//! Tracing/logging setup shared by every binary in the workspace.

/// Initialize process-wide tracing with the format named by `EVENTDESK_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::LogFormat;
