//! Configuration loading and representation.
//!
//! Read once from the environment at startup:
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `EVENTDESK_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `DATABASE_URL` | unset | Postgres catalog when set, in-memory otherwise |
//! | `EVENTDESK_RECOVERY_POLICY` | `lenient` | `lenient` skips unreadable entity types at startup, `strict` refuses to start |
//! | `EVENTDESK_COUNT_CLOSED_RESERVATIONS` | `true` | `false` stops cancelled/finished reservations from consuming stock |

use std::net::SocketAddr;

use thiserror::Error;

use eventdesk_ids::RecoveryPolicy;
use eventdesk_inventory::ReservationCounting;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub recovery_policy: RecoveryPolicy,
    pub reservation_counting: ReservationCounting,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests, embedding).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("EVENTDESK_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("EVENTDESK_BIND_ADDR", e.to_string()))?;

        let recovery_policy = match get("EVENTDESK_RECOVERY_POLICY").as_deref().map(str::to_lowercase) {
            None => RecoveryPolicy::default(),
            Some(v) if v == "lenient" => RecoveryPolicy::Lenient,
            Some(v) if v == "strict" => RecoveryPolicy::Strict,
            Some(v) => {
                return Err(ConfigError::invalid(
                    "EVENTDESK_RECOVERY_POLICY",
                    format!("'{v}' (expected lenient or strict)"),
                ));
            }
        };

        let reservation_counting = match get("EVENTDESK_COUNT_CLOSED_RESERVATIONS") {
            None => ReservationCounting::AllStates,
            Some(v) => match parse_bool(&v) {
                Some(true) => ReservationCounting::AllStates,
                Some(false) => ReservationCounting::OpenOnly,
                None => {
                    return Err(ConfigError::invalid(
                        "EVENTDESK_COUNT_CLOSED_RESERVATIONS",
                        format!("'{v}' (expected true or false)"),
                    ));
                }
            },
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            recovery_policy,
            reservation_counting,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
