//! Environment configuration for the demo binary.

use registrar_core::config::{DuplicateCreationPolicy, ReplayMode, StoreConfig};

use crate::error::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which storage backend the demo runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local storage; nothing survives the run.
    Memory,
    /// PostgreSQL reached through a connection pool.
    Postgres {
        /// Connection string.
        database_url: String,
        /// Pool size.
        max_connections: u32,
    },
}

impl BackendKind {
    /// Short name of the backend, safe to log.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

/// Everything the demo reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Selected backend.
    pub backend: BackendKind,
    /// Store behaviour.
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value if set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let backend = match lookup("REGISTRAR_BACKEND").as_deref().map(str::trim) {
            None | Some("memory") => BackendKind::Memory,
            Some("postgres") => {
                let database_url = lookup("DATABASE_URL").ok_or_else(|| {
                    AppError::Config(
                        "DATABASE_URL environment variable must be set for the postgres backend"
                            .to_string(),
                    )
                })?;
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => raw.trim().parse().map_err(|e| {
                        AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                BackendKind::Postgres {
                    database_url,
                    max_connections,
                }
            }
            Some(other) => {
                return Err(AppError::Config(format!(
                    "REGISTRAR_BACKEND must be `memory` or `postgres`, got `{other}`"
                )));
            }
        };

        let mut store = StoreConfig::default();
        if let Some(raw) = lookup("REGISTRAR_REPLAY_MODE") {
            store = store.with_replay_mode(raw.parse::<ReplayMode>()?);
        }
        if let Some(raw) = lookup("REGISTRAR_DUPLICATE_CREATION") {
            store = store.with_duplicate_creation(raw.parse::<DuplicateCreationPolicy>()?);
        }
        if let Some(raw) = lookup("REGISTRAR_CONFLICT_RETRIES") {
            let retries = raw.trim().parse().map_err(|e| {
                AppError::Config(format!("REGISTRAR_CONFLICT_RETRIES must be a valid u32: {e}"))
            })?;
            store = store.with_max_conflict_retries(retries);
        }
        if let Some(raw) = lookup("REGISTRAR_PROJECTION_CACHE") {
            let enabled = raw.trim().parse().map_err(|e| {
                AppError::Config(format!(
                    "REGISTRAR_PROJECTION_CACHE must be `true` or `false`: {e}"
                ))
            })?;
            store = store.with_cache_projections(enabled);
        }

        Ok(Self { backend, store })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_memory_backend_and_default_store() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_postgres_backend_reads_database_settings() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("REGISTRAR_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/registrar"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();

        assert_eq!(
            config.backend,
            BackendKind::Postgres {
                database_url: "postgres://localhost/registrar".to_owned(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        let result = AppConfig::from_lookup(lookup_from(&[("REGISTRAR_BACKEND", "postgres")]));

        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("DATABASE_URL")),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_store_settings_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("REGISTRAR_REPLAY_MODE", "strict"),
            ("REGISTRAR_DUPLICATE_CREATION", "reject"),
            ("REGISTRAR_CONFLICT_RETRIES", "0"),
            ("REGISTRAR_PROJECTION_CACHE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.store.replay_mode, ReplayMode::Strict);
        assert_eq!(
            config.store.duplicate_creation,
            DuplicateCreationPolicy::Reject
        );
        assert_eq!(config.store.max_conflict_retries, 0);
        assert!(!config.store.cache_projections);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("REGISTRAR_BACKEND", "dynamo")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_replay_mode_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("REGISTRAR_REPLAY_MODE", "loose")]));

        match result {
            Err(AppError::Config(msg)) => {
                assert_eq!(msg, "invalid value `loose` for replay mode");
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }
}
