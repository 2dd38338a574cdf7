//! # Fallback Roster
//!
//! The roster is the pool of identities willing to take random fallback
//! assignments. It lives in an external store that may be missing or down;
//! either way the run continues and fallback assignment becomes a no-op.
//!
//! The lookup is started once before the batch loop ([`RosterHandle::spawn`])
//! and awaited lazily the first time an issue needs it. Every later await
//! shares the same resolved [`RosterSnapshot`].

use crate::error::RosterError;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Default table holding the roster.
pub const DEFAULT_ROSTER_TABLE: &str = "triagers";

/// Result of the roster lookup for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSnapshot {
    Available(BTreeSet<String>),
    Unavailable { reason: String },
}

impl RosterSnapshot {
    /// Uniformly pick one identity not rejected by `is_excluded`. `None` when
    /// unavailable or when no identity is left.
    pub fn pick<R, F>(&self, rng: &mut R, is_excluded: F) -> Option<&str>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        match self {
            Self::Available(identities) => identities
                .iter()
                .map(String::as_str)
                .filter(|&identity| !is_excluded(identity))
                .choose(rng),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Source of eligible fallback identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Fetch the identities currently flagged as active triagers.
    async fn fetch_eligible_identities(&self) -> Result<BTreeSet<String>, RosterError>;
}

/// Lazily awaited, shared roster lookup.
#[derive(Clone)]
pub struct RosterHandle {
    snapshot: Shared<BoxFuture<'static, Arc<RosterSnapshot>>>,
}

impl RosterHandle {
    /// Start the lookup in the background. `None` means no store is
    /// configured and resolves to an unavailable snapshot immediately.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(provider: Option<Arc<dyn RosterProvider>>) -> Self {
        let Some(provider) = provider else {
            return Self::ready(RosterSnapshot::Unavailable {
                reason: RosterError::NotConfigured.to_string(),
            });
        };

        let task = tokio::spawn(async move { provider.fetch_eligible_identities().await });

        let snapshot = async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(RosterError::Task(e.to_string())),
            };

            let snapshot = match result {
                Ok(identities) => {
                    info!(count = identities.len(), "Roster lookup complete");
                    RosterSnapshot::Available(identities)
                }
                Err(e) => {
                    warn!(error = %e, "Roster unavailable, fallback assignment disabled");
                    RosterSnapshot::Unavailable {
                        reason: e.to_string(),
                    }
                }
            };
            Arc::new(snapshot)
        }
        .boxed()
        .shared();

        Self { snapshot }
    }

    /// Handle over an already-resolved snapshot.
    #[must_use]
    pub fn ready(snapshot: RosterSnapshot) -> Self {
        let snapshot = Arc::new(snapshot);
        Self {
            snapshot: async move { snapshot }.boxed().shared(),
        }
    }

    /// Wait for the lookup and return the shared snapshot.
    pub async fn snapshot(&self) -> Arc<RosterSnapshot> {
        self.snapshot.clone().await
    }
}

#[cfg(feature = "postgres")]
pub use postgres::PostgresRoster;

#[cfg(feature = "postgres")]
mod postgres {
    use super::RosterProvider;
    use crate::error::{ConfigError, RosterError};
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tracing::debug;

    /// Roster stored in Postgres as `(identity text, active bool)` rows.
    ///
    /// A connection is opened per lookup and closed before returning,
    /// whether the query succeeded or not.
    #[derive(Debug, Clone)]
    pub struct PostgresRoster {
        url: String,
        table: String,
    }

    impl PostgresRoster {
        /// # Errors
        /// Returns `ConfigError::InvalidRosterTable` unless `table` is a plain
        /// (optionally schema-qualified) SQL identifier.
        pub fn new(url: impl Into<String>, table: &str) -> Result<Self, ConfigError> {
            if !is_identifier(table) {
                return Err(ConfigError::InvalidRosterTable(table.to_string()));
            }
            Ok(Self {
                url: url.into(),
                table: table.to_string(),
            })
        }
    }

    fn is_identifier(name: &str) -> bool {
        let parts: Vec<&str> = name.split('.').collect();
        parts.len() <= 2
            && parts.iter().all(|part| {
                part.chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            })
    }

    #[async_trait]
    impl RosterProvider for PostgresRoster {
        async fn fetch_eligible_identities(&self) -> Result<BTreeSet<String>, RosterError> {
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&self.url)
                .await
                .map_err(|e| RosterError::Connection(e.to_string()))?;

            let sql = format!("SELECT identity FROM {} WHERE active", self.table);
            let rows = sqlx::query_scalar::<_, String>(&sql)
                .fetch_all(&pool)
                .await;
            pool.close().await;

            let identities: BTreeSet<String> = rows
                .map_err(|e| RosterError::Query(e.to_string()))?
                .into_iter()
                .map(|identity| identity.trim().to_string())
                .filter(|identity| !identity.is_empty())
                .collect();

            debug!(count = identities.len(), table = %self.table, "Fetched roster");
            Ok(identities)
        }
    }

}
