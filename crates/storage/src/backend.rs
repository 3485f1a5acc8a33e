//! Unified storage backend with enum dispatch, plus the settings that pick it.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricetrail_core::{
    DEFAULT_SQLITE_POOL_SIZE, MergeOutcome, Observation, ProductRecord, env_non_empty,
    env_parse_with_default,
};

use crate::error::StorageError;
use crate::traits::{MaintenanceStore, ProductQueryStore, ProductStore};
use crate::types::ProductStats;

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => {
                <crate::SqliteStorage as $trait>::$method(s, $($arg),*).await
            },
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => {
                <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await
            },
        }
    };
}

/// Where product records live, resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    Sqlite { path: PathBuf, pool_size: u32 },
    Postgres { database_url: String },
}

impl StorageSettings {
    /// `DATABASE_URL` selects PostgreSQL; otherwise SQLite at
    /// `PRICETRAIL_DB_PATH` (default `<data_local_dir>/pricetrail/products.db`).
    pub fn from_env() -> Result<Self, StorageError> {
        if let Some(database_url) = env_non_empty("DATABASE_URL") {
            return Ok(Self::Postgres { database_url });
        }
        let path = match env_non_empty("PRICETRAIL_DB_PATH") {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };
        let pool_size = env_parse_with_default("PRICETRAIL_DB_POOL_SIZE", DEFAULT_SQLITE_POOL_SIZE);
        Ok(Self::Sqlite { path, pool_size })
    }

    /// SQLite settings for an explicit path with the default pool size.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite { path: path.into(), pool_size: DEFAULT_SQLITE_POOL_SIZE }
    }
}

fn default_db_path() -> Result<PathBuf, StorageError> {
    dirs::data_local_dir().map(|dir| dir.join("pricetrail").join("products.db")).ok_or_else(|| {
        StorageError::Config("no local data directory, set PRICETRAIL_DB_PATH".to_owned())
    })
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteStorage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    /// Open the backend described by `settings`, running migrations.
    ///
    /// Fails when the settings name a backend this build was compiled without.
    pub async fn connect(settings: &StorageSettings) -> Result<Self, StorageError> {
        match settings {
            StorageSettings::Sqlite { path, pool_size } => {
                Self::connect_sqlite(path.clone(), *pool_size).await
            },
            StorageSettings::Postgres { database_url } => {
                Self::connect_postgres(database_url).await
            },
        }
    }

    #[cfg(feature = "sqlite")]
    async fn connect_sqlite(path: PathBuf, pool_size: u32) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let storage =
            tokio::task::spawn_blocking(move || crate::SqliteStorage::new(&path, pool_size))
                .await??;
        Ok(Self::Sqlite(storage))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn connect_sqlite(_path: PathBuf, _pool_size: u32) -> Result<Self, StorageError> {
        Err(StorageError::Config("built without the sqlite feature".to_owned()))
    }

    #[cfg(feature = "postgres")]
    async fn connect_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect_postgres(_database_url: &str) -> Result<Self, StorageError> {
        Err(StorageError::Config(
            "DATABASE_URL is set but this build lacks the postgres feature".to_owned(),
        ))
    }

    pub const fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

// ── ProductStore ─────────────────────────────────────────────────

#[async_trait]
impl ProductStore for StorageBackend {
    async fn merge_observation(
        &self,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, StorageError> {
        dispatch!(self, ProductStore, merge_observation(obs, now))
    }

    async fn get_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        dispatch!(self, ProductStore, get_by_unique_id(unique_id))
    }

    async fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        dispatch!(self, ProductStore, get_product(platform, product_id))
    }
}

// ── ProductQueryStore ────────────────────────────────────────────

#[async_trait]
impl ProductQueryStore for StorageBackend {
    async fn products_by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        dispatch!(self, ProductQueryStore, products_by_platform(platform, limit))
    }

    async fn products_by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        dispatch!(self, ProductQueryStore, products_by_category(category, limit))
    }

    async fn recent_products(&self, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        dispatch!(self, ProductQueryStore, recent_products(limit))
    }

    async fn trending_products(
        &self,
        min_rating: f64,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        dispatch!(self, ProductQueryStore, trending_products(min_rating, limit))
    }

    async fn price_drops(
        &self,
        threshold_percent: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        dispatch!(self, ProductQueryStore, price_drops(threshold_percent, limit))
    }

    async fn product_stats(&self) -> Result<ProductStats, StorageError> {
        dispatch!(self, ProductQueryStore, product_stats())
    }
}

// ── MaintenanceStore ─────────────────────────────────────────────

#[async_trait]
impl MaintenanceStore for StorageBackend {
    async fn count_products(&self) -> Result<u64, StorageError> {
        dispatch!(self, MaintenanceStore, count_products())
    }

    async fn purge_unpriced(&self) -> Result<u64, StorageError> {
        dispatch!(self, MaintenanceStore, purge_unpriced())
    }

    async fn purge_all(&self) -> Result<u64, StorageError> {
        dispatch!(self, MaintenanceStore, purge_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_settings_use_default_pool_size() {
        let settings = StorageSettings::sqlite("/tmp/pricetrail-test.db");
        assert_eq!(
            settings,
            StorageSettings::Sqlite {
                path: PathBuf::from("/tmp/pricetrail-test.db"),
                pool_size: DEFAULT_SQLITE_POOL_SIZE,
            }
        );
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn postgres_settings_without_feature_fail_before_any_work() {
        let settings =
            StorageSettings::Postgres { database_url: "postgres://localhost/none".to_owned() };
        let err = StorageBackend::connect(&settings).await.unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn connect_creates_missing_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("products.db");
        let backend = StorageBackend::connect(&StorageSettings::sqlite(&path)).await.unwrap();
        assert_eq!(backend.backend_name(), "sqlite");
        assert_eq!(backend.count_products().await.unwrap(), 0);
        assert!(path.exists());
    }
}
