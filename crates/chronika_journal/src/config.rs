use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chronika_core::{ChronikaError, ChronikaResult, EventKind};

use crate::replay::ReplayOptions;

const DEFAULT_CONFIG_NAME: &str = "chronika.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

/// Replay tuning. `tick_micros` is the smallest representable increment of
/// the storage backend (1 for microsecond precision, 1_000_000 for
/// second-precision stores). `noted_at_overrides` lists event kinds for
/// which the secondary time source wins over the primary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub tick_micros: Option<i64>,
    pub max_parallel: Option<usize>,
    pub noted_at_overrides: Option<Vec<EventKind>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub replay: Option<ReplayConfig>,
}

impl JournalConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            replay: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> ChronikaResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| ChronikaError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| ChronikaError::storage(format!("read config: {err}")))?;
            let config: JournalConfig = serde_json::from_str(&raw)
                .map_err(|err| ChronikaError::invalid(err.to_string()))?;
            return Ok(config);
        }
        let default = JournalConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| ChronikaError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| ChronikaError::storage(format!("write config: {err}")))?;
        Ok(default)
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> ChronikaResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "chronika.sqlite".to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(ChronikaError::invalid("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Some(url.as_str()),
        }
    }

    pub fn replay_options(&self) -> ReplayOptions {
        let mut options = ReplayOptions::default();
        if let Some(replay) = &self.replay {
            if let Some(tick) = replay.tick_micros {
                options.tick_micros = tick;
            }
            if let Some(parallel) = replay.max_parallel {
                options.max_parallel = parallel.max(1);
            }
            if let Some(overrides) = &replay.noted_at_overrides {
                options.noted_at_overrides = overrides.clone();
            }
        }
        options
    }
}
