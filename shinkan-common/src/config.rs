//! Configuration loading and database path resolution

use crate::enums::ListService;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable consulted for the database path
pub const DATABASE_ENV_VAR: &str = "SHINKAN_DATABASE";

/// Optional on-disk configuration
///
/// Loaded from `<config dir>/shinkan/config.toml` when present. Every field
/// is optional; missing fields fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<String>,
    pub source_priority: Option<Vec<String>>,
}

impl FileConfig {
    /// Load the config file if one exists, otherwise return defaults.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
            }
            _ => Ok(FileConfig::default()),
        }
    }
}

/// Database path resolution priority order:
/// 1. Explicit argument (highest priority)
/// 2. `SHINKAN_DATABASE` environment variable
/// 3. `database` key in the TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: explicit argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    let config = FileConfig::load()?;
    if let Some(database) = config.database {
        return Ok(PathBuf::from(database));
    }

    // Priority 4: OS-dependent default
    Ok(default_database_path())
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shinkan").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shinkan"))
        .unwrap_or_else(|| PathBuf::from("./shinkan_data"))
        .join("shinkan.db")
}

/// Ranked trust order between catalog services.
///
/// When reconciliation has to pick a surviving media item out of two that
/// turned out to describe the same title, the item reachable through the
/// best-ranked service wins. Operators can re-rank services through the
/// `source_priority` config key without code changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePriority {
    order: Vec<ListService>,
}

impl Default for SourcePriority {
    fn default() -> Self {
        Self {
            order: vec![
                ListService::Anilist,
                ListService::Myanimelist,
                ListService::Mangadex,
                ListService::Kitsu,
                ListService::AnimePlanet,
            ],
        }
    }
}

impl SourcePriority {
    /// Build a ranking from an explicit service order.
    ///
    /// Services left out of `order` rank below every listed one, tied with
    /// each other.
    pub fn new(order: Vec<ListService>) -> Self {
        Self { order }
    }

    /// Build a ranking from config-file service codes.
    pub fn from_codes(codes: &[String]) -> Result<Self> {
        let mut order = Vec::with_capacity(codes.len());
        for code in codes {
            let service = ListService::from_str(code)
                .map_err(|_| Error::Config(format!("unknown service in source_priority: {code}")))?;
            if !order.contains(&service) {
                order.push(service);
            }
        }
        Ok(Self { order })
    }

    /// Load the ranking from the config file, falling back to the default.
    pub fn load() -> Result<Self> {
        match FileConfig::load()?.source_priority {
            Some(codes) => Self::from_codes(&codes),
            None => Ok(Self::default()),
        }
    }

    /// Rank of a single service; lower is more trusted.
    pub fn rank(&self, service: ListService) -> usize {
        self.order
            .iter()
            .position(|s| *s == service)
            .unwrap_or(self.order.len())
    }

    /// Best (lowest) rank among a set of services.
    pub fn best_rank<I>(&self, services: I) -> usize
    where
        I: IntoIterator<Item = ListService>,
    {
        services
            .into_iter()
            .map(|s| self.rank(s))
            .min()
            .unwrap_or(self.order.len())
    }
}
