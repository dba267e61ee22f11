//! Configuration loading and representation.
//!
//! Settings come from the process environment. Loading goes through a
//! key→value lookup so tests never have to mutate the real environment.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use cron::Schedule;
use thiserror::Error;

use tribute_core::{ProductionGate, TaskCode};

pub const ENV_APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
pub const ENV_APP_PROFILES_ACTIVE: &str = "APP_PROFILES_ACTIVE";
pub const ENV_TIMEZONE: &str = "CLEANUP_TIMEZONE";
pub const ENV_RETENTION_DAYS: &str = "CLEANUP_LEDGER_RETENTION_DAYS";
pub const ENV_SCHEDULER_ENABLED: &str = "CLEANUP_SCHEDULER_ENABLED";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const ENV_ASSET_ROOT: &str = "ASSET_ROOT";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid cron expression '{value}': {reason}")]
    InvalidCron {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key}: unknown time zone '{value}'")]
    InvalidTimeZone { key: &'static str, value: String },

    #[error("{key}: invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Cron cadence of one cleanup task.
#[derive(Debug, Clone)]
pub struct JobSchedule {
    pub task: TaskCode,
    pub expression: String,
    pub schedule: Schedule,
}

impl JobSchedule {
    /// Environment variable carrying the task's cron expression.
    pub fn env_key(task: TaskCode) -> &'static str {
        match task {
            TaskCode::ReleaseReservedUrls => "CLEANUP_CRON_RESERVED_URLS",
            TaskCode::PurgeMemories => "CLEANUP_CRON_MEMORIES",
            TaskCode::PurgeCondolences => "CLEANUP_CRON_CONDOLENCES",
            TaskCode::PruneJobRuns => "CLEANUP_CRON_LEDGER_RETENTION",
        }
    }

    /// Default cadence: reservations hourly, purges nightly, pruning after them.
    pub fn default_expression(task: TaskCode) -> &'static str {
        match task {
            TaskCode::ReleaseReservedUrls => "0 0 * * * *",
            TaskCode::PurgeMemories => "0 0 2 * * *",
            TaskCode::PurgeCondolences => "0 0 3 * * *",
            TaskCode::PruneJobRuns => "0 30 4 * * *",
        }
    }

    fn parse(task: TaskCode, expression: &str) -> Result<Self, ConfigError> {
        let schedule = Schedule::from_str(expression).map_err(|e| ConfigError::InvalidCron {
            key: Self::env_key(task),
            value: expression.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            task,
            expression: expression.to_string(),
            schedule,
        })
    }
}

/// Static configuration of the cleanup service.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub environment: Option<String>,
    pub active_profiles: Vec<String>,
    pub timezone: Tz,
    pub schedules: BTreeMap<TaskCode, JobSchedule>,
    pub ledger_retention_days: u32,
    pub scheduler_enabled: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub asset_root: Option<PathBuf>,
    pub bind_addr: SocketAddr,
}

impl CleanupConfig {
    pub const DEFAULT_RETENTION_DAYS: u32 = 90;
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    /// Every task may hold a lock connection at once, plus one for ledger
    /// and content queries.
    pub const MIN_MAX_CONNECTIONS: u32 = TaskCode::ALL.len() as u32 + 1;
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:8080";

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timezone = match get(ENV_TIMEZONE) {
            Some(value) => value.parse::<Tz>().map_err(|_| ConfigError::InvalidTimeZone {
                key: ENV_TIMEZONE,
                value,
            })?,
            None => Tz::UTC,
        };

        let mut schedules = BTreeMap::new();
        for task in TaskCode::ALL {
            let expression = get(JobSchedule::env_key(task))
                .unwrap_or_else(|| JobSchedule::default_expression(task).to_string());
            schedules.insert(task, JobSchedule::parse(task, &expression)?);
        }

        let ledger_retention_days = match get(ENV_RETENTION_DAYS) {
            Some(value) => match value.parse::<u32>() {
                Ok(days) if days >= 1 => days,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_RETENTION_DAYS,
                        value,
                        reason: "expected a whole number of days >= 1".to_string(),
                    });
                }
            },
            None => Self::DEFAULT_RETENTION_DAYS,
        };

        let scheduler_enabled = match get(ENV_SCHEDULER_ENABLED) {
            Some(value) => parse_bool(ENV_SCHEDULER_ENABLED, value)?,
            None => true,
        };

        let database_max_connections = match get(ENV_DATABASE_MAX_CONNECTIONS) {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n >= Self::MIN_MAX_CONNECTIONS => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_DATABASE_MAX_CONNECTIONS,
                        value,
                        reason: format!("expected a number >= {}", Self::MIN_MAX_CONNECTIONS),
                    });
                }
            },
            None => Self::DEFAULT_MAX_CONNECTIONS,
        };

        let bind_value = get(ENV_BIND_ADDR).unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: ENV_BIND_ADDR,
                value: bind_value.clone(),
                reason: e.to_string(),
            })?;

        let active_profiles = get(ENV_APP_PROFILES_ACTIVE)
            .map(|v| {
                v.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment: get(ENV_APP_ENVIRONMENT),
            active_profiles,
            timezone,
            schedules,
            ledger_retention_days,
            scheduler_enabled,
            database_url: get(ENV_DATABASE_URL),
            database_max_connections,
            asset_root: get(ENV_ASSET_ROOT).map(PathBuf::from),
            bind_addr,
        })
    }

    pub fn production_gate(&self) -> ProductionGate {
        ProductionGate::new(self.environment.clone(), self.active_profiles.clone())
    }

    pub fn schedule(&self, task: TaskCode) -> Option<&JobSchedule> {
        self.schedules.get(&task)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        // Defaults are valid by construction; an empty lookup cannot fail.
        match Self::from_lookup(|_| None) {
            Ok(config) => config,
            Err(e) => unreachable!("default configuration is invalid: {e}"),
        }
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<CleanupConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CleanupConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_documented_cadences() {
        let config = load(&[]).unwrap();

        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(config.ledger_retention_days, 90);
        assert!(config.scheduler_enabled);
        assert!(config.database_url.is_none());
        assert_eq!(
            config.schedule(TaskCode::ReleaseReservedUrls).unwrap().expression,
            "0 0 * * * *"
        );
        assert_eq!(
            config.schedule(TaskCode::PurgeMemories).unwrap().expression,
            "0 0 2 * * *"
        );
        assert_eq!(config.schedules.len(), TaskCode::ALL.len());
        assert!(!config.production_gate().is_production());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("APP_ENVIRONMENT", "Prod"),
            ("APP_PROFILES_ACTIVE", "metrics, web"),
            ("CLEANUP_TIMEZONE", "Europe/Berlin"),
            ("CLEANUP_CRON_CONDOLENCES", "0 15 1 * * *"),
            ("CLEANUP_LEDGER_RETENTION_DAYS", "30"),
            ("CLEANUP_SCHEDULER_ENABLED", "false"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();

        assert!(config.production_gate().is_production());
        assert_eq!(config.active_profiles, vec!["metrics", "web"]);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(
            config.schedule(TaskCode::PurgeCondolences).unwrap().expression,
            "0 15 1 * * *"
        );
        assert_eq!(config.ledger_retention_days, 30);
        assert!(!config.scheduler_enabled);
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn production_profile_enables_gate() {
        let config = load(&[("APP_PROFILES_ACTIVE", "web,production")]).unwrap();
        assert!(config.production_gate().is_production());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            load(&[("CLEANUP_CRON_MEMORIES", "every night")]),
            Err(ConfigError::InvalidCron { key: "CLEANUP_CRON_MEMORIES", .. })
        ));
        assert!(matches!(
            load(&[("CLEANUP_TIMEZONE", "Mars/Olympus")]),
            Err(ConfigError::InvalidTimeZone { .. })
        ));
        assert!(matches!(
            load(&[("CLEANUP_LEDGER_RETENTION_DAYS", "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            load(&[("CLEANUP_SCHEDULER_ENABLED", "sometimes")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn pool_must_fit_every_lock_plus_one_query() {
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "2")]),
            Err(ConfigError::InvalidValue { key: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(load(&[("DATABASE_MAX_CONNECTIONS", "4")]).is_err());

        let config = load(&[("DATABASE_MAX_CONNECTIONS", "5")]).unwrap();
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(CleanupConfig::MIN_MAX_CONNECTIONS as usize, TaskCode::ALL.len() + 1);
        assert!(CleanupConfig::DEFAULT_MAX_CONNECTIONS >= CleanupConfig::MIN_MAX_CONNECTIONS);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("CLEANUP_TIMEZONE", "  "), ("CLEANUP_CRON_MEMORIES", "")]).unwrap();
        assert_eq!(config.timezone, Tz::UTC);
        assert_eq!(
            config.schedule(TaskCode::PurgeMemories).unwrap().expression,
            "0 0 2 * * *"
        );
    }
}
