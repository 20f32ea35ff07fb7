//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Per-user entity limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Upper bounds on how many active entities one user may own.
///
/// Every ordering group is resequenced with one write per member, so these
/// bounds also cap the write amplification of a single structural change.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitsConfig {
    /// Maximum active accounts per user.
    #[serde(default = "default_max_accounts")]
    pub max_accounts_per_user: u64,
    /// Maximum active transaction categories per user.
    #[serde(default = "default_max_categories")]
    pub max_categories_per_user: u64,
}

fn default_max_accounts() -> u64 {
    100
}

fn default_max_categories() -> u64 {
    200
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_accounts_per_user: default_max_accounts(),
            max_categories_per_user: default_max_categories(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and `TALLY__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LIMITS__MAX_ACCOUNTS_PER_USER", Some("5")),
                ("RUN_MODE", Some("test-does-not-exist")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.limits.max_accounts_per_user, 5);
                assert_eq!(config.limits.max_categories_per_user, 200);
            },
        );
    }

    #[test]
    fn test_default_limits() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_accounts_per_user, 100);
        assert_eq!(limits.max_categories_per_user, 200);
    }
}
