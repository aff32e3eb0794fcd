use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable {0}")]
    InvalidVar(&'static str),
}

/// Database credentials; host is optional, the rest must be set.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub listen_host: String,
    pub listen_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db = DbConfig {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            name: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
        };
        let listen_host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let listen_port = match std::env::var("APP_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("APP_PORT"))?,
            Err(_) => 8080,
        };
        Ok(Self {
            db,
            listen_host,
            listen_port,
        })
    }
}

// An empty variable counts as unset.
fn require(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_requires_database_credentials() {
        std::env::set_var("DB_NAME", "cadastro");
        std::env::set_var("DB_USER", "postgres");
        std::env::remove_var("DB_PASSWORD");
        std::env::remove_var("DB_HOST");
        std::env::remove_var("APP_PORT");

        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DB_PASSWORD")));

        std::env::set_var("DB_PASSWORD", "secret");
        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.name, "cadastro");
        assert_eq!(config.listen_port, 8080);
    }

    #[test]
    fn empty_variable_counts_as_unset() {
        std::env::set_var("DB_NAME_EMPTY_TEST", "");
        assert!(require("DB_NAME_EMPTY_TEST").is_err());
    }
}
