//! Process configuration read from the environment (and a `.env` file, if present).

use thiserror::Error;

/// The number of pooled database connections used when `DATABASE_MAX_CONNECTIONS` is unset.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Settings for the server process.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    /// The socket address the HTTP server listens on.
    pub address: String,

    /// The PostgreSQL connection string shared by every handler.
    pub database_url: String,

    /// The maximum number of connections kept in the database pool.
    pub max_connections: u32,
}

/// An error reading [`Config`] from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable was unset or not valid Unicode.
    #[error("environment variable `{name}` should be set")]
    Missing {
        /// The variable's name.
        name: &'static str,

        /// Why the variable couldn't be read.
        #[source]
        source: dotenvy::Error,
    },

    /// A variable was set but couldn't be parsed.
    #[error("environment variable `{name}` is invalid: {value:?}")]
    Invalid {
        /// The variable's name.
        name: &'static str,

        /// The rejected value.
        value: String,
    },
}

impl Config {
    /// Reads the configuration from the process environment, loading `.env` first.
    ///
    /// # Errors
    ///
    /// Fails if `ADDRESS` or `DATABASE_URL` is unset, or `DATABASE_MAX_CONNECTIONS` isn't a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing `.env` file is normal in deployed environments.
        _ = dotenvy::dotenv();

        let max_connections = match dotenvy::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => parse_max_connections(value)?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            address: required("ADDRESS")?,
            database_url: required("DATABASE_URL")?,
            max_connections,
        })
    }
}

/// Reads a variable that must be set.
fn required(name: &'static str) -> Result<String, ConfigError> {
    dotenvy::var(name).map_err(|source| ConfigError::Missing { name, source })
}

/// Parses the pool size, rejecting zero.
fn parse_max_connections(value: String) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(max) if max > 0 => Ok(max),
        _ => Err(ConfigError::Invalid {
            name: "DATABASE_MAX_CONNECTIONS",
            value,
        }),
    }
}
