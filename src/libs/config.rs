//! Connection settings.

use serde::{Deserialize, Serialize};

use crate::libs::error::{Error, Result};

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// `host:port` of the server.
    pub address: String,
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl ConnectOptions {
    pub fn new(
        address: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    pub fn connection_url(&self) -> String {
        let credentials = if self.password.is_empty() {
            self.user.clone()
        } else {
            format!("{}:{}", self.user, self.password)
        };
        format!(
            "postgres://{}@{}/{}?connect_timeout={}",
            credentials, self.address, self.database, self.connect_timeout_secs
        )
    }

    /// Read `PGTABLE_ADDRESS`, `PGTABLE_DATABASE`, `PGTABLE_USER`,
    /// `PGTABLE_PASSWORD` and `PGTABLE_MAX_CONNECTIONS` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };
        let mut options = Self::new(
            required("PGTABLE_ADDRESS")?,
            required("PGTABLE_DATABASE")?,
            required("PGTABLE_USER")?,
            lookup("PGTABLE_PASSWORD").unwrap_or_default(),
        );
        if let Some(max) = lookup("PGTABLE_MAX_CONNECTIONS") {
            options.max_connections = max.parse().map_err(|_| {
                Error::Config(format!("PGTABLE_MAX_CONNECTIONS is not a number: {}", max))
            })?;
        }
        Ok(options)
    }
}
