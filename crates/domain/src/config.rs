//! Environment-driven configuration for the API binary.

use std::{env, fmt, time::Duration};

use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// HTTP listeners, the shared database and the login credentials. Loaded once
/// at startup and injected into the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    database_url: String,
    database_max_connections: Option<u32>,
    api_bind_address: String,
    api_unix_socket: Option<String>,
    internal_bind_address: Option<String>,
    internal_unix_socket: Option<String>,
    request_timeout: Duration,
    auth: AuthConfig,
}

impl ApiConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            database_url: get_required_var("DATABASE_URL")?,
            database_max_connections: get_optional_var("DATABASE_MAX_CONNECTIONS")
                .map(|raw| {
                    raw.parse().map_err(|source| ConfigError::InvalidNumber {
                        key: "DATABASE_MAX_CONNECTIONS",
                        source,
                    })
                })
                .transpose()?,
            api_bind_address: get_required_var("API_BIND_ADDRESS")?,
            api_unix_socket: get_optional_var("API_UNIX_SOCKET"),
            internal_bind_address: get_optional_var("API_INTERNAL_BIND_ADDRESS"),
            internal_unix_socket: get_optional_var("API_INTERNAL_UNIX_SOCKET"),
            request_timeout: Duration::from_secs(get_optional_secs(
                "API_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            auth: AuthConfig::load_from_env()?,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Pool ceiling; `None` keeps the driver default.
    pub fn database_max_connections(&self) -> Option<u32> {
        self.database_max_connections
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_unix_socket(&self) -> Option<&str> {
        self.api_unix_socket.as_deref()
    }

    pub fn internal_bind_address(&self) -> Option<&str> {
        self.internal_bind_address.as_deref()
    }

    pub fn internal_unix_socket(&self) -> Option<&str> {
        self.internal_unix_socket.as_deref()
    }

    pub fn has_internal_listener(&self) -> bool {
        self.internal_bind_address.is_some() || self.internal_unix_socket.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

/// The single accepted credential pair and the symmetric signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    username: String,
    password: String,
    signing_key: String,
    token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        signing_key: impl Into<String>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            signing_key: signing_key.into(),
            token_ttl,
        }
    }

    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            username: get_required_var("AUTH_USERNAME")?,
            password: get_required_var("AUTH_PASSWORD")?,
            signing_key: get_required_var("AUTH_SIGNING_KEY")?,
            token_ttl: Duration::from_secs(get_optional_secs(
                "AUTH_TOKEN_TTL_SECS",
                DEFAULT_TOKEN_TTL_SECS,
            )?),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn signing_key(&self) -> &[u8] {
        self.signing_key.as_bytes()
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("signing_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_optional_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match get_optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { key, source }),
        None => Ok(default),
    }
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("PACKAGE_TRACKER_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
