//! Configuration loading - environment, `.env` overlay, `DATABASE_URL`
//!
//! Values are resolved from three layers. A later layer only fills keys the
//! earlier ones left unset (or set to an empty string):
//!
//! 1. Process environment (or an explicit key/value map)
//! 2. A local `KEY=VALUE` file, `.env` by default
//! 3. `DATABASE_URL`, decomposed into the discrete `DB_*` fields
//!
//! Loading never writes to the process environment.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::{Host, Url};

pub const DB_HOST: &str = "DB_HOST";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_SSLMODE: &str = "DB_SSLMODE";
pub const DB_CONNECT_TIMEOUT: &str = "DB_CONNECT_TIMEOUT";
pub const DB_QUERY_TIMEOUT: &str = "DB_QUERY_TIMEOUT";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const ENVIRONMENT: &str = "ENVIRONMENT";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";
pub const DEBUG: &str = "DEBUG";
pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const CORS_PERMISSIVE: &str = "CORS_PERMISSIVE";

/// Keys that must resolve before any connection attempt, in report order.
pub const REQUIRED_DB_KEYS: [&str; 4] = [DB_HOST, DB_NAME, DB_USER, DB_PASSWORD];

pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_ENV_FILE: &str = ".env";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration error, raised before any network call is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .keys.join(", "))]
    Missing { keys: Vec<&'static str> },

    #[error("invalid value for {key} ({value:?}): {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The URL itself is never echoed, it usually carries a password.
    #[error("invalid DATABASE_URL: {reason}")]
    InvalidDatabaseUrl { reason: String },

    #[error("failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidDatabaseUrl {
            reason: reason.into(),
        }
    }
}

/// Raw key/value layers the configuration is resolved from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    env: HashMap<String, String>,
    file: HashMap<String, String>,
    loaded_file: Option<PathBuf>,
}

impl ConfigSources {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self {
            env: std::env::vars().collect(),
            ..Default::default()
        }
    }

    /// Use an explicit map in place of the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            env: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Default::default()
        }
    }

    /// Overlay a `KEY=VALUE` file beneath the environment layer.
    ///
    /// A missing file is skipped and leaves [`env_file`](Self::env_file)
    /// unset. Later lines in the file win over earlier ones for the same key.
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => return Ok(self),
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        for item in iter {
            let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            self.file.insert(key, value);
        }

        self.loaded_file = Some(path.to_path_buf());
        Ok(self)
    }

    /// Path of the env file that was read, if any.
    pub fn env_file(&self) -> Option<&Path> {
        self.loaded_file.as_deref()
    }

    /// Number of keys the env file contributed.
    pub fn file_len(&self) -> usize {
        self.file.len()
    }

    /// First non-empty value for `key`, environment before file.
    pub fn get(&self, key: &str) -> Option<&str> {
        [self.env.get(key), self.file.get(key)]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    /// Boolean toggle: `1`, `true`, `yes` and `on` enable it, anything else
    /// (or absence) leaves it off.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => parse_value(key, raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// TLS negotiation mode, libpq `sslmode` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Allow => "allow",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(format!(
                "unknown sslmode '{}' (expected disable, allow, prefer, require, verify-ca or verify-full)",
                other
            )),
        }
    }
}

/// Database connection settings.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    pub port: u16,
    pub ssl_mode: SslMode,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

/// Pieces recovered from `DATABASE_URL`.
#[derive(Debug, Default)]
struct UrlParts {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    name: Option<String>,
    ssl_mode: Option<String>,
}

fn decode_component(raw: &str) -> Result<String, ConfigError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|e| ConfigError::invalid_url(e.to_string()))
}

fn parse_database_url(raw: &str) -> Result<UrlParts, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid_url(e.to_string()))?;

    match url.scheme() {
        "postgres" | "postgresql" => {}
        other => {
            return Err(ConfigError::invalid_url(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    }

    let host = url.host().map(|host| match host {
        Host::Ipv6(addr) => addr.to_string(),
        other => other.to_string(),
    });

    let user = Some(url.username())
        .filter(|u| !u.is_empty())
        .map(decode_component)
        .transpose()?;
    let password = url.password().map(decode_component).transpose()?;

    let name = Some(url.path().trim_start_matches('/'))
        .filter(|p| !p.is_empty())
        .map(decode_component)
        .transpose()?;

    let ssl_mode = url
        .query_pairs()
        .find(|(k, _)| k == "sslmode")
        .map(|(_, v)| v.into_owned());

    Ok(UrlParts {
        host: host.filter(|h| !h.is_empty()),
        port: url.port(),
        user,
        password,
        name,
        ssl_mode,
    })
}

impl DbConfig {
    /// Resolve database settings, failing on missing credentials.
    pub fn from_sources(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let url = match sources.get(DATABASE_URL) {
            Some(raw) => parse_database_url(raw)?,
            None => UrlParts::default(),
        };

        let owned = |key: &str| sources.get(key).map(str::to_owned);
        let host = owned(DB_HOST).or(url.host);
        let name = owned(DB_NAME).or(url.name);
        let user = owned(DB_USER).or(url.user);
        let password = owned(DB_PASSWORD).or(url.password);

        let missing: Vec<&'static str> = [
            (DB_HOST, host.is_none()),
            (DB_NAME, name.is_none()),
            (DB_USER, user.is_none()),
            (DB_PASSWORD, password.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        let (Some(host), Some(name), Some(user), Some(password)) = (host, name, user, password)
        else {
            return Err(ConfigError::Missing { keys: missing });
        };

        let port = match sources.get(DB_PORT) {
            Some(raw) => parse_value(DB_PORT, raw)?,
            None => url.port.unwrap_or(DEFAULT_DB_PORT),
        };

        let ssl_mode = match owned(DB_SSLMODE).or(url.ssl_mode) {
            Some(raw) => parse_value(DB_SSLMODE, &raw)?,
            None => SslMode::default(),
        };

        let connect_timeout = Duration::from_secs(
            sources.parse_or(DB_CONNECT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT_SECS)?,
        );
        let query_timeout =
            Duration::from_secs(sources.parse_or(DB_QUERY_TIMEOUT, DEFAULT_QUERY_TIMEOUT_SECS)?);

        Ok(Self {
            host,
            name,
            user,
            password: SecretString::from(password),
            port,
            ssl_mode,
            connect_timeout,
            query_timeout,
        })
    }

    /// `host:port/name`, used in log lines and error messages.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.name)
    }

    /// Connection URL with the password replaced by `***`.
    pub fn masked_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}?sslmode={}",
            self.user, self.host, self.port, self.name, self.ssl_mode
        )
    }

    /// Password rendered as asterisks of the same length.
    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.expose_secret().chars().count())
    }
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    /// Informational only, echoed by `/info`.
    pub environment: String,
    pub bind_host: String,
    pub port: u16,
    pub debug: bool,
    /// Allow any CORS origin instead of localhost only.
    pub cors_permissive: bool,
    /// Bounds every route except `/health`. Always longer than the worst
    /// case of one database operation (dial, query, close).
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_sources(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let db = DbConfig::from_sources(sources)?;

        let request_timeout = Duration::from_secs(
            sources.parse_or(REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECS)?,
        );
        let db_budget = db.connect_timeout * 2 + db.query_timeout;
        if request_timeout <= db_budget {
            return Err(ConfigError::InvalidValue {
                key: REQUEST_TIMEOUT,
                value: request_timeout.as_secs().to_string(),
                reason: format!(
                    "must be longer than {}s (2 x DB_CONNECT_TIMEOUT + DB_QUERY_TIMEOUT)",
                    db_budget.as_secs()
                ),
            });
        }

        Ok(Self {
            db,
            environment: sources
                .get(ENVIRONMENT)
                .unwrap_or(DEFAULT_ENVIRONMENT)
                .to_string(),
            bind_host: sources.get(HOST).unwrap_or(DEFAULT_BIND_HOST).to_string(),
            port: sources.parse_or(PORT, DEFAULT_PORT)?,
            debug: sources.flag(DEBUG),
            cors_permissive: sources.flag(CORS_PERMISSIVE),
            request_timeout,
        })
    }

    /// Load from the process environment plus an optional env file
    /// (`.env` in the working directory when `None`).
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
        let sources = ConfigSources::from_env().with_env_file(path)?;
        Self::from_sources(&sources)
    }
}
