//! Error classification shared by the library and the HTTP layer

use std::fmt;

use serde::Serialize;

pub use crate::config::ConfigError;
pub use crate::db::DbError;

/// Coarse failure category, serialized into error response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed settings; nothing was dialed.
    Configuration,
    /// Dial, authentication, TLS or transport failure.
    Connection,
    /// The statement itself failed or timed out.
    Query,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::Connection).unwrap(),
            "\"connection\""
        );
        assert_eq!(ErrorKind::Query.to_string(), "query");
    }

    #[test]
    fn config_errors_are_configuration_kind() {
        let err = ConfigError::Missing {
            keys: vec!["DB_HOST"],
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "missing required configuration: DB_HOST");
    }
}
