//! Error types for the bot engine.
//!
//! Transport and configuration errors propagate to the caller. Protocol parse
//! errors are only ever surfaced by the tokenizer; the session logs and skips
//! them instead of returning them.

use thiserror::Error;

/// Failures opening or using a line transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// DNS lookup returned no addresses or failed outright.
    #[error("unable to resolve host: {0}")]
    HostUnresolved(String),

    /// The configured charset label is not known to the codec.
    #[error("unsupported encoding: {0}")]
    EncodingUnsupported(String),

    /// The TCP connect did not complete in time.
    #[error("connection to {host}:{port} timed out")]
    ConnectTimeout {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The peer actively refused the connection.
    #[error("connection to {host}:{port} refused")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// TLS setup or handshake failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// Any other I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was closed locally.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Whether the lifecycle controller should retry the connect immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::EncodingUnsupported(_) | TransportError::ConnectTimeout { .. }
        )
    }
}

/// Errors encountered when tokenizing a raw protocol line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty after trimming.
    #[error("empty message")]
    EmptyMessage,

    /// Command was missing or not a word/numeric.
    #[error("invalid command")]
    InvalidCommand,

    /// Source prefix was malformed.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Parsing error with position information.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Byte offset where parsing failed.
        position: usize,
        /// What was being parsed.
        context: String,
    },
}

/// Invalid network configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required field is absent from a network block.
    #[error("network {network:?}: missing required field `{field}`")]
    MissingField {
        /// Network name, or `<unnamed>`.
        network: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// Port was zero.
    #[error("network {0:?}: invalid port")]
    InvalidPort(String),

    /// The configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by an external permission store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PermissionError {
    /// The store is not reachable right now.
    #[error("permission store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error.
    #[error("permission store error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::ConnectTimeout {
            host: "irc.example.com".to_string(),
            port: 6667,
        };
        assert_eq!(
            format!("{}", err),
            "connection to irc.example.com:6667 timed out"
        );

        let err = ConfigError::MissingField {
            network: "<unnamed>".to_string(),
            field: "host",
        };
        assert_eq!(
            format!("{}", err),
            "network \"<unnamed>\": missing required field `host`"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::EncodingUnsupported("x-foo".into()).is_retryable());
        assert!(TransportError::ConnectTimeout {
            host: "h".into(),
            port: 1
        }
        .is_retryable());
        assert!(!TransportError::HostUnresolved("nowhere".into()).is_retryable());
        assert!(!TransportError::ConnectionRefused {
            host: "h".into(),
            port: 1
        }
        .is_retryable());
        assert!(!TransportError::Closed.is_retryable());
    }

    #[test]
    fn test_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: TransportError = io_err.into();
        match err {
            TransportError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }
}
