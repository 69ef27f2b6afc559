//! Error types for linekv client operations

use thiserror::Error;

/// Result type alias for linekv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the linekv clients.
///
/// Protocol rejections (`emptycommand`, `wrongcommand`, `protoerr`) are not
/// errors: they fold into the empty/false result of the verb that triggered
/// them. Only the transport and the client's own state can fail a call.
#[derive(Error, Debug)]
pub enum Error {
    /// Address resolution or the initial connect failed
    #[error("Connection error: failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A write or read on an established connection failed
    #[error("Transport error: {source}")]
    Transport {
        #[from]
        source: std::io::Error,
    },

    /// A configured deadline expired (async client)
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// The client was used after `close()` or after a failed round trip
    #[error("Client is closed")]
    Closed,

    /// A caller panicked while holding the shared connection
    #[error("Shared client lock poisoned; connection state is undefined")]
    Poisoned,

    /// An argument cannot be framed on the wire
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a connection error
    pub fn connection<S: Into<String>>(addr: S, source: std::io::Error) -> Self {
        Error::Connection {
            addr: addr.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(source: std::io::Error) -> Self {
        Error::Transport { source }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout {
            message: msg.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Error::InvalidParameter {
            message: msg.into(),
        }
    }

    /// True for failures of an established connection, timeouts included.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }

    /// True when a read/write deadline expired.
    ///
    /// Blocking sockets report an expired deadline as `WouldBlock` on Unix
    /// and `TimedOut` on Windows, so both count.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Transport { source } => matches!(
                source.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
