//! Error types
//!
//! Construction and resolution errors are recovered at the inventory
//! boundary; fetch errors abort only the provider that raised them.

use thiserror::Error;

/// Boxed error carried as the source of a backend failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving providers or enumerating their assets
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed credentials / required keys in a config block
    #[error("invalid configuration for provider {provider}: {message}")]
    Configuration { provider: String, message: String },

    /// The `provider` value of a config block matches no registered backend
    #[error("invalid provider name found: {0}")]
    UnknownProvider(String),

    /// A listing call against the backend failed
    #[error("{operation}: {source}")]
    Backend {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// The shared cancellation token fired while a fetch was in flight
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn configuration(provider: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Whether the error came from cancellation rather than the backend
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
