//! Error types for the fill engine
//!
//! Only two outcomes matter to callers of the entry points:
//! - the resolver failed (or was cancelled / timed out) and nothing was assigned
//! - the fill succeeded, possibly with some references left unresolved
//!
//! Shape mismatches, unmatched field names and unresolved identifiers are
//! never errors.

/// Errors reported by a [`Resolver`](crate::Resolver) implementation
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Transport-level failure talking to the resolution backend
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend refused the batch as a whole
    #[error("resolver rejected request: {0}")]
    Rejected(String),

    /// Any other resolver-specific failure
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ResolveError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Marker attribute is not a usable attribute name
    #[error("invalid marker attribute: '{0}'")]
    InvalidMarkerAttribute(String),

    /// Resolver timeout of zero would fail every fill
    #[error("resolve timeout must be positive")]
    ZeroResolveTimeout,

    /// TOML document could not be parsed
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Markup pattern failed to compile
    #[error("markup pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors returned by [`auto_fill`](crate::auto_fill) and
/// [`auto_fill_one`](crate::auto_fill_one)
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    /// Resolver call failed; propagated unchanged
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Caller cancelled the invocation before resolution completed
    #[error("fill cancelled before resolution completed")]
    Cancelled,

    /// Deadline expired before resolution completed
    #[error("resolution deadline exceeded")]
    DeadlineExceeded,

    /// Filler configuration was rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FillError {
    /// Check if a caller-side retry could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DeadlineExceeded | Self::Resolve(ResolveError::Transport(_))
        )
    }

    /// Resolver error, if this failure came from the resolver
    #[inline]
    #[must_use]
    pub fn as_resolve_error(&self) -> Option<&ResolveError> {
        match self {
            Self::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for fill operations
pub type FillResult<T> = Result<T, FillError>;
