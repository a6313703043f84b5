use thiserror::Error;

/// Result type for dialer operations
pub type Result<T> = std::result::Result<T, DialerError>;

/// Errors surfaced by registration and install flows.
///
/// The dial path never returns these: every failure reachable from a link
/// click degrades to the next fallback tier or is logged and swallowed.
#[derive(Error, Debug)]
pub enum DialerError {
    /// The user-scope association store rejected a write
    #[error("permission denied writing the association store (HKCU should not require elevation)")]
    PermissionDenied,

    /// A capability this operation needs does not exist on this platform
    #[error("{0} is not available on this platform")]
    NotAvailable(&'static str),

    /// Association-store failure other than permission
    #[error("association store error: {0}")]
    Registry(#[from] RegistryError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the hierarchical registry abstraction
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Write rejected by the store
    #[error("access denied at {path}")]
    AccessDenied { path: String },

    /// Attempted to delete a key that still has children
    #[error("key {path} is not empty")]
    NotEmpty { path: String },

    /// Any other store-level failure
    #[error("registry error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Classify a backend IO failure against a key path.
    pub fn from_io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied { path: path.to_string() },
            _ => Self::Io { path: path.to_string(), source },
        }
    }

    /// Whether this error means the store refused the write outright.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}
