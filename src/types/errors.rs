use std::fmt;

// === ConfigError ===

/// Errors raised while building the application configuration.
///
/// Configuration is validated at startup and any of these is fatal; the
/// application never substitutes placeholder values for missing settings.
#[derive(Debug)]
pub enum ConfigError {
    /// A required configuration value is absent.
    MissingValue(String),
    /// A configuration value is present but malformed.
    InvalidValue(String),
    /// An I/O error occurred while reading a configuration file.
    IoError(String),
    /// Failed to parse a configuration file.
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingValue(name) => {
                write!(f, "Missing required configuration value: {}", name)
            }
            ConfigError::InvalidValue(msg) => {
                write!(f, "Invalid configuration value: {}", msg)
            }
            ConfigError::IoError(msg) => write!(f, "Configuration I/O error: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Configuration parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// === AuthError ===

/// Errors related to the external identity provider.
#[derive(Debug)]
pub enum AuthError {
    /// A network error occurred while talking to the identity provider.
    NetworkError(String),
    /// The identity provider returned an error.
    ProviderError(String),
    /// A sign-in redirect URL could not be constructed.
    InvalidRedirect(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NetworkError(msg) => write!(f, "Identity network error: {}", msg),
            AuthError::ProviderError(msg) => write!(f, "Identity provider error: {}", msg),
            AuthError::InvalidRedirect(msg) => write!(f, "Invalid sign-in redirect: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === StoreError ===

/// Errors related to the external record store.
#[derive(Debug)]
pub enum StoreError {
    /// A network error occurred before the store produced a response.
    NetworkError(String),
    /// The store rejected the request; carries the service's message verbatim.
    ServiceError(String),
    /// The targeted record does not exist (or is not owned by the user).
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NetworkError(msg) => write!(f, "Store network error: {}", msg),
            StoreError::ServiceError(msg) => write!(f, "{}", msg),
            StoreError::NotFound(id) => write!(f, "Record not found: {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

// === StreamError ===

/// Errors raised while opening a change-stream subscription.
///
/// Failures after a subscription is open are reported through the
/// subscription itself and drive the reconnection policy; they never
/// surface as a blocking error.
#[derive(Debug)]
pub enum StreamError {
    /// The websocket connection could not be established.
    ConnectFailed(String),
    /// The connection opened but the subscription request failed.
    SubscribeFailed(String),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectFailed(msg) => {
                write!(f, "Change-stream connect failed: {}", msg)
            }
            StreamError::SubscribeFailed(msg) => {
                write!(f, "Change-stream subscribe failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for StreamError {}

// === ValidationError ===

/// Local input validation errors, raised before any network call.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Title or URL is empty after trimming.
    MissingFields,
    /// The URL does not parse as an absolute URL.
    InvalidUrl(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields => {
                write!(f, "Please fill in both title and URL")
            }
            ValidationError::InvalidUrl(url) => {
                write!(f, "Not a valid absolute URL: {}", url)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// === EditorError ===

/// Errors returned by a bookmark submission.
#[derive(Debug)]
pub enum EditorError {
    /// A submission is already in flight; the duplicate is suppressed.
    Busy,
    /// Local validation failed; nothing was sent.
    Validation(ValidationError),
    /// The store rejected the create request.
    Store(StoreError),
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Busy => write!(f, "A submission is already in flight"),
            EditorError::Validation(e) => write!(f, "{}", e),
            EditorError::Store(e) => write!(f, "Failed to add bookmark: {}", e),
        }
    }
}

impl std::error::Error for EditorError {}
