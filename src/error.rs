//! Error types for the PSE&G usage poller.
//!
//! This module defines typed errors for each stage of the fetch pipeline,
//! providing better error categorization and enabling specific error handling
//! strategies (fallback, single re-authentication, benign omission).

use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
///
/// Variant messages carry the wrapped cause: the pipeline stores this
/// Display output in `FetchResult.error`, and a cycle failure must stay
/// diagnosable from that string alone.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Portal login errors
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Authenticated page retrieval errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// HTML figure extraction errors
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Unit conversion errors
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Generic errors that don't fit other categories
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Portal login errors.
///
/// `InvalidCredentials` is user-fixable and must never trigger the
/// browser fallback or an automatic retry. `ChallengeUnresolved` is the
/// recoverable variant: the direct path reports it when the portal's
/// anti-automation defenses reject the plain form POST, and the
/// authenticator reports it when every strategy has been exhausted.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The portal explicitly rejected the supplied credentials
    #[error("portal rejected credentials: {0}")]
    InvalidCredentials(String),

    /// A bot challenge (captcha, redirect loop, missing token) blocked login
    #[error("login challenge unresolved via {strategy}: {message}")]
    ChallengeUnresolved { strategy: String, message: String },

    /// No WebDriver endpoint could be located or initialized
    #[error("browser driver unavailable: {0}")]
    DriverUnavailable(String),
}

/// Authenticated page retrieval errors.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The portal no longer honors the session (401/403)
    #[error("session expired or rejected (status {0})")]
    SessionExpired(u16),

    /// Any other non-2xx response
    #[error("unexpected response status {status} for {path}")]
    Unexpected { status: u16, path: String },

    /// The request exceeded its time budget
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTML figure extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No locator strategy found the commodity's figure region.
    /// Benign: the account may simply not have that service.
    #[error("no figure region found for {commodity}")]
    RegionNotFound { commodity: String },

    /// A figure region was present but its numeric text did not parse
    #[error("malformed {field} value for {commodity}: '{text}'")]
    MalformedValue {
        commodity: String,
        field: String,
        text: String,
    },
}

/// Unit conversion errors.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The vendor reported a unit the poller cannot convert
    #[error("unsupported native unit '{unit}' for {commodity}")]
    UnsupportedUnit { commodity: String, unit: String },
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new invalid configuration error.
    #[allow(dead_code)]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AuthError {
    /// Creates a challenge error tagged with the failing strategy.
    pub fn challenge(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChallengeUnresolved {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// True when falling back to the next login strategy makes sense.
    /// Invalid credentials abort the whole chain.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidCredentials(_))
    }
}

impl FetchError {
    /// Creates an unexpected-status error.
    pub fn unexpected(status: u16, path: impl Into<String>) -> Self {
        Self::Unexpected {
            status,
            path: path.into(),
        }
    }
}

impl ExtractError {
    /// Creates a region-not-found error.
    pub fn region_not_found(commodity: impl std::fmt::Display) -> Self {
        Self::RegionNotFound {
            commodity: commodity.to_string(),
        }
    }

    /// Creates a malformed-value error.
    pub fn malformed(
        commodity: impl std::fmt::Display,
        field: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::MalformedValue {
            commodity: commodity.to_string(),
            field: field.into(),
            text: text.into(),
        }
    }

    /// True when the commodity should be silently omitted rather than logged
    /// as a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::RegionNotFound { .. })
    }
}

impl NormalizeError {
    /// Creates an unsupported-unit error.
    pub fn unsupported(commodity: impl std::fmt::Display, unit: impl Into<String>) -> Self {
        Self::UnsupportedUnit {
            commodity: commodity.to_string(),
            unit: unit.into(),
        }
    }
}
