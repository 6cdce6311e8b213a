//! Error types for TutorHub analytics.
//!
//! This module defines the `AnalyticsError` enum which represents all
//! errors that can occur while computing analytics over the data store.

use thiserror::Error;

/// The main error type for analytics operations.
///
/// Storage failures come in two flavours: `Database` is what an adapter
/// returns when a query fails, `FetchFailed` is the same failure after the
/// engine has attributed it to the series it was fetching. Neither is ever
/// used to signal "no data"; an empty result is a successful empty vector.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    // ==================== Storage Errors ====================
    /// A storage operation failed.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Fetching one metric series failed.
    #[error("Failed to fetch '{series}': {message}")]
    FetchFailed { series: String, message: String },

    // ==================== Access Errors ====================
    /// No credentials, or credentials that could not be resolved.
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated, but without admin privilege.
    #[error("Admin access required")]
    Forbidden,

    // ==================== Configuration Errors ====================
    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ==================== Internal Errors ====================
    /// An internal error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AnalyticsError {
    /// Creates a new database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Creates a fetch failure for the named series.
    pub fn fetch_failed(series: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            series: series.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the error originated in the storage layer.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::FetchFailed { .. })
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            _ => 500,
        }
    }
}

/// A Result type alias using AnalyticsError.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
