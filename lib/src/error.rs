//! Error types for identifier resolution and service queries.
//!
//! None of these are retried automatically; the session surfaces them
//! verbatim and waits for the user to quit.

use thiserror::Error;

/// Errors from the npm registry lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP request failed.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry answered with a non-success status.
    #[error("registry returned {status} for package '{package}'")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The package that was looked up.
        package: String,
    },

    /// Registry response was not the expected JSON document.
    #[error("failed to parse registry response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the GitHub release queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP request failed.
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub API rate limit exhausted.
    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    /// GitHub answered with a non-success status.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API body, or the raw body.
        message: String,
    },

    /// Response body was not the expected JSON document.
    #[error("failed to parse GitHub response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the identifier -> coordinate resolution pipeline.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The identifier matches neither the coordinate shape nor the npm name
    /// grammar.
    #[error("'{0}' is neither an owner/name pair nor a valid package name")]
    InvalidIdentifier(String),

    /// Registry metadata was found but no repository URL could be extracted
    /// from it. Carries the raw metadata for diagnostics.
    #[error(
        "cannot determine repository for '{package}' \
         (repository.url: '{repository_url}', homepage: '{homepage}')"
    )]
    Unresolvable {
        /// The package that was looked up.
        package: String,
        /// The registry's `repository.url` field, possibly empty.
        repository_url: String,
        /// The registry's `homepage` field, possibly empty.
        homepage: String,
    },

    /// The registry lookup itself failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
