//! Error types for the ordering client, with Sentry helpers.
//!
//! Every client operation returns `Result<T, ClientError>`. Server-class
//! failures are what the CLI reports to Sentry.

use reqwest::StatusCode;
use thiserror::Error;

use foodcourt_core::{
    CartError, CustomizationError, ShoppingListError, ValidationError, ValidationErrors,
};

pub use crate::config::ConfigError;

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the credentials and no refresh was possible.
    #[error("Unauthorized")]
    Unauthorized,

    /// Token refresh failed; stored credentials were cleared.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Authenticated, but not allowed.
    #[error("Access forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend failed (5xx).
    #[error("Server error ({status})")]
    Server { status: StatusCode },

    /// Any other non-success status.
    #[error("Request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns `true` for failures on the backend or network side.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Http(_))
    }
}

/// Errors from the local cache.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored JSON no longer matches the expected shape.
    #[error("Corrupt value for {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    InvalidForm(#[from] ValidationErrors),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Customization(#[from] CustomizationError),

    #[error(transparent)]
    ShoppingList(#[from] ShoppingListError),

    /// The operation needs a logged-in user.
    #[error("Not logged in")]
    NotAuthenticated,
}

impl ClientError {
    /// Returns `true` if this error should be reported to Sentry.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Api(err) => err.is_server_error(),
            Self::Storage(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
