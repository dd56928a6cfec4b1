//! Foodcourt client library.
//!
//! Talks to the ordering backend and keeps the client-side state (cart,
//! favorites, loyalty account, shopping lists) in a local cache.
//!
//! # Modules
//!
//! - [`api`] - HTTP client with bearer auth, token refresh, and catalog cache
//! - [`checkout`] - Address selection and order submission
//! - [`config`] - Configuration from environment
//! - [`error`] - Error types and Sentry helpers
//! - [`state`] - Application state loaded from and saved to the local cache
//! - [`storage`] - Local key-value cache backends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;

pub use api::ApiClient;
pub use api::types::{AuthResponse, Contact, Review, Session, User};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, Result, StorageError};
pub use state::{AppState, CheckoutReceipt};
pub use storage::{FileStore, LocalCache, LocalCacheExt, MemoryStore, NoRemoteSync, RemoteSync};
