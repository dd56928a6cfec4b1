//! Command implementations.

use thiserror::Error;

use foodcourt_client::ClientError;
use foodcourt_core::{CartError, ShoppingListError};

pub mod account;
pub mod cart;
pub mod catalog;
pub mod lists;
pub mod loyalty;
pub mod orders;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    ShoppingList(#[from] ShoppingListError),

    /// A 1-based position that points past the end of a listing.
    #[error("No {kind} at position {position}")]
    NoSuchPosition { kind: &'static str, position: usize },
}

impl CommandError {
    /// Whether the failure lies outside the user's input.
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Client(err) => err.is_server_error(),
            _ => false,
        }
    }
}

/// Convert a 1-based position from the command line to an index.
const fn index(kind: &'static str, position: usize) -> Result<usize, CommandError> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => Err(CommandError::NoSuchPosition { kind, position }),
    }
}
