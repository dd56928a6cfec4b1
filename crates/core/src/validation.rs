//! Client-side form validation.
//!
//! Forms are checked before any request is sent. Signup reports every problem
//! at once; the contact form stops at the first one.

use core::fmt;

use crate::types::{Email, EmailError};

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum contact message length, in characters.
pub const MIN_MESSAGE_LENGTH: usize = 10;

/// A single rejected field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("please enter a valid email address: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error(
        "password must be at least 8 characters and include uppercase, lowercase, number, and special character"
    )]
    WeakPassword,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("message must be at least {min} characters")]
    MessageTooShort { min: usize },
    #[error("please select a delivery address")]
    MissingDeliveryAddress,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Every problem found in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Returns `true` if `password` meets the account password policy.
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_punctuation())
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Registration form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// # Errors
    ///
    /// Returns all failed checks.
    pub fn validate(&self) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Err(e) = required(&self.username, "username") {
            errors.push(e);
        }
        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(e.into());
                None
            }
        };
        if !is_strong_password(&self.password) {
            errors.push(ValidationError::WeakPassword);
        }
        if self.password != self.confirm_password {
            errors.push(ValidationError::PasswordMismatch);
        }
        errors.into_result()?;
        email.ok_or_else(ValidationErrors::default)
    }
}

/// Contact form.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// # Errors
    ///
    /// Returns the first failed check, in field order.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        required(&self.name, "name")?;
        required(&self.email, "email")?;
        let email = Email::parse(&self.email)?;
        required(&self.subject, "subject")?;
        required(&self.message, "message")?;
        if self.message.trim().chars().count() < MIN_MESSAGE_LENGTH {
            return Err(ValidationError::MessageTooShort {
                min: MIN_MESSAGE_LENGTH,
            });
        }
        Ok(email)
    }
}

/// Product review form.
#[derive(Debug, Clone, Default)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: String,
}

impl ReviewForm {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRating`] outside 1..=5.
    pub const fn validate(&self) -> Result<(), ValidationError> {
        if self.rating >= 1 && self.rating <= 5 {
            Ok(())
        } else {
            Err(ValidationError::InvalidRating(self.rating))
        }
    }
}
