//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`Validation`] thrown when a query argument or input value is rejected.
//! - [`EmptyMovement`] thrown when derived timestamps are asked of a movement
//!   without transactions.
//! - [`Conversion`] thrown when the exchange rate source answered but the
//!   answer is unusable. An unreachable source is *not* an error, see
//!   [`Amount::Unknown`].
//! - [`Configuration`] thrown when the engine is built without a required input.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Validation`]: EngineError::Validation
//!  [`EmptyMovement`]: EngineError::EmptyMovement
//!  [`Conversion`]: EngineError::Conversion
//!  [`Configuration`]: EngineError::Configuration
//!  [`Amount::Unknown`]: crate::Amount::Unknown
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid argument: {0}")]
    Validation(String),
    #[error("Movement {0} has no transactions")]
    EmptyMovement(i32),
    #[error("Conversion failed: {0}")]
    Conversion(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::EmptyMovement(a), Self::EmptyMovement(b)) => a == b,
            (Self::Conversion(a), Self::Conversion(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
