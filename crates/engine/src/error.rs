//! The module contains the error the engine can throw.
//!
//! Business-rule failures (a wrong owner, an empty concept, ...) are not
//! errors: guards and validators report them through [`FieldErrors`].
//! [`EngineError`] is reserved for lookups that must succeed, broken
//! invariants and storage failures.
//!
//!  [`FieldErrors`]: super::validation::FieldErrors
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid lineage: {0}")]
    InvalidLineage(String),
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidLineage(a), Self::InvalidLineage(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
