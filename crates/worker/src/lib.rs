use engine::{Currency, Engine, EngineError, FieldErrors};
use serde::Deserialize;
use thiserror::Error;

pub use dispatch::process;
pub use server::{router, run_with_listener};

mod dispatch;
mod server;
mod transactions;
mod views;
mod wallets;

/// Why a request did not produce a regular success payload.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Authentication Error")]
    Forbidden(FieldErrors),
    #[error("Invalid Fields")]
    Invalid(FieldErrors),
    /// The edit would not change anything. Not a failure.
    #[error("No changes")]
    NoChange,
    #[error("Unexpected error")]
    Unexpected(#[from] EngineError),
    #[error("Unsupported function type: {0}")]
    Unsupported(String),
    #[error("Malformed payload: {0}")]
    Malformed(String),
    #[error("Unexpected error")]
    Encoding(#[from] serde_json::Error),
}

impl HandlerError {
    /// HTTP style status carried by the response envelope.
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::Forbidden(_) => 403,
            HandlerError::Invalid(_) => 422,
            HandlerError::NoChange => 204,
            HandlerError::Unsupported(_) | HandlerError::Malformed(_) => 400,
            HandlerError::Unexpected(_) | HandlerError::Encoding(_) => 500,
        }
    }

    /// Field errors to report, if any.
    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            HandlerError::Forbidden(errors) | HandlerError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Fails with [`HandlerError::Forbidden`] unless `errors` is empty.
pub(crate) fn ensure_authorized(errors: FieldErrors) -> Result<(), HandlerError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HandlerError::Forbidden(errors))
    }
}

/// Fails with [`HandlerError::Invalid`] unless `errors` is empty.
pub(crate) fn ensure_valid(errors: FieldErrors) -> Result<(), HandlerError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HandlerError::Invalid(errors))
    }
}

/// When the initial transaction of a new wallet is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// Before answering.
    #[default]
    Inline,
    /// In a spawned task; the answer does not wait for it.
    Background,
}

#[derive(Clone, Debug)]
pub struct WorkerOptions {
    /// Currency of new top-level wallets that do not name one.
    pub default_currency: Currency,
    pub seed_mode: SeedMode,
}

/// Request handlers over a shared [`Engine`].
#[derive(Clone, Debug)]
pub struct Worker {
    engine: Engine,
    options: WorkerOptions,
}

impl Worker {
    pub fn new(engine: Engine, options: WorkerOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use engine::{FieldError, Resource};

    use super::*;

    #[test]
    fn statuses() {
        let forbidden = HandlerError::Forbidden(FieldError::NotOwner(Resource::Wallet).into());
        assert_eq!(forbidden.status(), 403);
        assert_eq!(forbidden.to_string(), "Authentication Error");

        let invalid = HandlerError::Invalid(FieldError::EmptyConcept.into());
        assert_eq!(invalid.status(), 422);
        assert_eq!(invalid.to_string(), "Invalid Fields");

        assert_eq!(HandlerError::NoChange.status(), 204);
        assert_eq!(
            HandlerError::Unexpected(EngineError::KeyNotFound("x".to_string())).status(),
            500
        );
    }

    #[test]
    fn unsupported_names_the_type() {
        let err = HandlerError::Unsupported("get-Everything".to_string());
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_string(), "Unsupported function type: get-Everything");
        assert!(err.errors().is_none());
    }

    #[test]
    fn guards_pass_on_empty_errors() {
        assert!(ensure_authorized(FieldErrors::new()).is_ok());
        assert!(matches!(
            ensure_valid(FieldError::InvalidDate.into()),
            Err(HandlerError::Invalid(_))
        ));
    }
}
