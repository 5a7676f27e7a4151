//! Routing of request envelopes to handlers.

use api_types::envelope::{ErrorPayload, Request, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{HandlerError, Worker};

const ERROR_TYPE: &str = "Error";

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, HandlerError> {
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|err| HandlerError::Malformed(err.to_string()))
}

impl Worker {
    async fn dispatch(&self, kind: &str, payload: Value) -> Result<Value, HandlerError> {
        match kind {
            "add-Wallet" => self.add_wallet(decode(payload)?).await,
            "delete-Wallet" => self.delete_wallet(decode(payload)?).await,
            "edit-Wallet" => self.edit_wallet(decode(payload)?).await,
            "get-Wallet" => self.get_wallet(decode(payload)?).await,
            "get-Wallets" => self.get_wallets(decode(payload)?).await,
            "transfer-Wallet" => self.transfer(decode(payload)?).await,
            "add-Transaction" => self.add_transaction(decode(payload)?).await,
            "delete-Transaction" => self.delete_transaction(decode(payload)?).await,
            "edit-Transaction" => self.edit_transaction(decode(payload)?).await,
            "get-Transaction" => self.get_transaction(decode(payload)?).await,
            "get-Transactions" => self.get_transactions(decode(payload)?).await,
            other => Err(HandlerError::Unsupported(other.to_string())),
        }
    }
}

fn error_response(kind: &str, err: HandlerError) -> Response {
    let status = err.status();
    match &err {
        HandlerError::NoChange => {
            return Response {
                kind: kind.to_string(),
                status,
                payload: Value::Null,
            };
        }
        HandlerError::Unsupported(_) => tracing::warn!("{err}"),
        HandlerError::Unexpected(inner) => tracing::error!(kind, "request failed: {inner}"),
        HandlerError::Encoding(inner) => tracing::error!(kind, "encoding failed: {inner}"),
        _ => tracing::debug!(kind, status, "request rejected"),
    }

    let payload = ErrorPayload {
        message: err.to_string(),
        errors: err.errors().map(|errors| errors.messages()).unwrap_or_default(),
    };
    Response {
        kind: ERROR_TYPE.to_string(),
        status,
        payload: serde_json::to_value(payload).unwrap_or(Value::Null),
    }
}

/// Handles one request envelope. Never fails: every outcome, including an
/// unknown `type`, is a response envelope.
pub async fn process(worker: &Worker, request: Request) -> Response {
    let Request { kind, payload } = request;
    match worker.dispatch(&kind, payload).await {
        Ok(payload) => Response {
            kind,
            status: 200,
            payload,
        },
        Err(err) => error_response(&kind, err),
    }
}
