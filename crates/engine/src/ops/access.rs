//! Ownership and lineage guards.
//!
//! Guards report failures as field errors instead of `Err`, and always hand
//! back whatever they fetched. Ids that are not valid UUIDs are treated as
//! unknown records.

use uuid::Uuid;

use crate::{
    ResultEngine, Transaction, Wallet,
    validation::{Checked, FieldError, Resource},
};

use super::Engine;

/// Id clients send for "no parent", "global owner" and "every wallet".
pub const SENTINEL_ID: &str = "-1";

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

impl Engine {
    /// Checks that `user_id` owns the wallet `wallet_id`.
    pub async fn wallet_ownership(
        &self,
        user_id: &str,
        wallet_id: &str,
    ) -> ResultEngine<Checked<Option<Wallet>>> {
        let wallet = match parse_id(wallet_id) {
            Some(id) => self.wallet(id).await?,
            None => None,
        };
        let owned = !user_id.is_empty()
            && wallet
                .as_ref()
                .is_some_and(|wallet| wallet.user_id == user_id);
        if owned {
            Ok(Checked::ok(wallet))
        } else {
            Ok(Checked::with_errors(
                wallet,
                FieldError::NotOwner(Resource::Wallet).into(),
            ))
        }
    }

    /// Checks that `user_id` owns the transaction `transaction_id`.
    pub async fn transaction_ownership(
        &self,
        user_id: &str,
        transaction_id: &str,
    ) -> ResultEngine<Checked<Option<Transaction>>> {
        let transaction = match parse_id(transaction_id) {
            Some(id) => self.transaction(id).await?,
            None => None,
        };
        let owned = !user_id.is_empty()
            && transaction
                .as_ref()
                .is_some_and(|transaction| transaction.user_id == user_id);
        if owned {
            Ok(Checked::ok(transaction))
        } else {
            Ok(Checked::with_errors(
                transaction,
                FieldError::NotOwner(Resource::Transaction).into(),
            ))
        }
    }

    /// Checks that `parent_id` can become the parent of a new wallet of
    /// `user_id`.
    ///
    /// A missing, blank or `"-1"` parent means a root wallet and yields
    /// `None`. Otherwise the parent must belong to the user and must be a
    /// root itself.
    pub async fn wallet_lineage(
        &self,
        user_id: &str,
        parent_id: Option<&str>,
    ) -> ResultEngine<Checked<Option<Wallet>>> {
        let parent_id = parent_id.map(str::trim).unwrap_or_default();
        if parent_id.is_empty() || parent_id == SENTINEL_ID {
            return Ok(Checked::ok(None));
        }

        let parent = match parse_id(parent_id) {
            Some(id) => self.wallet(id).await?,
            None => None,
        };
        let error = match &parent {
            Some(wallet) if wallet.user_id != user_id => Some(FieldError::ParentNotOwned),
            None => Some(FieldError::ParentNotOwned),
            Some(wallet) if !wallet.lineage.is_root() => Some(FieldError::DepthExceeded),
            Some(_) => None,
        };
        match error {
            Some(error) => Ok(Checked::with_errors(parent, error.into())),
            None => Ok(Checked::ok(parent)),
        }
    }
}
