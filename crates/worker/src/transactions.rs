//! Transaction handlers.

use api_types::transaction::{TransactionAdd, TransactionEdit, TransactionRef, TransactionsGet};
use engine::{
    EngineError, FieldErrors, Money, MonthFilter, NewTransaction, SENTINEL_ID, Transaction,
    TransactionPatch, TransactionScope,
    validation::{validate_amount, validate_concept, validate_date},
};
use serde_json::Value;

use crate::{
    HandlerError, Worker, ensure_authorized, ensure_valid,
    views::{map_changes, map_transaction, map_transactions},
    wallets::owned,
};

/// Text fields count as provided only when non-empty.
pub(crate) fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

pub(crate) fn validated<T>(value: Option<T>, what: &str) -> Result<T, HandlerError> {
    value.ok_or_else(|| EngineError::KeyNotFound(format!("validated {what}")).into())
}

/// Cents of an amount that passed `validate_amount`.
pub(crate) fn validated_money(value: f64) -> Result<Money, HandlerError> {
    Money::from_major(value).ok_or_else(|| {
        EngineError::InvalidAmount(format!("validated amount {value} out of range")).into()
    })
}

/// Absolute cents of an amount that passed `validate_amount`.
pub(crate) fn validated_magnitude(value: f64) -> Result<Money, HandlerError> {
    validated(validated_money(value)?.checked_abs(), "amount")
}

impl Worker {
    async fn require_owned_transaction(
        &self,
        user_id: &str,
        transaction_id: &str,
    ) -> Result<Transaction, HandlerError> {
        let (transaction, denied) = self
            .engine
            .transaction_ownership(user_id, transaction_id)
            .await?
            .into_parts();
        ensure_authorized(denied)?;
        validated(transaction, "transaction")
    }

    pub(crate) async fn add_transaction(
        &self,
        payload: TransactionAdd,
    ) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let wallet_id = payload.wallet_id.unwrap_or_default();
        tracing::info!(%user_id, %wallet_id, "add transaction");

        let (wallet, denied) = self
            .engine
            .wallet_ownership(&user_id, &wallet_id)
            .await?
            .into_parts();
        ensure_authorized(denied)?;
        let wallet = owned(wallet)?;

        let mut errors = FieldErrors::new();
        let category_id = payload
            .category
            .and_then(|category| category.id)
            .unwrap_or_default();
        let (category, category_errors) = self
            .engine
            .validate_category(&user_id, &category_id)
            .await?
            .into_parts();
        errors.merge(category_errors);

        let amount = validate_amount(
            &payload
                .amount
                .map(|amount| amount.as_text())
                .unwrap_or_default(),
        );
        errors.merge(amount.errors);
        let date = validate_date(payload.transaction_date.as_deref().unwrap_or_default());
        errors.merge(date.errors);
        let concept = validate_concept(payload.concept.as_deref());
        errors.merge(concept.errors);
        ensure_valid(errors)?;

        let transaction = self
            .engine
            .add_transaction(NewTransaction {
                user_id,
                wallet_id: wallet.id,
                concept: concept.value,
                amount: validated_magnitude(amount.value)?,
                transaction_date: validated(date.value, "date")?,
                category_id: validated(category, "category")?.id,
                exclude_from_report: payload
                    .exclude_from_report
                    .and_then(|flag| flag.as_flag())
                    .unwrap_or(false),
            })
            .await?;
        Ok(serde_json::to_value(map_transaction(&transaction))?)
    }

    pub(crate) async fn delete_transaction(
        &self,
        payload: TransactionRef,
    ) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let transaction_id = payload.id.unwrap_or_default();
        tracing::info!(%user_id, %transaction_id, "delete transaction");

        let transaction = self
            .require_owned_transaction(&user_id, &transaction_id)
            .await?;
        let deleted = self.engine.delete_transaction(transaction.id).await?;
        Ok(serde_json::to_value(map_transactions(&deleted))?)
    }

    /// Applies the provided fields that differ from the stored ones.
    ///
    /// Ownership of a new wallet is checked like the ownership of the
    /// transaction itself. Every changed field is validated before deciding
    /// that nothing changed. A transfer half with a live partner keeps its
    /// wallet and category, so those fields are ignored for it.
    pub(crate) async fn edit_transaction(
        &self,
        payload: TransactionEdit,
    ) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let transaction_id = payload.id.unwrap_or_default();
        tracing::info!(%user_id, %transaction_id, "edit transaction");

        let transaction = self
            .require_owned_transaction(&user_id, &transaction_id)
            .await?;

        let linked = match transaction.transfer_id {
            Some(partner_id) => self.engine.transaction(partner_id).await?.is_some(),
            None => false,
        };

        let mut denied = FieldErrors::new();
        let mut errors = FieldErrors::new();
        let mut patch = TransactionPatch::default();

        if !linked
            && let Some(wallet_id) = non_blank(payload.wallet_id.as_deref())
            && wallet_id != transaction.wallet_id.to_string()
        {
            let (wallet, wallet_denied) = self
                .engine
                .wallet_ownership(&user_id, wallet_id)
                .await?
                .into_parts();
            denied.merge(wallet_denied);
            patch.wallet_id = wallet.map(|wallet| wallet.id);
        }

        if let Some(concept) = non_blank(payload.concept.as_deref())
            && concept.trim() != transaction.concept
        {
            let checked = validate_concept(Some(concept));
            errors.merge(checked.errors);
            patch.concept = Some(checked.value);
        }

        let category_id = payload.category.and_then(|category| category.id);
        if !linked
            && let Some(category_id) = non_blank(category_id.as_deref())
            && category_id != transaction.category.id.to_string()
        {
            let (category, category_errors) = self
                .engine
                .validate_category(&transaction.user_id, category_id)
                .await?
                .into_parts();
            errors.merge(category_errors);
            patch.category_id = category.map(|category| category.id);
        }

        if let Some(amount) = payload.amount.filter(|amount| !amount.is_blank()) {
            let checked = validate_amount(&amount.as_text());
            if checked.is_valid() {
                let amount = validated_magnitude(checked.value)?;
                if amount != transaction.amount {
                    patch.amount = Some(amount);
                }
            } else {
                errors.merge(checked.errors);
            }
        }

        if let Some(date) = non_blank(payload.transaction_date.as_deref())
            && date != transaction.transaction_date.format("%Y-%m-%d").to_string()
        {
            let checked = validate_date(date);
            errors.merge(checked.errors);
            patch.transaction_date = checked.value;
        }

        if let Some(exclude) = payload
            .exclude_from_report
            .and_then(|flag| flag.as_flag())
            .filter(|exclude| *exclude != transaction.exclude_from_report)
        {
            patch.exclude_from_report = Some(exclude);
        }

        ensure_authorized(denied)?;
        ensure_valid(errors)?;
        if patch.is_empty() {
            return Err(HandlerError::NoChange);
        }

        let changes = self
            .engine
            .update_transaction(&transaction, patch)
            .await?;
        Ok(serde_json::to_value(map_changes(&changes))?)
    }

    pub(crate) async fn get_transaction(
        &self,
        payload: TransactionRef,
    ) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let transaction_id = payload.id.unwrap_or_default();
        tracing::debug!(%user_id, %transaction_id, "get transaction");

        let transaction = self
            .require_owned_transaction(&user_id, &transaction_id)
            .await?;
        Ok(serde_json::to_value(map_transaction(&transaction))?)
    }

    /// Transactions of one month, for a wallet and its sub-wallets or for
    /// every wallet with `"-1"`.
    pub(crate) async fn get_transactions(
        &self,
        payload: TransactionsGet,
    ) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let wallet_id = payload.id.unwrap_or_default();
        tracing::debug!(%user_id, %wallet_id, datamonth = ?payload.datamonth, "get transactions");

        let scope = if wallet_id == SENTINEL_ID {
            TransactionScope::All
        } else {
            let (wallet, denied) = self
                .engine
                .wallet_ownership(&user_id, &wallet_id)
                .await?
                .into_parts();
            ensure_authorized(denied)?;
            TransactionScope::Family(owned(wallet)?.id)
        };
        let month = MonthFilter::parse_or_current(payload.datamonth.as_deref());

        let transactions = self
            .engine
            .transactions_in_month(&user_id, scope, month)
            .await?;
        Ok(serde_json::to_value(map_transactions(&transactions))?)
    }
}
