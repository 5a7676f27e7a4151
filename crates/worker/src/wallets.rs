//! Wallet handlers.

use api_types::wallet::{WalletAdd, WalletEdit, WalletRef, WalletTransfer, WalletsGet};
use engine::{
    Currency, EngineError, FieldError, FieldErrors, Lineage, Money, NewTransaction, Resource,
    TransactionPatch, Wallet, WalletUpdate,
    validation::{set_icon_id, validate_amount, validate_concept, validate_date},
};
use serde_json::Value;

use crate::{
    HandlerError, SeedMode, Worker, ensure_authorized, ensure_valid,
    transactions::{non_blank, validated_magnitude, validated_money},
    views::{map_transactions, map_wallet, map_wallet_trees},
};

const SEED_CONCEPT: &str = "Initial transaction";

/// Wallet that passed an ownership guard.
pub(crate) fn owned(wallet: Option<Wallet>) -> Result<Wallet, HandlerError> {
    wallet.ok_or_else(|| EngineError::KeyNotFound("owned wallet".to_string()).into())
}

impl Worker {
    async fn require_owned_wallet(
        &self,
        user_id: &str,
        wallet_id: &str,
    ) -> Result<Wallet, HandlerError> {
        let (wallet, errors) = self
            .engine
            .wallet_ownership(user_id, wallet_id)
            .await?
            .into_parts();
        ensure_authorized(errors)?;
        owned(wallet)
    }

    pub(crate) async fn add_wallet(&self, payload: WalletAdd) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        tracing::info!(%user_id, "add wallet");

        let (parent, denied) = self
            .engine
            .wallet_lineage(&user_id, payload.parent_id.as_deref())
            .await?
            .into_parts();
        ensure_authorized(denied)?;

        let mut errors = FieldErrors::new();
        let (name, name_errors) = self
            .engine
            .validate_wallet_name(&user_id, payload.name.as_deref())
            .await?
            .into_parts();
        errors.merge(name_errors);

        let amount = validate_amount(
            &payload
                .money
                .map(|money| money.as_text())
                .unwrap_or_default(),
        );
        errors.merge(amount.errors);

        let currency = match (payload.currency.filter(|c| !c.is_empty()), &parent) {
            (Some(currency), _) => currency,
            (None, Some(parent)) => parent.currency.code().to_string(),
            (None, None) => self.options.default_currency.code().to_string(),
        };
        let (currency, currency_errors) = self
            .engine
            .validate_currency(Some(&currency), parent.as_ref().map(|parent| parent.id))
            .await?
            .into_parts();
        errors.merge(currency_errors);

        let icon_id = set_icon_id(payload.icon_id.map(|icon| icon.as_text()).as_deref());
        ensure_valid(errors)?;

        let lineage = match &parent {
            Some(parent) => Lineage::child_of(parent)?,
            None => Lineage::Root,
        };
        let mut wallet = self
            .engine
            .add_wallet(&user_id, &name, icon_id, Currency::try_from(currency)?, lineage)
            .await?;
        if let Some(parent) = &parent {
            self.engine.add_child(parent.id, wallet.id).await?;
        }

        let seed = validated_money(amount.value)?;
        if seed.is_positive() {
            self.seed_wallet(&wallet, seed).await?;
            wallet.balance = seed;
        }

        Ok(serde_json::to_value(map_wallet(&wallet))?)
    }

    /// Records the initial balance of a new wallet as an income.
    async fn seed_wallet(&self, wallet: &Wallet, amount: Money) -> Result<(), HandlerError> {
        let seed = NewTransaction {
            user_id: wallet.user_id.clone(),
            wallet_id: wallet.id,
            concept: SEED_CONCEPT.to_string(),
            amount,
            transaction_date: wallet.created_at.date_naive(),
            category_id: self.engine.basic_categories().income,
            exclude_from_report: false,
        };

        match self.options.seed_mode {
            SeedMode::Inline => {
                self.engine.add_transaction(seed).await?;
            }
            SeedMode::Background => {
                let engine = self.engine.clone();
                let wallet_id = wallet.id;
                tokio::spawn(async move {
                    if let Err(err) = engine.add_transaction(seed).await {
                        tracing::warn!(%wallet_id, "initial transaction failed: {err}");
                    }
                });
            }
        }
        Ok(())
    }

    pub(crate) async fn delete_wallet(&self, payload: WalletRef) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let wallet_id = payload.id.unwrap_or_default();
        tracing::info!(%user_id, %wallet_id, "delete wallet");

        let wallet = self.require_owned_wallet(&user_id, &wallet_id).await?;
        let deleted = self.engine.delete_wallet(wallet.id).await?;
        Ok(serde_json::to_value(map_wallet(&deleted))?)
    }

    pub(crate) async fn edit_wallet(&self, payload: WalletEdit) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let wallet_id = payload.id.unwrap_or_default();
        tracing::info!(%user_id, %wallet_id, "edit wallet");

        let wallet = self.require_owned_wallet(&user_id, &wallet_id).await?;

        let mut errors = FieldErrors::new();
        let mut update = WalletUpdate::default();

        if let Some(name) = non_blank(payload.name.as_deref())
            && name.trim() != wallet.name
        {
            let (name, name_errors) = self
                .engine
                .validate_wallet_name(&user_id, Some(name))
                .await?
                .into_parts();
            errors.merge(name_errors);
            update.name = Some(name);
        }

        let mut currency = None;
        if let Some(raw) = non_blank(payload.currency.as_deref())
            && Currency::normalize(raw) != wallet.currency.code()
        {
            let (code, currency_errors) = self
                .engine
                .validate_currency(Some(raw), wallet.parent_id())
                .await?
                .into_parts();
            errors.merge(currency_errors);
            if !wallet.children.is_empty() {
                errors.push(FieldError::ChildCurrencyMismatch);
            }
            currency = Some(code);
        }

        if let Some(icon) = payload.icon_id.filter(|icon| !icon.is_blank()) {
            let icon_id = set_icon_id(Some(&icon.as_text()));
            if icon_id != wallet.icon_id {
                update.icon_id = Some(icon_id);
            }
        }

        ensure_valid(errors)?;
        if let Some(code) = currency {
            update.currency = Some(Currency::try_from(code)?);
        }
        if update.is_empty() {
            return Err(HandlerError::NoChange);
        }

        let updated = self.engine.update_wallet(wallet.id, update).await?;
        Ok(serde_json::to_value(map_wallet(&updated))?)
    }

    pub(crate) async fn get_wallet(&self, payload: WalletRef) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let wallet_id = payload.id.unwrap_or_default();
        tracing::debug!(%user_id, %wallet_id, "get wallet");

        let wallet = self.require_owned_wallet(&user_id, &wallet_id).await?;
        Ok(serde_json::to_value(map_wallet(&wallet))?)
    }

    pub(crate) async fn get_wallets(&self, payload: WalletsGet) -> Result<Value, HandlerError> {
        let user_id = payload
            .id
            .filter(|id| !id.is_empty())
            .or(payload.user_id)
            .unwrap_or_default();
        tracing::debug!(%user_id, "get wallets");

        let trees = self.engine.wallets(&user_id).await?;
        Ok(serde_json::to_value(map_wallet_trees(&trees))?)
    }

    /// Moves money between two wallets of the same user as a linked pair of
    /// transactions.
    pub(crate) async fn transfer(&self, payload: WalletTransfer) -> Result<Value, HandlerError> {
        let user_id = payload.user_id.unwrap_or_default();
        let from_id = payload.from_id.unwrap_or_default();
        let to_id = payload.to_id.unwrap_or_default();
        tracing::info!(%user_id, %from_id, %to_id, "transfer between wallets");

        let from = self.engine.wallet_ownership(&user_id, &from_id).await?;
        let to = self.engine.wallet_ownership(&user_id, &to_id).await?;
        let mut denied = FieldErrors::new();
        if !from.is_valid() {
            denied.insert("from_id", FieldError::NotOwner(Resource::Wallet));
        }
        if !to.is_valid() {
            denied.insert("to_id", FieldError::NotOwner(Resource::Wallet));
        }
        ensure_authorized(denied)?;
        let (from, to) = (owned(from.value)?, owned(to.value)?);

        let mut errors = FieldErrors::new();
        if from.id == to.id {
            errors.push(FieldError::SameWallet);
        }
        let amount = validate_amount(
            &payload
                .amount
                .map(|amount| amount.as_text())
                .unwrap_or_default(),
        );
        errors.merge(amount.errors);
        let concept = validate_concept(payload.concept.as_deref());
        errors.merge(concept.errors);
        let date = validate_date(payload.transaction_date.as_deref().unwrap_or_default());
        errors.merge(date.errors);
        ensure_valid(errors)?;

        let transaction_date = date
            .value
            .ok_or_else(|| EngineError::InvalidAmount("validated date missing".to_string()))?;
        let amount = validated_magnitude(amount.value)?;
        let categories = self.engine.basic_categories();

        let outgoing = self
            .engine
            .add_transaction(NewTransaction {
                user_id: user_id.clone(),
                wallet_id: from.id,
                concept: concept.value.clone(),
                amount,
                transaction_date,
                category_id: categories.expense,
                exclude_from_report: from.parent_id() == Some(to.id),
            })
            .await?;
        let incoming = self
            .engine
            .add_transaction(NewTransaction {
                user_id,
                wallet_id: to.id,
                concept: concept.value,
                amount,
                transaction_date,
                category_id: categories.income,
                exclude_from_report: to.parent_id() == Some(from.id),
            })
            .await?;

        let link = |partner| TransactionPatch {
            transfer_id: Some(partner),
            ..Default::default()
        };
        let mut legs = self
            .engine
            .update_transaction(&outgoing, link(incoming.id))
            .await?
            .new;
        legs.extend(
            self.engine
                .update_transaction(&incoming, link(outgoing.id))
                .await?
                .new,
        );

        Ok(serde_json::to_value(map_transactions(&legs))?)
    }
}
