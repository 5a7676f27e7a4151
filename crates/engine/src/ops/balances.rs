use std::collections::HashMap;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    CategoryKind, EngineError, Money, ResultEngine, Wallet, categories, transactions,
    util::parse_uuid, wallets,
};

use super::{Engine, with_tx};

fn out_of_range(wallet_id: Uuid) -> EngineError {
    EngineError::InvalidAmount(format!("balance of wallet {wallet_id} out of range"))
}

fn ensure_room(wallet: &Wallet, delta: Money) -> ResultEngine<()> {
    wallet
        .balance
        .checked_add(delta)
        .map(|_| ())
        .ok_or_else(|| out_of_range(wallet.id))
}

impl Engine {
    /// Fails with [`EngineError::InvalidAmount`] when adding `delta` would
    /// overflow the balance of the wallet or, with `propagate`, of its
    /// parent. Nothing is written.
    pub(crate) async fn check_adjustment(
        &self,
        wallet_id: Uuid,
        delta: Money,
        propagate: bool,
    ) -> ResultEngine<()> {
        let wallet = self.require_wallet(wallet_id).await?;
        ensure_room(&wallet, delta)?;
        if propagate
            && let Some(parent_id) = wallet.parent_id()
            && let Some(parent) = self.wallet(parent_id).await?
        {
            ensure_room(&parent, delta)?;
        }
        Ok(())
    }

    async fn increment_balance(&self, wallet_id: Uuid, delta: Money) -> ResultEngine<()> {
        wallets::Entity::update_many()
            .col_expr(
                wallets::Column::Balance,
                Expr::col(wallets::Column::Balance).add(delta.cents()),
            )
            .filter(wallets::Column::Id.eq(wallet_id.to_string()))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Adds a signed `delta` to the balance of a wallet and, with
    /// `propagate`, to the balance of its parent.
    ///
    /// Each increment is one atomic `UPDATE`. A zero delta writes nothing,
    /// and a delta that would overflow a balance is refused before any
    /// write. Returns the wallet after the change.
    pub async fn adjust_balance(
        &self,
        wallet_id: Uuid,
        delta: Money,
        propagate: bool,
    ) -> ResultEngine<Wallet> {
        if delta.is_zero() {
            return self.require_wallet(wallet_id).await;
        }

        self.check_adjustment(wallet_id, delta, propagate).await?;
        self.increment_balance(wallet_id, delta).await?;
        let wallet = self.require_wallet(wallet_id).await?;
        if propagate && let Some(parent_id) = wallet.parent_id() {
            self.increment_balance(parent_id, delta).await?;
        }
        Ok(wallet)
    }

    /// Applies the contribution of `amount` of `kind` to a wallet: added for
    /// income, subtracted for expenses.
    ///
    /// With `unlinked` the parent is left untouched.
    pub async fn update_amount(
        &self,
        wallet_id: Uuid,
        amount: Money,
        kind: CategoryKind,
        unlinked: bool,
    ) -> ResultEngine<Wallet> {
        self.adjust_balance(wallet_id, kind.signed(amount), !unlinked)
            .await
    }

    /// Rebuilds every balance of a user from the stored transactions.
    ///
    /// A wallet balance is the sum of its own transactions; a root also
    /// adds the transactions of its sub-wallets. Runs inside one DB
    /// transaction and returns the wallets with the rebuilt balances.
    pub async fn recompute_balances(&self, user_id: &str) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let mut wallets_by_id: HashMap<Uuid, Wallet> = HashMap::new();
            for model in wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
            {
                let mut wallet = Wallet::try_from(model)?;
                wallet.balance = Money::ZERO;
                wallets_by_id.insert(wallet.id, wallet);
            }

            let rows = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .find_also_related(categories::Entity)
                .all(&db_tx)
                .await?;

            let mut own: HashMap<Uuid, Money> = HashMap::new();
            for (transaction, category) in rows {
                let Some(category) = category else {
                    continue;
                };
                let kind = CategoryKind::try_from(category.kind.as_str())?;
                let wallet_id = parse_uuid(&transaction.wallet_id, "wallet")?;
                let entry = own.entry(wallet_id).or_default();
                *entry = entry
                    .checked_add(kind.signed(Money::new(transaction.amount)))
                    .ok_or_else(|| out_of_range(wallet_id))?;
            }

            let parents: Vec<(Uuid, Option<Uuid>)> = wallets_by_id
                .values()
                .map(|wallet| (wallet.id, wallet.parent_id()))
                .collect();
            for (wallet_id, parent_id) in parents {
                let total = own.get(&wallet_id).copied().unwrap_or_default();
                if let Some(wallet) = wallets_by_id.get_mut(&wallet_id) {
                    wallet.balance = wallet
                        .balance
                        .checked_add(total)
                        .ok_or_else(|| out_of_range(wallet_id))?;
                }
                if let Some(parent) = parent_id.and_then(|id| wallets_by_id.get_mut(&id)) {
                    parent.balance = parent
                        .balance
                        .checked_add(total)
                        .ok_or_else(|| out_of_range(parent.id))?;
                }
            }

            for wallet in wallets_by_id.values() {
                wallets::Entity::update_many()
                    .col_expr(wallets::Column::Balance, Expr::value(wallet.balance.cents()))
                    .filter(wallets::Column::Id.eq(wallet.id.to_string()))
                    .exec(&db_tx)
                    .await?;
            }

            let mut rebuilt: Vec<Wallet> = wallets_by_id.into_values().collect();
            rebuilt.sort_by_key(|wallet| wallet.created_at);
            tracing::info!(user_id, wallets = rebuilt.len(), "recomputed balances");
            Ok::<_, crate::EngineError>(rebuilt)
        })
    }
}
