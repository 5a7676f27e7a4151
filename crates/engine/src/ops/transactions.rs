use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, EngineError, Money, ResultEngine, Transaction, categories,
    transactions::{self, NewTransaction, TransactionChanges, TransactionPatch},
    util::month_bounds,
};

use super::Engine;

/// Which wallets a transaction listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionScope {
    /// Every wallet of the user.
    All,
    /// A wallet together with its sub-wallets.
    Family(Uuid),
}

/// A calendar month used to filter transactions by date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthFilter {
    pub year: i32,
    pub month: u32,
}

impl MonthFilter {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses a six digit `YYYYMM` string.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = raw[..4].parse().ok()?;
        let month = raw[4..].parse().ok()?;
        Self::new(year, month)
    }

    /// The parsed month, or the current one when `raw` is missing or
    /// malformed.
    #[must_use]
    pub fn parse_or_current(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse)
            .unwrap_or_else(|| Self::containing(Utc::now().date_naive()))
    }

    /// `[first day, first day of the next month)`.
    pub fn bounds(self) -> ResultEngine<(NaiveDate, NaiveDate)> {
        month_bounds(self.year, self.month)
    }
}

/// The stored form of an amount: its absolute value, bounded by
/// [`Money::MAX_AMOUNT`].
fn magnitude(amount: Money) -> ResultEngine<Money> {
    amount
        .checked_abs()
        .filter(|amount| amount.is_within_limit())
        .ok_or_else(|| EngineError::InvalidAmount(format!("{amount} is out of range")))
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("balance change out of range".to_string())
}

fn from_row(
    (model, category): (transactions::Model, Option<categories::Model>),
) -> ResultEngine<Transaction> {
    let category = category
        .ok_or_else(|| EngineError::KeyNotFound(format!("category {}", model.category_id)))?;
    Transaction::from_parts(model, Category::try_from(category)?)
}

impl Engine {
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?
            .map(from_row)
            .transpose()
    }

    async fn require_category(&self, category_id: Uuid) -> ResultEngine<Category> {
        self.category(category_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))
    }

    /// Stores a transaction and applies its contribution to the wallet.
    ///
    /// The stored amount is the absolute value of `new.amount`; the sign
    /// comes from the category. An amount above [`Money::MAX_AMOUNT`], or one
    /// that would overflow a balance, is refused before anything is stored.
    pub async fn add_transaction(&self, new: NewTransaction) -> ResultEngine<Transaction> {
        let amount = magnitude(new.amount)?;
        let category = self.require_category(new.category_id).await?;
        self.check_adjustment(new.wallet_id, category.kind.signed(amount), true)
            .await?;
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            wallet_id: new.wallet_id,
            category,
            concept: new.concept.trim().to_string(),
            amount,
            exclude_from_report: new.exclude_from_report,
            transaction_date: new.transaction_date,
            transfer_id: None,
            created_at: Utc::now(),
        };
        transactions::ActiveModel::from(&transaction)
            .insert(&self.database)
            .await?;

        self.update_amount(
            transaction.wallet_id,
            transaction.amount,
            transaction.category.kind,
            false,
        )
        .await?;
        Ok(transaction)
    }

    async fn remove_transaction(&self, transaction: &Transaction) -> ResultEngine<()> {
        transactions::Entity::delete_by_id(transaction.id.to_string())
            .exec(&self.database)
            .await?;
        self.adjust_balance(transaction.wallet_id, -transaction.signed_amount(), true)
            .await?;
        Ok(())
    }

    /// Deletes a transaction and, for a transfer, its partner. Both
    /// contributions are reversed. Returns every deleted record.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        let transaction = self
            .transaction(transaction_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {transaction_id}")))?;
        self.remove_transaction(&transaction).await?;

        let mut deleted = vec![transaction];
        if let Some(partner_id) = deleted[0].transfer_id
            && let Some(partner) = self.transaction(partner_id).await?
        {
            self.remove_transaction(&partner).await?;
            deleted.push(partner);
        }
        Ok(deleted)
    }

    /// Deletes every transaction of a wallet without touching balances.
    pub async fn delete_all_transactions(&self, wallet_id: Uuid) -> ResultEngine<u64> {
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    /// Transactions of a user dated inside `month`, newest first.
    pub async fn transactions_in_month(
        &self,
        user_id: &str,
        scope: TransactionScope,
        month: MonthFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let (start, end) = month.bounds()?;
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::TransactionDate.gte(start))
            .filter(transactions::Column::TransactionDate.lt(end));

        if let TransactionScope::Family(wallet_id) = scope {
            let mut wallet_ids = vec![wallet_id.to_string()];
            if let Some(wallet) = self.wallet(wallet_id).await? {
                wallet_ids.extend(wallet.children.iter().map(Uuid::to_string));
            }
            query = query.filter(transactions::Column::WalletId.is_in(wallet_ids));
        }

        query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Hands every transaction of a sub-wallet over to its parent.
    ///
    /// The parent balance already includes them, so only the sub-wallet's
    /// own balance is cleared, without propagating. A root is left as is.
    pub async fn migrate_to_parent(&self, wallet_id: Uuid) -> ResultEngine<()> {
        let wallet = self.require_wallet(wallet_id).await?;
        let Some(parent_id) = wallet.parent_id() else {
            return Ok(());
        };

        transactions::Entity::update_many()
            .col_expr(
                transactions::Column::WalletId,
                Expr::value(parent_id.to_string()),
            )
            .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
            .exec(&self.database)
            .await?;

        self.update_amount(wallet_id, wallet.balance, CategoryKind::Expense, true)
            .await?;
        Ok(())
    }

    /// Writes `patch` over `current` and moves its balance contribution.
    ///
    /// On the same wallet a single net delta is applied. Moving to another
    /// wallet reverses the contribution on the old one and applies it on the
    /// new one.
    async fn apply_patch(
        &self,
        current: &Transaction,
        patch: &TransactionPatch,
        unlink: bool,
    ) -> ResultEngine<Transaction> {
        let mut next = current.clone();
        if let Some(wallet_id) = patch.wallet_id {
            next.wallet_id = wallet_id;
        }
        if let Some(category_id) = patch.category_id {
            next.category = self.require_category(category_id).await?;
        }
        if let Some(concept) = &patch.concept {
            next.concept = concept.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            next.amount = magnitude(amount)?;
        }
        if let Some(date) = patch.transaction_date {
            next.transaction_date = date;
        }
        if let Some(exclude) = patch.exclude_from_report {
            next.exclude_from_report = exclude;
        }
        if let Some(transfer_id) = patch.transfer_id {
            next.transfer_id = Some(transfer_id);
        }
        if unlink {
            next.transfer_id = None;
        }

        let (before, after) = (current.signed_amount(), next.signed_amount());
        let moves = if current.wallet_id == next.wallet_id {
            vec![(
                next.wallet_id,
                after.checked_sub(before).ok_or_else(out_of_range)?,
            )]
        } else {
            vec![
                (
                    current.wallet_id,
                    before.checked_neg().ok_or_else(out_of_range)?,
                ),
                (next.wallet_id, after),
            ]
        };
        for (wallet_id, delta) in &moves {
            self.check_adjustment(*wallet_id, *delta, true).await?;
        }

        let mut active = transactions::ActiveModel::from(&next);
        active.id = ActiveValue::Unchanged(next.id.to_string());
        active.update(&self.database).await?;

        for (wallet_id, delta) in moves {
            self.adjust_balance(wallet_id, delta, true).await?;
        }
        Ok(next)
    }

    /// Edits a transaction, mirroring the change on its transfer partner.
    ///
    /// For a transfer with a live partner, wallet and category changes are
    /// ignored and the rest of the patch is applied to both halves. When the
    /// partner is gone the link is dropped. Returns pre and post images,
    /// partner first.
    pub async fn update_transaction(
        &self,
        old: &Transaction,
        patch: TransactionPatch,
    ) -> ResultEngine<TransactionChanges> {
        let mut changes = TransactionChanges::default();
        let mut patch = patch;
        let mut unlink = false;

        if let Some(partner_id) = old.transfer_id {
            match self.transaction(partner_id).await? {
                None => unlink = true,
                Some(partner) => {
                    patch.wallet_id = None;
                    patch.category_id = None;
                    let updated = self.apply_patch(&partner, &patch.for_partner(), false).await?;
                    changes.old.push(partner);
                    changes.new.push(updated);
                }
            }
        }

        let updated = self.apply_patch(old, &patch, unlink).await?;
        changes.old.push(old.clone());
        changes.new.push(updated);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_parsing() {
        assert_eq!(MonthFilter::parse("202102"), MonthFilter::new(2021, 2));
        assert_eq!(MonthFilter::parse("202113"), None);
        assert_eq!(MonthFilter::parse("2021-02"), None);
        assert_eq!(MonthFilter::parse("21021"), None);
    }

    #[test]
    fn malformed_month_falls_back_to_current() {
        let current = MonthFilter::containing(Utc::now().date_naive());
        assert_eq!(MonthFilter::parse_or_current(Some("bad")), current);
        assert_eq!(MonthFilter::parse_or_current(None), current);
    }
}
