//! Mapping of engine records to wire views.

use api_types::{
    transaction::{CategoryView, TransactionChangesView, TransactionView},
    wallet::{WalletView, WalletsView},
};
use engine::{
    Category, CategoryOwner, SENTINEL_ID, Transaction, TransactionChanges, Wallet, WalletTree,
};

pub(crate) fn map_wallet(wallet: &Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        user_id: wallet.user_id.clone(),
        name: wallet.name.clone(),
        money: wallet.balance.to_major(),
        currency: wallet.currency.code().to_string(),
        icon_id: wallet.icon_id,
        parent_id: wallet
            .parent_id()
            .map_or_else(|| SENTINEL_ID.to_string(), |id| id.to_string()),
        child_id: wallet.children.clone(),
        children: Vec::new(),
        created_at: wallet.created_at,
    }
}

pub(crate) fn map_wallet_trees(trees: &[WalletTree]) -> WalletsView {
    WalletsView {
        wallets: trees
            .iter()
            .map(|tree| WalletView {
                children: tree.children.iter().map(map_wallet).collect(),
                ..map_wallet(&tree.wallet)
            })
            .collect(),
    }
}

fn map_category(category: &Category) -> CategoryView {
    CategoryView {
        id: category.id,
        user_id: match &category.owner {
            CategoryOwner::Global => SENTINEL_ID.to_string(),
            CategoryOwner::User(owner) => owner.clone(),
        },
        parent_id: category
            .parent_id
            .map_or_else(|| SENTINEL_ID.to_string(), |id| id.to_string()),
        name: category.name.clone(),
        kind: category.kind.as_str().to_string(),
    }
}

pub(crate) fn map_transaction(transaction: &Transaction) -> TransactionView {
    TransactionView {
        id: transaction.id,
        user_id: transaction.user_id.clone(),
        wallet_id: transaction.wallet_id,
        category: map_category(&transaction.category),
        concept: transaction.concept.clone(),
        amount: transaction.amount.to_major(),
        exclude_from_report: transaction.exclude_from_report,
        transaction_date: transaction.transaction_date,
        transfer_id: transaction.transfer_id,
        created_at: transaction.created_at,
    }
}

pub(crate) fn map_transactions(transactions: &[Transaction]) -> Vec<TransactionView> {
    transactions.iter().map(map_transaction).collect()
}

pub(crate) fn map_changes(changes: &TransactionChanges) -> TransactionChangesView {
    TransactionChangesView {
        old: map_transactions(&changes.old),
        new: map_transactions(&changes.new),
    }
}
