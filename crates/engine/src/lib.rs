//! Ledger engine: wallets with running balances, transactions, and the
//! guards and validators that keep both consistent per user.

pub use categories::{BasicCategories, Category, CategoryKind, CategoryOwner};
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, MonthFilter, SENTINEL_ID, TransactionScope, WalletUpdate};
pub use transactions::{NewTransaction, Transaction, TransactionChanges, TransactionPatch};
pub use validation::{Checked, FieldError, FieldErrors, Resource};
pub use wallets::{Lineage, Wallet, WalletTree};

pub mod categories;
mod currency;
mod error;
mod money;
mod ops;
pub mod transactions;
mod util;
pub mod validation;
pub mod wallet_children;
pub mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
