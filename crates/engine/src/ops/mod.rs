use sea_orm::DatabaseConnection;

use crate::{ResultEngine, categories::BasicCategories};

mod access;
mod balances;
mod categories;
mod field_checks;
mod transactions;
mod wallets;

pub use access::SENTINEL_ID;
pub use transactions::{MonthFilter, TransactionScope};
pub use wallets::WalletUpdate;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Ledger engine: the wallet and transaction stores plus the guards that
/// protect them.
///
/// Every store operation is a short sequence of single-row writes; only the
/// balance recompute runs inside a DB transaction.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    basic_categories: BasicCategories,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Global "Other" categories, guaranteed to exist once the engine is built.
    #[must_use]
    pub fn basic_categories(&self) -> BasicCategories {
        self.basic_categories
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`.
    ///
    /// The global categories are created here if missing, so the engine never
    /// has to create them lazily while serving requests.
    pub async fn build(self) -> ResultEngine<Engine> {
        let basic_categories = categories::ensure_basic_categories(&self.database).await?;
        Ok(Engine {
            database: self.database,
            basic_categories,
        })
    }
}
