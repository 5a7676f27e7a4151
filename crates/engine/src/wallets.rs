//! The module contains `Wallet` struct and its implementation.

use chrono::{DateTime, Utc};

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine,
    util::{model_currency, parse_uuid},
};

/// Position of a wallet in the two-level hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lineage {
    /// A top-level wallet. Only roots can have children.
    Root,
    /// A sub-wallet; its parent is always a root.
    Child { parent_id: Uuid },
}

impl Lineage {
    /// Lineage of a new sub-wallet of `parent`.
    ///
    /// Fails when `parent` is itself a sub-wallet.
    pub fn child_of(parent: &Wallet) -> ResultEngine<Self> {
        match parent.lineage {
            Lineage::Root => Ok(Lineage::Child {
                parent_id: parent.id,
            }),
            Lineage::Child { .. } => Err(EngineError::InvalidLineage(format!(
                "wallet {} is already a subwallet",
                parent.id
            ))),
        }
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<Uuid> {
        match self {
            Lineage::Root => None,
            Lineage::Child { parent_id } => Some(*parent_id),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Lineage::Root)
    }
}

/// A wallet.
///
/// A wallet is a named ledger owned by a single user: a bank account, a
/// piggy bank or an envelope inside one of those. `balance` is a running
/// total kept in sync with the transactions that reference the wallet and,
/// for a root, with the transactions of its sub-wallets too.
#[derive(Clone, Debug, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub currency: Currency,
    pub icon_id: i32,
    pub balance: Money,
    pub lineage: Lineage,
    /// Sub-wallets, only populated for roots.
    pub children: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(
        user_id: String,
        name: String,
        currency: Currency,
        icon_id: i32,
        lineage: Lineage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            currency,
            icon_id,
            balance: Money::ZERO,
            lineage,
            children: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<Uuid> {
        self.lineage.parent_id()
    }
}

/// A root wallet with its sub-wallets loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletTree {
    pub wallet: Wallet,
    pub children: Vec<Wallet>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub currency: String,
    pub icon_id: i32,
    pub balance: i64,
    pub parent_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            icon_id: ActiveValue::Set(value.icon_id),
            balance: ActiveValue::Set(value.balance.cents()),
            parent_id: ActiveValue::Set(value.parent_id().map(|id| id.to_string())),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    /// Children are not stored on the row; they are filled in by the store.
    fn try_from(model: Model) -> ResultEngine<Self> {
        let lineage = match model.parent_id.as_deref() {
            None => Lineage::Root,
            Some(parent) => Lineage::Child {
                parent_id: parse_uuid(parent, "parent wallet")?,
            },
        };
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            currency: model_currency(&model.currency)?,
            user_id: model.user_id,
            name: model.name,
            icon_id: model.icon_id,
            balance: Money::new(model.balance),
            lineage,
            children: Vec::new(),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(lineage: Lineage) -> Wallet {
        Wallet::new(
            "user-1".to_string(),
            "Cash".to_string(),
            Currency::try_from("USD").unwrap(),
            0,
            lineage,
        )
    }

    #[test]
    fn new_wallet_starts_empty() {
        let wallet = wallet(Lineage::Root);
        assert_eq!(wallet.balance, Money::ZERO);
        assert!(wallet.children.is_empty());
        assert_eq!(wallet.parent_id(), None);
    }

    #[test]
    fn child_of_root() {
        let parent = wallet(Lineage::Root);
        let lineage = Lineage::child_of(&parent).unwrap();
        assert_eq!(lineage.parent_id(), Some(parent.id));
    }

    #[test]
    fn child_of_child_is_rejected() {
        let root = wallet(Lineage::Root);
        let child = wallet(Lineage::child_of(&root).unwrap());
        assert!(matches!(
            Lineage::child_of(&child),
            Err(EngineError::InvalidLineage(_))
        ));
    }

    #[test]
    fn model_round_trip_keeps_lineage() {
        let root = wallet(Lineage::Root);
        let mut child = wallet(Lineage::child_of(&root).unwrap());
        child.balance = Money::new(-2000);

        let active: ActiveModel = (&child).into();
        let model = Model {
            id: active.id.unwrap(),
            user_id: active.user_id.unwrap(),
            name: active.name.unwrap(),
            currency: active.currency.unwrap(),
            icon_id: active.icon_id.unwrap(),
            balance: active.balance.unwrap(),
            parent_id: active.parent_id.unwrap(),
            created_at: active.created_at.unwrap(),
        };

        assert_eq!(Wallet::try_from(model).unwrap(), child);
    }
}
