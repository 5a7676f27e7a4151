//! The module contains `Transaction` and the types used to create and edit
//! one.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, categories::Category, util::parse_uuid};

/// A single money movement against one wallet.
///
/// `amount` is a non-negative magnitude. The sign of the contribution to
/// the wallet balance comes from the category kind, see
/// [`Transaction::signed_amount`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub category: Category,
    pub concept: String,
    pub amount: Money,
    pub exclude_from_report: bool,
    pub transaction_date: NaiveDate,
    /// The other half of a transfer.
    pub transfer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        self.category.kind.signed(self.amount)
    }

    pub(crate) fn from_parts(model: Model, category: Category) -> ResultEngine<Self> {
        let transfer_id = model
            .transfer_id
            .as_deref()
            .map(|id| parse_uuid(id, "transfer"))
            .transpose()?;
        if model.amount < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "stored amount of transaction {} is negative",
                model.id
            )));
        }
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            user_id: model.user_id,
            category,
            concept: model.concept,
            amount: Money::new(model.amount),
            exclude_from_report: model.exclude_from_report,
            transaction_date: model.transaction_date,
            transfer_id,
            created_at: model.created_at,
        })
    }
}

/// Input of [`Engine::add_transaction`].
///
/// Fields are expected to be validated already; `amount` is stored as its
/// absolute value.
///
///  [`Engine::add_transaction`]: crate::Engine::add_transaction
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub user_id: String,
    pub wallet_id: Uuid,
    pub concept: String,
    pub amount: Money,
    pub transaction_date: NaiveDate,
    pub category_id: Uuid,
    pub exclude_from_report: bool,
}

/// Changed fields of a transaction edit. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionPatch {
    pub wallet_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub concept: Option<String>,
    pub amount: Option<Money>,
    pub transaction_date: Option<NaiveDate>,
    pub exclude_from_report: Option<bool>,
    /// Links the transaction to a transfer partner.
    pub transfer_id: Option<Uuid>,
}

impl TransactionPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The part of the patch that is mirrored on a transfer partner.
    pub(crate) fn for_partner(&self) -> Self {
        Self {
            wallet_id: None,
            category_id: None,
            transfer_id: None,
            ..self.clone()
        }
    }
}

/// Pre and post images of an edit, partner first and the edited
/// transaction last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionChanges {
    pub old: Vec<Transaction>,
    pub new: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub transfer_id: Option<String>,
    pub category_id: String,
    pub concept: String,
    pub amount: i64,
    pub exclude_from_report: bool,
    pub transaction_date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(value: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            transfer_id: ActiveValue::Set(value.transfer_id.map(|id| id.to_string())),
            category_id: ActiveValue::Set(value.category.id.to_string()),
            concept: ActiveValue::Set(value.concept.clone()),
            amount: ActiveValue::Set(value.amount.cents()),
            exclude_from_report: ActiveValue::Set(value.exclude_from_report),
            transaction_date: ActiveValue::Set(value.transaction_date),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{CategoryKind, CategoryOwner};

    #[test]
    fn partner_patch_drops_transfer_immutable_fields() {
        let patch = TransactionPatch {
            wallet_id: Some(Uuid::new_v4()),
            category_id: Some(Uuid::new_v4()),
            concept: Some("Rent".to_string()),
            amount: Some(Money::new(100)),
            ..Default::default()
        };

        let partner = patch.for_partner();
        assert_eq!(partner.wallet_id, None);
        assert_eq!(partner.category_id, None);
        assert_eq!(partner.concept.as_deref(), Some("Rent"));
        assert_eq!(partner.amount, Some(Money::new(100)));
        assert!(TransactionPatch::default().is_empty());
    }

    #[test]
    fn stored_negative_amount_is_rejected() {
        let category = Category::new(CategoryOwner::Global, "Other".into(), CategoryKind::Income);
        let model = Model {
            id: Uuid::new_v4().to_string(),
            user_id: "u".into(),
            wallet_id: Uuid::new_v4().to_string(),
            transfer_id: None,
            category_id: category.id.to_string(),
            concept: "x".into(),
            amount: -1,
            exclude_from_report: false,
            transaction_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            Transaction::from_parts(model, category),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
