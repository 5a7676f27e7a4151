//! Transaction categories.
//!
//! A category decides the sign a transaction contributes to its wallet.
//! Categories are either global (shared by every user) or owned by one user.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

/// Stored owner of global categories.
pub(crate) const GLOBAL_OWNER: &str = "-1";
/// Stored parent of top-level categories.
pub(crate) const NO_PARENT: &str = "-1";
/// Name of the fallback categories.
pub const BASIC_CATEGORY_NAME: &str = "Other";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        }
    }

    /// Signed contribution of a magnitude.
    #[must_use]
    pub fn signed(self, amount: Money) -> Money {
        match self {
            CategoryKind::Income => amount,
            CategoryKind::Expense => -amount,
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Income" => Ok(CategoryKind::Income),
            "Expense" => Ok(CategoryKind::Expense),
            other => Err(EngineError::KeyNotFound(format!("category kind {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryOwner {
    Global,
    User(String),
}

impl CategoryOwner {
    /// Whether `user_id` may use a category with this owner.
    #[must_use]
    pub fn allows(&self, user_id: &str) -> bool {
        match self {
            CategoryOwner::Global => true,
            CategoryOwner::User(owner) => owner == user_id,
        }
    }

    fn stored(&self) -> String {
        match self {
            CategoryOwner::Global => GLOBAL_OWNER.to_string(),
            CategoryOwner::User(owner) => owner.clone(),
        }
    }

    fn from_stored(value: String) -> Self {
        if value == GLOBAL_OWNER {
            CategoryOwner::Global
        } else {
            CategoryOwner::User(value)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub owner: CategoryOwner,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(owner: CategoryOwner, name: String, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            parent_id: None,
            name,
            kind,
        }
    }
}

/// Ids of the global "Other" categories used by seed and transfer
/// transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicCategories {
    pub income: Uuid,
    pub expense: Uuid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub parent_id: String,
    pub name: String,
    pub kind: String,
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

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.owner.stored()),
            parent_id: ActiveValue::Set(
                value
                    .parent_id
                    .map_or_else(|| NO_PARENT.to_string(), |id| id.to_string()),
            ),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let parent_id = if model.parent_id == NO_PARENT {
            None
        } else {
            Some(parse_uuid(&model.parent_id, "parent category")?)
        };
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            kind: CategoryKind::try_from(model.kind.as_str())?,
            owner: CategoryOwner::from_stored(model.user_id),
            parent_id,
            name: model.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sign() {
        let amount = Money::new(2000);
        assert_eq!(CategoryKind::Income.signed(amount), Money::new(2000));
        assert_eq!(CategoryKind::Expense.signed(amount), Money::new(-2000));
    }

    #[test]
    fn global_categories_are_usable_by_everyone() {
        assert!(CategoryOwner::Global.allows("anyone"));
        assert!(CategoryOwner::User("a".to_string()).allows("a"));
        assert!(!CategoryOwner::User("a".to_string()).allows("b"));
    }

    #[test]
    fn global_owner_is_stored_as_sentinel() {
        let category = Category::new(
            CategoryOwner::Global,
            BASIC_CATEGORY_NAME.to_string(),
            CategoryKind::Expense,
        );
        let active: ActiveModel = (&category).into();
        assert_eq!(active.user_id.unwrap(), GLOBAL_OWNER);
        assert_eq!(active.parent_id.unwrap(), NO_PARENT);
    }
}
