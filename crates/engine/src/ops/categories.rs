use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    ResultEngine,
    categories::{
        self, BASIC_CATEGORY_NAME, BasicCategories, Category, CategoryKind, CategoryOwner,
        GLOBAL_OWNER,
    },
};

use super::Engine;

/// Get-or-create the global "Other" category of `kind`.
async fn ensure_basic_category<C: ConnectionTrait>(
    db: &C,
    kind: CategoryKind,
) -> ResultEngine<Uuid> {
    let existing = categories::Entity::find()
        .filter(categories::Column::UserId.eq(GLOBAL_OWNER))
        .filter(categories::Column::Name.eq(BASIC_CATEGORY_NAME))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .one(db)
        .await?;
    if let Some(model) = existing {
        return Ok(Category::try_from(model)?.id);
    }

    let category = Category::new(
        CategoryOwner::Global,
        BASIC_CATEGORY_NAME.to_string(),
        kind,
    );
    categories::ActiveModel::from(&category).insert(db).await?;
    tracing::info!(
        category_id = %category.id,
        kind = kind.as_str(),
        "created global category"
    );
    Ok(category.id)
}

pub(super) async fn ensure_basic_categories<C: ConnectionTrait>(
    db: &C,
) -> ResultEngine<BasicCategories> {
    Ok(BasicCategories {
        income: ensure_basic_category(db, CategoryKind::Income).await?,
        expense: ensure_basic_category(db, CategoryKind::Expense).await?,
    })
}

impl Engine {
    /// Makes sure the global "Other" categories exist and returns their ids.
    ///
    /// Idempotent; the engine already runs it once when built.
    pub async fn ensure_basic_categories(&self) -> ResultEngine<BasicCategories> {
        ensure_basic_categories(&self.database).await
    }

    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Option<Category>> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// Adds a category owned by `user_id`.
    pub async fn add_category(
        &self,
        user_id: &str,
        name: &str,
        kind: CategoryKind,
    ) -> ResultEngine<Category> {
        let category = Category::new(
            CategoryOwner::User(user_id.to_string()),
            name.trim().to_string(),
            kind,
        );
        categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        Ok(category)
    }
}
