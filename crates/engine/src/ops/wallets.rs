use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine, Wallet,
    wallet_children,
    wallets::{self, Lineage, WalletTree},
};

use super::Engine;

/// Editable wallet fields. The balance is never part of an update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletUpdate {
    pub name: Option<String>,
    pub currency: Option<Currency>,
    pub icon_id: Option<i32>,
}

impl WalletUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.currency.is_none() && self.icon_id.is_none()
    }
}

impl Engine {
    async fn children_of(&self, parent_id: Uuid) -> ResultEngine<Vec<Uuid>> {
        wallet_children::Entity::find()
            .filter(wallet_children::Column::ParentId.eq(parent_id.to_string()))
            .order_by_asc(wallet_children::Column::ChildId)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|link| crate::util::parse_uuid(&link.child_id, "child wallet"))
            .collect()
    }

    async fn with_children(&self, model: wallets::Model) -> ResultEngine<Wallet> {
        let mut wallet = Wallet::try_from(model)?;
        wallet.children = self.children_of(wallet.id).await?;
        Ok(wallet)
    }

    /// Wallet by id, with its child references.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Option<Wallet>> {
        match wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
        {
            Some(model) => Ok(Some(self.with_children(model).await?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn require_wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        self.wallet(wallet_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("wallet {wallet_id}")))
    }

    /// A wallet of `user_id` named exactly `name`, at any hierarchy level.
    pub async fn wallet_by_name(&self, user_id: &str, name: &str) -> ResultEngine<Option<Wallet>> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::Name.eq(name))
            .one(&self.database)
            .await?
            .map(Wallet::try_from)
            .transpose()
    }

    /// Inserts a wallet with a zero balance.
    ///
    /// No validation happens here: guards and field checks run first. A
    /// sub-wallet still has to be linked with [`Engine::add_child`].
    pub async fn add_wallet(
        &self,
        user_id: &str,
        name: &str,
        icon_id: i32,
        currency: Currency,
        lineage: Lineage,
    ) -> ResultEngine<Wallet> {
        let wallet = Wallet::new(
            user_id.to_string(),
            name.trim().to_string(),
            currency,
            icon_id,
            lineage,
        );
        wallets::ActiveModel::from(&wallet)
            .insert(&self.database)
            .await?;
        Ok(wallet)
    }

    pub async fn add_child(&self, parent_id: Uuid, child_id: Uuid) -> ResultEngine<()> {
        let existing =
            wallet_children::Entity::find_by_id((parent_id.to_string(), child_id.to_string()))
                .one(&self.database)
                .await?;
        if existing.is_none() {
            wallet_children::ActiveModel {
                parent_id: ActiveValue::Set(parent_id.to_string()),
                child_id: ActiveValue::Set(child_id.to_string()),
            }
            .insert(&self.database)
            .await?;
        }
        Ok(())
    }

    pub async fn remove_child(&self, parent_id: Uuid, child_id: Uuid) -> ResultEngine<()> {
        wallet_children::Entity::delete_many()
            .filter(wallet_children::Column::ParentId.eq(parent_id.to_string()))
            .filter(wallet_children::Column::ChildId.eq(child_id.to_string()))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Deletes a wallet and returns its last snapshot.
    ///
    /// - A sub-wallet hands its transactions over to the parent, whose
    ///   balance already contains them.
    /// - A root loses its own transactions.
    /// - Sub-wallets are deleted together with their transactions.
    pub async fn delete_wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let wallet = self.require_wallet(wallet_id).await?;

        match wallet.lineage {
            Lineage::Child { .. } => self.migrate_to_parent(wallet_id).await?,
            Lineage::Root => {
                self.delete_all_transactions(wallet_id).await?;
            }
        }

        for child_id in &wallet.children {
            self.delete_all_transactions(*child_id).await?;
            wallets::Entity::delete_by_id(child_id.to_string())
                .exec(&self.database)
                .await?;
        }
        wallet_children::Entity::delete_many()
            .filter(wallet_children::Column::ParentId.eq(wallet_id.to_string()))
            .exec(&self.database)
            .await?;

        if let Some(parent_id) = wallet.parent_id() {
            self.remove_child(parent_id, wallet_id).await?;
        }

        wallets::Entity::delete_by_id(wallet_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(wallet)
    }

    /// Top-level wallets of a user with their sub-wallets, oldest first.
    pub async fn wallets(&self, user_id: &str) -> ResultEngine<Vec<WalletTree>> {
        let roots = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::ParentId.is_null())
            .order_by_asc(wallets::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut trees = Vec::with_capacity(roots.len());
        for model in roots {
            let wallet = self.with_children(model).await?;
            let mut children = Vec::with_capacity(wallet.children.len());
            for child_id in &wallet.children {
                if let Some(child) = self.wallet(*child_id).await? {
                    children.push(child);
                }
            }
            children.sort_by_key(|child| child.created_at);
            trees.push(WalletTree { wallet, children });
        }
        Ok(trees)
    }

    /// Applies name, currency and icon changes and returns the new state.
    pub async fn update_wallet(
        &self,
        wallet_id: Uuid,
        update: WalletUpdate,
    ) -> ResultEngine<Wallet> {
        if update.is_empty() {
            return self.require_wallet(wallet_id).await;
        }

        let mut active = wallets::ActiveModel {
            id: ActiveValue::Unchanged(wallet_id.to_string()),
            ..Default::default()
        };
        if let Some(name) = update.name {
            active.name = ActiveValue::Set(name.trim().to_string());
        }
        if let Some(currency) = update.currency {
            active.currency = ActiveValue::Set(currency.code().to_string());
        }
        if let Some(icon_id) = update.icon_id {
            active.icon_id = ActiveValue::Set(icon_id);
        }
        let model = active.update(&self.database).await?;
        self.with_children(model).await
    }
}
