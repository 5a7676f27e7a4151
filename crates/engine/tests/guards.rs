use sea_orm::Database;

use engine::{CategoryKind, Currency, Engine, FieldError, Lineage, Resource, Wallet, WalletUpdate};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn root(engine: &Engine, user: &str, name: &str, currency: &str) -> Wallet {
    engine
        .add_wallet(
            user,
            name,
            0,
            Currency::try_from(currency).unwrap(),
            Lineage::Root,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn basic_categories_are_created_once() {
    let engine = engine().await;
    let first = engine.basic_categories();
    let again = engine.ensure_basic_categories().await.unwrap();
    assert_eq!(first, again);

    let income = engine.category(first.income).await.unwrap().unwrap();
    assert_eq!(income.kind, CategoryKind::Income);
    assert_eq!(income.name, "Other");
}

#[tokio::test]
async fn wallet_ownership() {
    let engine = engine().await;
    let wallet = root(&engine, "alice", "Cash", "USD").await;
    let id = wallet.id.to_string();

    let owned = engine.wallet_ownership("alice", &id).await.unwrap();
    assert!(owned.is_valid());
    assert_eq!(owned.value.map(|w| w.id), Some(wallet.id));

    let unknown = Uuid::new_v4().to_string();
    for (user, target) in [
        ("bob", id.as_str()),
        ("", id.as_str()),
        ("alice", "not-an-id"),
        ("alice", unknown.as_str()),
    ] {
        let checked = engine.wallet_ownership(user, target).await.unwrap();
        assert_eq!(
            checked.errors.get("wallet"),
            Some(FieldError::NotOwner(Resource::Wallet)),
            "{user} / {target}"
        );
    }
}

#[tokio::test]
async fn lineage_allows_a_single_generation() {
    let engine = engine().await;
    let parent = root(&engine, "alice", "Bank", "USD").await;

    let none = engine.wallet_lineage("alice", Some(" -1 ")).await.unwrap();
    assert!(none.is_valid());
    assert!(none.value.is_none());
    assert!(engine.wallet_lineage("alice", None).await.unwrap().value.is_none());

    let ok = engine
        .wallet_lineage("alice", Some(&parent.id.to_string()))
        .await
        .unwrap();
    assert!(ok.is_valid());

    let foreign = engine
        .wallet_lineage("bob", Some(&parent.id.to_string()))
        .await
        .unwrap();
    assert_eq!(foreign.errors.get("parent_id"), Some(FieldError::ParentNotOwned));

    let sub = engine
        .add_wallet(
            "alice",
            "Savings",
            0,
            parent.currency.clone(),
            Lineage::child_of(&parent).unwrap(),
        )
        .await
        .unwrap();
    let deeper = engine
        .wallet_lineage("alice", Some(&sub.id.to_string()))
        .await
        .unwrap();
    assert_eq!(deeper.errors.get("parent_id"), Some(FieldError::DepthExceeded));
}

#[tokio::test]
async fn currency_must_match_parent() {
    let engine = engine().await;
    let parent = root(&engine, "alice", "Bank", "MXN").await;

    let same = engine
        .validate_currency(Some("mxn"), Some(parent.id))
        .await
        .unwrap();
    assert!(same.is_valid());
    assert_eq!(same.value, "MXN");

    let other = engine
        .validate_currency(Some("USD"), Some(parent.id))
        .await
        .unwrap();
    assert_eq!(other.errors.get("currency"), Some(FieldError::CurrencyMismatch));

    let root_level = engine.validate_currency(Some("USD"), None).await.unwrap();
    assert!(root_level.is_valid());
}

#[tokio::test]
async fn wallet_names_are_unique_per_user() {
    let engine = engine().await;
    root(&engine, "alice", "Cash", "USD").await;

    let duplicate = engine
        .validate_wallet_name("alice", Some(" Cash "))
        .await
        .unwrap();
    assert_eq!(duplicate.errors.get("name"), Some(FieldError::DuplicateName));

    let blank = engine.validate_wallet_name("alice", Some("  ")).await.unwrap();
    assert_eq!(blank.errors.get("name"), Some(FieldError::EmptyName));

    let other_user = engine
        .validate_wallet_name("bob", Some("Cash"))
        .await
        .unwrap();
    assert!(other_user.is_valid());
}

#[tokio::test]
async fn categories_must_be_global_or_owned() {
    let engine = engine().await;
    let mine = engine
        .add_category("alice", "Rent", CategoryKind::Expense)
        .await
        .unwrap();
    let global = engine.basic_categories().expense.to_string();

    assert!(engine.validate_category("bob", &global).await.unwrap().is_valid());
    assert!(
        engine
            .validate_category("alice", &mine.id.to_string())
            .await
            .unwrap()
            .is_valid()
    );
    assert_eq!(
        engine
            .validate_category("bob", &mine.id.to_string())
            .await
            .unwrap()
            .errors
            .get("category"),
        Some(FieldError::CategoryNotOwned)
    );
    assert_eq!(
        engine
            .validate_category("bob", "missing")
            .await
            .unwrap()
            .errors
            .get("category"),
        Some(FieldError::CategoryNotFound)
    );
}

#[tokio::test]
async fn update_never_touches_balance_and_lists_roots_only() {
    let engine = engine().await;
    let parent = root(&engine, "alice", "Bank", "USD").await;
    let sub = engine
        .add_wallet(
            "alice",
            "Savings",
            0,
            parent.currency.clone(),
            Lineage::child_of(&parent).unwrap(),
        )
        .await
        .unwrap();
    engine.add_child(parent.id, sub.id).await.unwrap();
    engine.add_child(parent.id, sub.id).await.unwrap();

    let renamed = engine
        .update_wallet(
            parent.id,
            WalletUpdate {
                name: Some(" Main ".to_string()),
                icon_id: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Main");
    assert_eq!(renamed.icon_id, 4);
    assert_eq!(renamed.balance, parent.balance);
    assert_eq!(renamed.children, vec![sub.id]);

    let trees = engine.wallets("alice").await.unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].wallet.id, parent.id);
    assert_eq!(trees[0].children.len(), 1);
    assert_eq!(trees[0].children[0].id, sub.id);
}
