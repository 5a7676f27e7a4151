use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{CategoryKind, Engine};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the ledger (schema, categories, balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./ledger.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    /// Create the global "Other" categories if missing.
    BootstrapCategories,
    /// Rebuild every wallet balance of a user from its transactions.
    RecomputeBalances(RecomputeArgs),
    /// Add a category owned by a user.
    AddCategory(AddCategoryArgs),
}

#[derive(Args, Debug)]
struct RecomputeArgs {
    #[arg(long)]
    user: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Income,
    Expense,
}

impl From<Kind> for CategoryKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => CategoryKind::Income,
            Kind::Expense => CategoryKind::Expense,
        }
    }
}

#[derive(Args, Debug)]
struct AddCategoryArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    name: String,
    #[arg(long, value_enum)]
    kind: Kind,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Migrate => println!("database is up to date"),
        Command::BootstrapCategories => {
            let engine = Engine::builder().database(db).build().await?;
            let basic = engine.ensure_basic_categories().await?;
            println!("income category: {}", basic.income);
            println!("expense category: {}", basic.expense);
        }
        Command::RecomputeBalances(args) => {
            let engine = Engine::builder().database(db).build().await?;
            let wallets = engine.recompute_balances(&args.user).await?;
            if wallets.is_empty() {
                eprintln!("no wallets for user: {}", args.user);
                std::process::exit(1);
            }
            for wallet in wallets {
                println!(
                    "{} ({}): {} {}",
                    wallet.name,
                    wallet.id,
                    wallet.balance,
                    wallet.currency.code()
                );
            }
        }
        Command::AddCategory(args) => {
            if args.name.trim().is_empty() {
                eprintln!("category name must not be empty");
                std::process::exit(2);
            }
            let engine = Engine::builder().database(db).build().await?;
            let category = engine
                .add_category(&args.user, &args.name, args.kind.into())
                .await?;
            println!("created category: {} ({})", category.name, category.id);
        }
    }

    Ok(())
}
