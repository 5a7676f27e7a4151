use engine::{Currency, Engine};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use worker::{Worker, WorkerOptions};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledger={level},worker={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = Engine::builder().database(db).build().await?;
    let worker = Worker::new(
        engine,
        WorkerOptions {
            default_currency: Currency::try_from(settings.engine.default_currency.as_str())?,
            seed_mode: settings.engine.seed_mode,
        },
    );

    let Some(server) = settings.server else {
        tracing::warn!("No server settings, nothing to serve");
        return Ok(());
    };

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    worker::run_with_listener(worker, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("Database ready");
    Ok(database)
}
