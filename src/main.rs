use bookshelf::cli::{Cli, Command, DbAction, is_confirmed, run_db_action};
use bookshelf::db::BooksStorage;
use bookshelf::server::router::{ShelfState, shelf_router};
use bookshelf::service::{BookService, MetadataClient};
use clap::Parser;
use mimalloc::MiMalloc;
use std::io::Write;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(is_confirmed(&answer))
}

async fn manage_db(
    database_url: &str,
    action: DbAction,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if action.is_destructive() {
        println!("WARNING: this permanently deletes all data!");
        if !yes && !confirm(action.confirm_prompt())? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }
    let storage = BooksStorage::open(database_url).await?;
    println!("{}", run_db_action(&storage, database_url, action).await?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let cfg = &bookshelf::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    if let Some(Command::Db { action, yes }) = cli.command {
        return manage_db(&cfg.database_url, action, yes).await;
    }

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        api_key = cfg.metadata.api_key.is_some(),
        loglevel = %cfg.loglevel
    );

    let storage = BooksStorage::connect(&cfg.database_url).await?;
    info!(books = storage.count().await?, "database ready");

    let metadata = MetadataClient::new(cfg.metadata.clone(), cfg.proxy.as_ref())?;
    let books = BookService::new(storage, metadata);

    let state = ShelfState::new(books, cfg.secret_key.as_deref());
    let app = shelf_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
