use crate::db::BooksStorage;
use crate::error::ShelfError;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf")]
#[command(about = "Personal book collection manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Database management
    Db {
        #[command(subcommand)]
        action: DbAction,
        /// Skip the confirmation prompt for destructive actions
        #[arg(long, short, global = true)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum DbAction {
    /// Create tables if missing
    Init,
    /// Drop all tables
    Drop,
    /// Drop and recreate all tables
    Reset,
    /// Show database information
    Info,
}

impl DbAction {
    pub fn is_destructive(self) -> bool {
        matches!(self, DbAction::Drop | DbAction::Reset)
    }

    pub fn confirm_prompt(self) -> &'static str {
        match self {
            DbAction::Drop => "Are you sure you want to drop all tables? Type 'yes' to confirm: ",
            DbAction::Reset => {
                "Are you sure you want to reset the database? Type 'yes' to confirm: "
            }
            DbAction::Init | DbAction::Info => "",
        }
    }
}

/// Case-insensitive `yes`, surrounding whitespace ignored.
pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Execute `action` and return the report to print.
pub async fn run_db_action(
    storage: &BooksStorage,
    database_url: &str,
    action: DbAction,
) -> Result<String, ShelfError> {
    match action {
        DbAction::Init => {
            storage.init_schema().await?;
            Ok("Database initialization complete.".to_string())
        }
        DbAction::Drop => {
            storage.drop_schema().await?;
            Ok("Database tables dropped.".to_string())
        }
        DbAction::Reset => {
            storage.reset_schema().await?;
            Ok("Database reset complete.".to_string())
        }
        DbAction::Info => {
            let info = storage.info().await?;
            let count = info.book_count.map_or_else(
                || "Unable to query (tables may not exist)".to_string(),
                |n| n.to_string(),
            );
            let tables = if info.tables.is_empty() {
                "None".to_string()
            } else {
                info.tables.join(", ")
            };
            Ok(format!(
                "URI: {database_url}\nBook count: {count}\nTables: {tables}"
            ))
        }
    }
}
