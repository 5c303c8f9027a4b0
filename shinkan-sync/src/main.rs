//! shinkan-sync operational binary
//!
//! Small admin surface around the engine's database: create/migrate the
//! schema, print store counts, list chapter guesses due for refresh. The
//! actual sync passes are driven in-process by the scheduler, not from
//! here.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "shinkan-sync", version, about = "shinkan database administration")]
struct Cli {
    /// Database file (overrides SHINKAN_DATABASE and the config file)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and bring its schema up to date
    Init,
    /// Print row counts per table
    Status,
    /// List manga identifiers whose chapter guess is due for refresh
    StaleGuesses,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let db_path = shinkan_common::config::resolve_database_path(cli.database.as_deref())?;
    let pool = shinkan_common::db::init::init_database(&db_path).await?;

    match cli.command {
        Command::Init => {
            info!("Database ready: {}", db_path.display());
        }
        Command::Status => {
            let counts = shinkan_common::db::queries::store_counts(&pool).await?;
            println!("media items:       {}", counts.media_items);
            println!("external ids:      {}", counts.external_ids);
            println!("user states:       {}", counts.user_states);
            println!("user lists:        {}", counts.user_lists);
            println!("list entries:      {}", counts.user_list_entries);
            println!("ln releases:       {}", counts.ln_releases);
            println!("chapter guesses:   {}", counts.chapter_guesses);
        }
        Command::StaleGuesses => {
            let now = chrono::Utc::now().timestamp();
            let stale = shinkan_sync::maintenance::stale_chapter_guesses(&pool, now).await?;
            for entry in &stale {
                println!(
                    "{} {} (last update {})",
                    entry.external_id.service, entry.external_id.service_id, entry.guess.last_update
                );
            }
            info!("{} guesses due for refresh", stale.len());
        }
    }

    Ok(())
}
