use clap::{Parser, Subcommand};
use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

/// Apply or inspect the ledgerly schema.
#[derive(Debug, Parser)]
#[command(name = "ledgerly-migrate", version)]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./ledgerly.db?mode=rwc")]
    database_url: String,
    #[command(subcommand)]
    command: Option<Step>,
}

#[derive(Debug, Subcommand)]
enum Step {
    /// Apply pending migrations, all of them unless `--steps` is given.
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations, all of them unless `--steps` is given.
    Down {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Drop every table and apply all migrations again.
    Fresh,
    /// Print which migrations are applied.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.command.unwrap_or(Step::Up { steps: None }) {
        Step::Up { steps } => Migrator::up(&db, steps).await?,
        Step::Down { steps } => Migrator::down(&db, steps).await?,
        Step::Fresh => Migrator::fresh(&db).await?,
        Step::Status => Migrator::status(&db).await?,
    }

    Ok(())
}
