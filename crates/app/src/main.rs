use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use engine::{
    AmountFilter, CurrencyCode, Engine, MovementField, MovementQuery, TransactionQuery,
    rates::{CachedRates, HttpRates},
    transaction_args,
};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use serde::Serialize;
use settings::Database;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "ledgerly", version, about = "Query a ledgerly database")]
struct Cli {
    /// Optional settings file path (TOML).
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List transactions.
    Transactions {
        /// Query arguments as `name=value` pairs joined by `&`,
        /// e.g. `amount__ge=50&amount__ge__abs=true&per_page=20`.
        /// Names and values are percent-decoded; `+` stays literal.
        #[arg(long, default_value = "")]
        query: String,
    },
    /// List movements with their totals in a currency.
    Movements {
        #[arg(long)]
        currency: CurrencyCode,
        /// Earliest transaction on or after this date.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Earliest transaction before this date.
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 0)]
        per_page: u64,
        /// `timestamp` or `amount`.
        #[arg(long, default_value = "timestamp")]
        sort_by: MovementField,
        #[arg(long)]
        ascending: bool,
        #[arg(long)]
        amount_gt: Option<Decimal>,
        #[arg(long)]
        amount_lt: Option<Decimal>,
    },
    /// Profit and loss of the movements starting in `[start, end)`.
    Pl {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        currency: CurrencyCode,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerly={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let rates = HttpRates::with_timeout(
        settings.rates.base_url.clone(),
        Duration::from_secs(settings.rates.timeout_secs),
    )?;
    let engine = Engine::builder()
        .database(db)
        .rates(CachedRates::new(rates))
        .build()
        .await?;
    tracing::debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Transactions { query } => {
            let args = transaction_args().parse(parse_query_string(&query)?)?;
            let txs = engine
                .list_transactions(&TransactionQuery::from_args(args)?)
                .await?;
            print_json(&txs)?;
        }
        Command::Movements {
            currency,
            start,
            end,
            search,
            page,
            per_page,
            sort_by,
            ascending,
            amount_gt,
            amount_lt,
        } => {
            let query = MovementQuery {
                page,
                per_page,
                start_date: start,
                end_date: end,
                search,
                is_descending: !ascending,
                sort_by,
                ..MovementQuery::default()
            };
            let filter = AmountFilter {
                amount_gt,
                amount_lt,
            };
            let movements = engine.list_movements(&query, &filter, currency).await?;
            print_json(&movements)?;
        }
        Command::Pl {
            start,
            end,
            currency,
        } => {
            let statement = engine.pl_statement(start, end, currency).await?;
            print_json(&statement)?;
        }
    }

    Ok(())
}

/// Split `a=1&b=2` into percent-decoded pairs. Empty segments are skipped.
fn parse_query_string(query: &str) -> Result<Vec<(String, String)>, BoxError> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(String, String), BoxError> {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((
                urlencoding::decode(name)?.into_owned(),
                urlencoding::decode(value)?.into_owned(),
            ))
        })
        .collect()
}

fn print_json<T>(value: &T) -> Result<(), BoxError>
where
    T: Serialize,
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn parse_database(config: &settings::Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
