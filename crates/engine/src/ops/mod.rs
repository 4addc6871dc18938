use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, aggregate::MovementAggregator, rates::ExchangeRateSource};

mod accounts;
mod files;
mod movements;
mod transactions;

pub use movements::MovementQuery;
pub use transactions::{TransactionQuery, transaction_args};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Repository and query entry point over one database and one rate source.
#[derive(Debug)]
pub struct Engine<R> {
    database: DatabaseConnection,
    rates: R,
}

impl<R> Engine<R>
where
    R: ExchangeRateSource,
{
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder<R> {
        EngineBuilder::default()
    }

    pub fn rates(&self) -> &R {
        &self.rates
    }

    /// Aggregator converting through this engine's rate source.
    pub fn aggregator(&self) -> MovementAggregator<'_, R> {
        MovementAggregator::new(&self.rates)
    }
}

/// The builder for `Engine`
pub struct EngineBuilder<R> {
    database: DatabaseConnection,
    rates: Option<R>,
}

impl<R> Default for EngineBuilder<R> {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            rates: None,
        }
    }
}

impl<R> EngineBuilder<R>
where
    R: ExchangeRateSource,
{
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder<R> {
        self.database = db;
        self
    }

    /// Pass the required exchange rate source
    pub fn rates(mut self, rates: R) -> EngineBuilder<R> {
        self.rates = Some(rates);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine<R>> {
        let rates = self.rates.ok_or_else(|| {
            EngineError::Configuration("an exchange rate source is required".to_string())
        })?;
        Ok(Engine {
            database: self.database,
            rates,
        })
    }
}
