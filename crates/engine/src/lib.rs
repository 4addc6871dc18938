//! Query and aggregation engine of a personal-finance ledger.
//!
//! Transactions are dated, signed entries on accounts; movements group the
//! transactions of one economic event. The engine lists both through
//! declarative, schema-derived filters and converts movement totals into a
//! chosen currency at historical rates, down to a profit and loss statement.

pub use accounts::Account;
pub use aggregate::{AmountFilter, MovementAggregator, MovementSummary};
pub use amount::Amount;
pub use currency::CurrencyCode;
pub use error::EngineError;
pub use files::File;
pub use movements::{Movement, MovementField};
pub use ops::{Engine, EngineBuilder, MovementQuery, TransactionQuery, transaction_args};
pub use statement::PLStatement;
pub use transactions::{TRANSACTION_SCHEMA, Transaction, TransactionNew};

mod accounts;
mod aggregate;
mod amount;
mod currency;
mod error;
mod files;
mod movements;
mod ops;
pub mod query;
pub mod rates;
mod statement;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
