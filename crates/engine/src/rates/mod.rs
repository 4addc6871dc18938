//! Historical exchange rates.
//!
//! The engine never talks to a rate provider directly: it asks an
//! [`ExchangeRateSource`] for the rate of a `(from, to, date)` triple.
//! Historical rates never change once published, so any source can be
//! wrapped in a [`CachedRates`] to answer repeated lookups from memory.

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::CurrencyCode;

mod cache;
mod http;
mod memory;

pub use cache::CachedRates;
pub use http::HttpRates;
pub use memory::MemoryRates;

/// Rate lookup failures.
///
/// Only [`RateError::Unavailable`] is recoverable by callers: it means the
/// source could not be reached, and the converted total becomes unknown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error("exchange rate service unavailable: {0}")]
    Unavailable(String),
    #[error("no {from}->{to} rate for {on}")]
    Missing {
        from: CurrencyCode,
        to: CurrencyCode,
        on: NaiveDate,
    },
    #[error("invalid exchange rate response: {0}")]
    Invalid(String),
}

/// Resolves how many units of `to` one unit of `from` was worth on a date.
pub trait ExchangeRateSource: Send + Sync {
    fn rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        on: NaiveDate,
    ) -> impl Future<Output = Result<Decimal, RateError>> + Send;
}
