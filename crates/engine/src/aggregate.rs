//! Currency-dependent movement properties.
//!
//! Everything here runs after the storage query: converting amounts needs a
//! historical rate per transaction date, which the database cannot provide.
//! Filtering and sorting by amount therefore only see the movements that were
//! already fetched, i.e. a single page when the query was paginated.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, CurrencyCode, EngineError, Movement, MovementField, ResultEngine, Transaction,
    rates::{ExchangeRateSource, RateError},
};

/// Bounds on a movement's converted amount. Both are strict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AmountFilter {
    pub amount_gt: Option<Decimal>,
    pub amount_lt: Option<Decimal>,
}

impl AmountFilter {
    /// An unknown amount never satisfies a bound.
    pub fn matches(&self, amount: Amount) -> bool {
        if self.amount_gt.is_none() && self.amount_lt.is_none() {
            return true;
        }
        let Amount::Known(value) = amount else {
            return false;
        };
        self.amount_gt.is_none_or(|gt| value > gt) && self.amount_lt.is_none_or(|lt| value < lt)
    }
}

/// A movement together with its derived, currency-dependent values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSummary {
    pub id: i32,
    pub name: String,
    pub earliest_timestamp: Option<NaiveDate>,
    pub latest_timestamp: Option<NaiveDate>,
    pub transactions: Vec<Transaction>,
    /// Total of the movement in each of its own currencies.
    pub amounts: BTreeMap<CurrencyCode, Amount>,
    /// Total in the requested currency.
    pub amount: Amount,
    pub currency_code: CurrencyCode,
}

/// Computes converted totals of movements through an [`ExchangeRateSource`].
#[derive(Debug)]
pub struct MovementAggregator<'a, R> {
    rates: &'a R,
}

impl<'a, R> MovementAggregator<'a, R>
where
    R: ExchangeRateSource,
{
    pub fn new(rates: &'a R) -> Self {
        Self { rates }
    }

    /// Sum of the member transactions converted to `currency`, each at the
    /// rate of its own date.
    ///
    /// An unreachable rate source yields [`Amount::Unknown`]; any other rate
    /// failure is an error.
    pub async fn amount(&self, movement: &Movement, currency: CurrencyCode) -> ResultEngine<Amount> {
        let mut total = Decimal::ZERO;
        for tx in &movement.transactions {
            let converted = if tx.currency_code == currency {
                tx.amount
            } else {
                let rate = match self
                    .rates
                    .rate(tx.currency_code, currency, tx.timestamp)
                    .await
                {
                    Ok(rate) => rate,
                    Err(RateError::Unavailable(reason)) => {
                        tracing::warn!(
                            movement_id = movement.id,
                            from = %tx.currency_code,
                            to = %currency,
                            on = %tx.timestamp,
                            "exchange rate unavailable: {reason}"
                        );
                        return Ok(Amount::Unknown);
                    }
                    Err(err) => return Err(EngineError::Conversion(err.to_string())),
                };
                tx.amount.checked_mul(rate).ok_or_else(|| {
                    EngineError::Conversion(format!("overflow converting transaction {}", tx.id))
                })?
            };
            total = total.checked_add(converted).ok_or_else(|| {
                EngineError::Conversion(format!("overflow summing movement {}", movement.id))
            })?;
        }
        Ok(Amount::Known(total))
    }

    /// Total of the movement in each currency it involves.
    ///
    /// Every entry converts *all* members into that currency, so a movement
    /// spanning two currencies needs rates; a single-currency movement never
    /// does.
    pub async fn amounts(&self, movement: &Movement) -> ResultEngine<BTreeMap<CurrencyCode, Amount>> {
        let mut amounts = BTreeMap::new();
        for currency in movement.currencies() {
            amounts.insert(currency, self.amount(movement, currency).await?);
        }
        Ok(amounts)
    }

    pub async fn summarize(
        &self,
        movement: Movement,
        currency: CurrencyCode,
    ) -> ResultEngine<MovementSummary> {
        let (earliest_timestamp, latest_timestamp) = if movement.transactions.is_empty() {
            (None, None)
        } else {
            (
                Some(movement.earliest_timestamp()?),
                Some(movement.latest_timestamp()?),
            )
        };
        let amounts = self.amounts(&movement).await?;
        let amount = self.amount(&movement, currency).await?;
        Ok(MovementSummary {
            id: movement.id,
            name: movement.name,
            earliest_timestamp,
            latest_timestamp,
            transactions: movement.transactions,
            amounts,
            amount,
            currency_code: currency,
        })
    }

    /// Summarize `movements`, drop those outside `filter` and, when sorting
    /// by amount, reorder them. Unknown amounts always sort last.
    ///
    /// With [`MovementField::Timestamp`] the input order is kept.
    pub async fn filter_and_sort(
        &self,
        movements: Vec<Movement>,
        filter: &AmountFilter,
        sort_by: MovementField,
        is_descending: bool,
        currency: CurrencyCode,
    ) -> ResultEngine<Vec<MovementSummary>> {
        let mut out = Vec::with_capacity(movements.len());
        for movement in movements {
            let summary = self.summarize(movement, currency).await?;
            if filter.matches(summary.amount) {
                out.push(summary);
            }
        }

        if sort_by == MovementField::Amount {
            out.sort_by(|a, b| match (a.amount, b.amount) {
                (Amount::Known(x), Amount::Known(y)) if is_descending => y.cmp(&x),
                (x, y) => x.cmp_unknown_last(&y),
            });
        }

        Ok(out)
    }
}
