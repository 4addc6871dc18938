//! Profit and loss over a date range.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, CurrencyCode, Movement, ResultEngine, aggregate::MovementAggregator,
    rates::ExchangeRateSource,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PLStatement {
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
    pub income: Amount,
    pub expenses: Amount,
    pub currency_code: CurrencyCode,
}

impl PLStatement {
    /// Split `movements` into income (non-negative total) and expenses
    /// (negative total).
    ///
    /// A movement whose total cannot be converted makes both sides unknown,
    /// since its sign is unknown too.
    pub async fn calculate<R>(
        aggregator: &MovementAggregator<'_, R>,
        movements: &[Movement],
        start_date: NaiveDate,
        end_date: NaiveDate,
        currency_code: CurrencyCode,
    ) -> ResultEngine<Self>
    where
        R: ExchangeRateSource,
    {
        let mut income = Amount::ZERO;
        let mut expenses = Amount::ZERO;
        for movement in movements {
            match aggregator.amount(movement, currency_code).await? {
                Amount::Known(value) if value < Decimal::ZERO => {
                    expenses += Amount::Known(value);
                }
                Amount::Known(value) => income += Amount::Known(value),
                Amount::Unknown => {
                    income = Amount::Unknown;
                    expenses = Amount::Unknown;
                }
            }
        }
        Ok(Self {
            start_date,
            end_date,
            income,
            expenses,
            currency_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        Transaction,
        rates::{MemoryRates, RateError},
    };

    struct Offline;

    impl ExchangeRateSource for Offline {
        async fn rate(
            &self,
            _from: CurrencyCode,
            _to: CurrencyCode,
            _on: NaiveDate,
        ) -> Result<Decimal, RateError> {
            Err(RateError::Unavailable("timeout".to_string()))
        }
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::try_from("USD").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn movement(id: i32, amounts: &[(Decimal, &str)]) -> Movement {
        Movement {
            id,
            name: format!("movement {id}"),
            transactions: amounts
                .iter()
                .enumerate()
                .map(|(i, (amount, currency))| Transaction {
                    id: id * 10 + i as i32,
                    amount: *amount,
                    timestamp: day(3),
                    name: "tx".to_string(),
                    currency_code: CurrencyCode::try_from(*currency).unwrap(),
                    account_id: 1,
                    movement_id: Some(id),
                    account_balance: Decimal::ZERO,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn splits_income_and_expenses() {
        let rates = MemoryRates::new();
        let aggregator = MovementAggregator::new(&rates);
        let movements = vec![
            movement(1, &[(dec!(100), "USD"), (dec!(-40), "USD")]),
            movement(2, &[(dec!(-25), "USD")]),
            movement(3, &[(dec!(10), "USD"), (dec!(-10), "USD")]),
        ];
        let pl = PLStatement::calculate(&aggregator, &movements, day(1), day(31), usd())
            .await
            .unwrap();
        assert_eq!(pl.income, Amount::Known(dec!(60)));
        assert_eq!(pl.expenses, Amount::Known(dec!(-25)));
        assert_eq!(pl.start_date, day(1));
        assert_eq!(pl.end_date, day(31));
    }

    #[tokio::test]
    async fn empty_range_is_zero() {
        let rates = MemoryRates::new();
        let aggregator = MovementAggregator::new(&rates);
        let pl = PLStatement::calculate(&aggregator, &[], day(1), day(2), usd())
            .await
            .unwrap();
        assert_eq!(pl.income, Amount::ZERO);
        assert_eq!(pl.expenses, Amount::ZERO);
    }

    #[tokio::test]
    async fn unconvertible_movement_makes_totals_unknown() {
        let rates = Offline;
        let aggregator = MovementAggregator::new(&rates);
        let movements = vec![
            movement(1, &[(dec!(100), "USD")]),
            movement(2, &[(dec!(-5), "EUR")]),
        ];
        let pl = PLStatement::calculate(&aggregator, &movements, day(1), day(31), usd())
            .await
            .unwrap();
        assert_eq!(pl.income, Amount::Unknown);
        assert_eq!(pl.expenses, Amount::Unknown);
    }
}
