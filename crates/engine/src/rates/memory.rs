use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::CurrencyCode;

use super::{ExchangeRateSource, RateError};

/// Rates known up front, keyed by currency pair.
///
/// Each pair holds a list of `(effective date, rate)`; a lookup uses the most
/// recent rate effective on or before the requested date. Handy offline and
/// in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryRates {
    rates: HashMap<(CurrencyCode, CurrencyCode), Vec<(NaiveDate, Decimal)>>,
}

impl MemoryRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the `from -> to` rate effective from `since`.
    pub fn with_rate(
        mut self,
        from: CurrencyCode,
        to: CurrencyCode,
        since: NaiveDate,
        rate: Decimal,
    ) -> Self {
        let entries = self.rates.entry((from, to)).or_default();
        entries.push((since, rate));
        entries.sort_by_key(|(date, _)| *date);
        self
    }
}

impl ExchangeRateSource for MemoryRates {
    async fn rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        on: NaiveDate,
    ) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&(from, to))
            .and_then(|entries| {
                entries
                    .iter()
                    .rev()
                    .find(|(since, _)| *since <= on)
                    .map(|(_, rate)| *rate)
            })
            .ok_or(RateError::Missing { from, to, on })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn picks_latest_rate_not_after_date() {
        let usd = CurrencyCode::try_from("USD").unwrap();
        let eur = CurrencyCode::try_from("EUR").unwrap();
        let rates = MemoryRates::new()
            .with_rate(usd, eur, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), dec!(0.95))
            .with_rate(usd, eur, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(0.90));

        let on = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        assert_eq!(rates.rate(usd, eur, on(5)).await, Ok(dec!(0.90)));
        assert_eq!(rates.rate(usd, eur, on(10)).await, Ok(dec!(0.95)));
        assert_eq!(rates.rate(usd, usd, on(5)).await, Ok(Decimal::ONE));
        assert!(matches!(
            rates.rate(eur, usd, on(5)).await,
            Err(RateError::Missing { .. })
        ));
        let before = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert!(rates.rate(usd, eur, before).await.is_err());
    }
}
