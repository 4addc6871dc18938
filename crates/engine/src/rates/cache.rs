use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::CurrencyCode;

use super::{ExchangeRateSource, RateError};

type RateKey = (CurrencyCode, CurrencyCode, NaiveDate);

/// Memoizes successful lookups of the wrapped source.
///
/// Failures are never stored, so a source that comes back online is asked
/// again. Concurrent lookups of the same key may both reach the source; the
/// first answer stored wins and later ones are identical anyway.
#[derive(Debug)]
pub struct CachedRates<S> {
    inner: S,
    cache: RwLock<HashMap<RateKey, Decimal>>,
}

impl<S> CachedRates<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached triples.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> ExchangeRateSource for CachedRates<S>
where
    S: ExchangeRateSource,
{
    async fn rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        on: NaiveDate,
    ) -> Result<Decimal, RateError> {
        let key = (from, to, on);
        let cached = self.cache.read().get(&key).copied();
        if let Some(rate) = cached {
            return Ok(rate);
        }

        let rate = self.inner.rate(from, to, on).await?;
        Ok(*self.cache.write().entry(key).or_insert(rate))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal_macros::dec;

    use super::*;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ExchangeRateSource for Counting {
        async fn rate(
            &self,
            _from: CurrencyCode,
            _to: CurrencyCode,
            _on: NaiveDate,
        ) -> Result<Decimal, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RateError::Unavailable("offline".to_string()))
            } else {
                Ok(dec!(1.1))
            }
        }
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::try_from("USD").unwrap()
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::try_from("EUR").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_source_once() {
        let rates = CachedRates::new(Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        for _ in 0..3 {
            assert_eq!(rates.rate(usd(), eur(), day(5)).await, Ok(dec!(1.1)));
        }
        assert_eq!(rates.inner().calls.load(Ordering::SeqCst), 1);

        rates.rate(usd(), eur(), day(6)).await.unwrap();
        rates.rate(eur(), usd(), day(5)).await.unwrap();
        assert_eq!(rates.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(rates.len(), 3);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let rates = CachedRates::new(Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        assert!(rates.rate(usd(), eur(), day(5)).await.is_err());
        assert!(rates.rate(usd(), eur(), day(5)).await.is_err());
        assert_eq!(rates.inner().calls.load(Ordering::SeqCst), 2);
        assert!(rates.is_empty());
    }
}
