use std::{collections::HashMap, time::Duration};

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::CurrencyCode;

use super::{ExchangeRateSource, RateError};

/// Client for a Frankfurter-compatible rate service.
///
/// `GET {base_url}/{YYYY-MM-DD}?base={from}&symbols={to}` answering
/// `{"rates": {"<to>": <rate>}}`.
#[derive(Clone, Debug)]
pub struct HttpRates {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RatesBody {
    rates: HashMap<String, Decimal>,
}

impl HttpRates {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Build a client with a request timeout.
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RateError::Invalid(format!("cannot build http client: {err}")))?;
        Ok(Self::new(client, base_url))
    }

    fn url(&self, on: NaiveDate) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            on.format("%Y-%m-%d")
        )
    }
}

fn classify(err: reqwest::Error) -> RateError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        RateError::Unavailable(err.to_string())
    } else {
        RateError::Invalid(err.to_string())
    }
}

impl ExchangeRateSource for HttpRates {
    async fn rate(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        on: NaiveDate,
    ) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let resp = self
            .client
            .get(self.url(on))
            .query(&[("base", from.code()), ("symbols", to.code())])
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RateError::Unavailable(format!("rate service answered {status}")));
        }
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RateError::Missing { from, to, on });
        }
        if !status.is_success() {
            return Err(RateError::Invalid(format!("rate service answered {status}")));
        }

        let body: RatesBody = resp
            .json()
            .await
            .map_err(|err| RateError::Invalid(err.to_string()))?;
        body.rates
            .get(to.code())
            .copied()
            .ok_or(RateError::Missing { from, to, on })
    }
}
