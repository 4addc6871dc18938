use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    Account, CurrencyCode, EngineError, ResultEngine, accounts, rates::ExchangeRateSource,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl<R> Engine<R>
where
    R: ExchangeRateSource,
{
    /// Creates an account holding money in `currency_code`.
    pub async fn new_account(&self, name: &str, currency_code: CurrencyCode) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                currency_code: ActiveValue::Set(currency_code.code().to_string()),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(account_id = model.id, %currency_code, "account created");
            Account::try_from(model)
        })
    }

    pub async fn account(&self, id: i32) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }
}
