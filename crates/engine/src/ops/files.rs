use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, File, ResultEngine, files, rates::ExchangeRateSource, transactions,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl<R> Engine<R>
where
    R: ExchangeRateSource,
{
    /// Records that the blob `name` in the file store belongs to a transaction.
    pub async fn attach_file(&self, transaction_id: i32, name: &str) -> ResultEngine<File> {
        let name = normalize_required_name(name, "file")?;
        with_tx!(self, |db_tx| {
            transactions::Entity::find_by_id(transaction_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let model = files::ActiveModel {
                id: ActiveValue::NotSet,
                transaction_id: ActiveValue::Set(transaction_id),
                name: ActiveValue::Set(name),
            }
            .insert(&db_tx)
            .await?;
            Ok(File::from(model))
        })
    }

    pub async fn transaction_files(&self, transaction_id: i32) -> ResultEngine<Vec<File>> {
        let models = files::Entity::find()
            .filter(files::Column::TransactionId.eq(transaction_id))
            .order_by_asc(files::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(File::from).collect())
    }
}
