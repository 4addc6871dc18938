use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::{
    CurrencyCode, EngineError, Movement, MovementField, PLStatement, ResultEngine, Transaction,
    accounts,
    aggregate::{AmountFilter, MovementSummary},
    files, movements,
    query::{SearchFilter, TokenSearch, order_with_tie_break},
    rates::ExchangeRateSource,
    transactions,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

/// Filters, ordering and pagination for listing movements.
///
/// A movement falls in `[start_date, end_date)` when its earliest member
/// transaction does. Movements without transactions are never listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementQuery {
    pub movement_id: Option<i32>,
    /// Zero-based page index.
    pub page: u64,
    /// Page size, `0` disables pagination.
    pub per_page: u64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Matched against the names of member transactions.
    pub search: Option<String>,
    pub is_descending: bool,
    pub sort_by: MovementField,
}

impl Default for MovementQuery {
    fn default() -> Self {
        Self {
            movement_id: None,
            page: 0,
            per_page: 0,
            start_date: None,
            end_date: None,
            search: None,
            is_descending: true,
            sort_by: MovementField::Timestamp,
        }
    }
}

impl MovementQuery {
    /// Build the storage query with [`TokenSearch`].
    pub fn build(&self) -> ResultEngine<Select<movements::Entity>> {
        self.build_with(&TokenSearch)
    }

    /// Build the grouped storage query, delegating `search` to `searcher`.
    ///
    /// Ordering by amount is not possible in storage: with
    /// [`MovementField::Amount`] only the id order is applied here and the
    /// caller sorts after conversion.
    pub fn build_with<S>(&self, searcher: &S) -> ResultEngine<Select<movements::Entity>>
    where
        S: SearchFilter,
    {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(EngineError::Validation(
                "invalid range: start_date must be <= end_date".to_string(),
            ));
        }

        let earliest: SimpleExpr = Func::min(Expr::col((
            transactions::Entity,
            transactions::Column::Timestamp,
        )))
        .into();

        let mut query = movements::Entity::find()
            .join(JoinType::InnerJoin, movements::Relation::Transactions.def())
            .group_by(movements::Column::Id);

        if let Some(id) = self.movement_id {
            query = query.filter(movements::Column::Id.eq(id));
        }
        if let Some(term) = self.search.as_deref() {
            let name = Expr::col((transactions::Entity, transactions::Column::SearchName)).into();
            query = searcher.apply(term, query, name);
        }
        if let Some(start) = self.start_date {
            query = query.having(Expr::expr(earliest.clone()).gte(start));
        }
        if let Some(end) = self.end_date {
            query = query.having(Expr::expr(earliest.clone()).lt(end));
        }

        let id: SimpleExpr = Expr::col((movements::Entity, movements::Column::Id)).into();
        query = match self.sort_by {
            MovementField::Timestamp => {
                order_with_tie_break(query, earliest, id, self.is_descending)
            }
            MovementField::Amount => query.order_by_asc(movements::Column::Id),
        };

        if self.per_page > 0 {
            query = query
                .offset(self.page.saturating_mul(self.per_page))
                .limit(self.per_page);
        }

        Ok(query)
    }
}

impl<R> Engine<R>
where
    R: ExchangeRateSource,
{
    /// Attach every member transaction to the given movements, keeping their
    /// order. Members are ordered by `(timestamp, id)`.
    async fn materialize_movements<C>(
        &self,
        db: &C,
        models: Vec<movements::Model>,
    ) -> ResultEngine<Vec<Movement>>
    where
        C: ConnectionTrait,
    {
        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let rows = transactions::Entity::find()
            .filter(transactions::Column::MovementId.is_in(ids))
            .find_also_related(accounts::Entity)
            .order_by_asc(transactions::Column::Timestamp)
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?;

        let mut members: HashMap<i32, Vec<Transaction>> = HashMap::new();
        for (model, account) in rows {
            let account = account
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            let Some(movement_id) = model.movement_id else {
                continue;
            };
            members
                .entry(movement_id)
                .or_default()
                .push(Transaction::from_models(model, &account)?);
        }

        Ok(models
            .into_iter()
            .map(|m| Movement {
                transactions: members.remove(&m.id).unwrap_or_default(),
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    pub async fn new_movement(&self, name: &str) -> ResultEngine<Movement> {
        let name = normalize_required_name(name, "movement")?;
        with_tx!(self, |db_tx| {
            let model = movements::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(movement_id = model.id, "movement created");
            Ok(Movement {
                id: model.id,
                name: model.name,
                transactions: Vec::new(),
            })
        })
    }

    /// A movement with all of its transactions.
    pub async fn movement(&self, id: i32) -> ResultEngine<Movement> {
        let model = movements::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
        let mut movements = self.materialize_movements(&self.database, vec![model]).await?;
        movements
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))
    }

    /// Deletes a movement together with its transactions and their files.
    pub async fn delete_movement(&self, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            movements::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;

            let member_ids: Vec<i32> = transactions::Entity::find()
                .select_only()
                .column(transactions::Column::Id)
                .filter(transactions::Column::MovementId.eq(id))
                .into_tuple()
                .all(&db_tx)
                .await?;
            files::Entity::delete_many()
                .filter(files::Column::TransactionId.is_in(member_ids.clone()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_many()
                .filter(transactions::Column::MovementId.eq(id))
                .exec(&db_tx)
                .await?;
            movements::Entity::delete_by_id(id).exec(&db_tx).await?;
            tracing::debug!(movement_id = id, transactions = member_ids.len(), "movement deleted");
            Ok(())
        })
    }

    /// Lists movements matching `query` with their totals in `currency`.
    ///
    /// `filter` and amount sorting apply to the fetched page only.
    pub async fn list_movements(
        &self,
        query: &MovementQuery,
        filter: &AmountFilter,
        currency: CurrencyCode,
    ) -> ResultEngine<Vec<MovementSummary>> {
        let models = query.build()?.all(&self.database).await?;
        let movements = self.materialize_movements(&self.database, models).await?;
        tracing::debug!(movements = movements.len(), page = query.page, "movements fetched");
        self.aggregator()
            .filter_and_sort(movements, filter, query.sort_by, query.is_descending, currency)
            .await
    }

    /// Profit and loss of the movements starting in `[start, end)`.
    pub async fn pl_statement(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        currency: CurrencyCode,
    ) -> ResultEngine<PLStatement> {
        let query = MovementQuery {
            start_date: Some(start),
            end_date: Some(end),
            ..MovementQuery::default()
        };
        let models = query.build()?.all(&self.database).await?;
        let movements = self.materialize_movements(&self.database, models).await?;
        PLStatement::calculate(&self.aggregator(), &movements, start, end, currency).await
    }
}
