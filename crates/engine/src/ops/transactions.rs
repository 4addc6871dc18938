use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::{
    EngineError, ResultEngine, TRANSACTION_SCHEMA, Transaction, TransactionNew, accounts,
    movements,
    query::{
        ArgValue, Constraint, FieldType, OrderToken, QueryArgSchema, QueryArgs, SearchFilter,
        TokenSearch, apply_constraints, column_expr, operand, order_with_tie_break,
    },
    rates::ExchangeRateSource,
    transactions,
    util::{fold_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// Query-argument schema of transaction listings: the synthesized
/// [`TRANSACTION_SCHEMA`] arguments plus free-text `search`.
pub fn transaction_args() -> QueryArgSchema {
    QueryArgSchema::synthesize(&TRANSACTION_SCHEMA).with_extra("search", FieldType::Text)
}

/// Filters, ordering and pagination for listing transactions.
///
/// Timestamp and amount bounds are inclusive. Results are ordered by
/// `timestamp` (or `order_by`), ties broken by `id` in the same direction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionQuery {
    pub transaction_id: Option<i32>,
    pub account_id: Option<i32>,
    pub movement_id: Option<i32>,
    /// Zero-based page index.
    pub page: u64,
    /// Page size, `0` disables pagination.
    pub per_page: u64,
    pub search: Option<String>,
    pub timestamp_ge: Option<NaiveDate>,
    pub timestamp_le: Option<NaiveDate>,
    pub amount_ge: Option<Decimal>,
    pub amount_le: Option<Decimal>,
    /// Compare `abs(amount)` against the amount bounds.
    pub is_amount_abs: bool,
    pub is_descending: bool,
    /// Overrides the timestamp ordering and its direction.
    pub order_by: Option<OrderToken>,
    /// Generic `<field>__<op>[__abs]` constraints.
    pub constraints: Vec<Constraint>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            transaction_id: None,
            account_id: None,
            movement_id: None,
            page: 0,
            per_page: 0,
            search: None,
            timestamp_ge: None,
            timestamp_le: None,
            amount_ge: None,
            amount_le: None,
            is_amount_abs: false,
            is_descending: true,
            order_by: None,
            constraints: Vec::new(),
        }
    }
}

impl TransactionQuery {
    /// Turn arguments parsed by [`transaction_args`] into a query.
    pub fn from_args(args: QueryArgs) -> ResultEngine<Self> {
        let search = match args.extra("search") {
            Some(ArgValue::Text(term)) => Some(term.clone()),
            Some(other) => {
                return Err(EngineError::Validation(format!(
                    "search expects text, got {other:?}"
                )));
            }
            None => None,
        };
        Ok(Self {
            page: args.page,
            per_page: args.per_page,
            search,
            order_by: args.order_by,
            constraints: args.constraints,
            ..Self::default()
        })
    }

    fn validate(&self) -> ResultEngine<()> {
        if let (Some(ge), Some(le)) = (self.timestamp_ge, self.timestamp_le)
            && ge > le
        {
            return Err(EngineError::Validation(
                "invalid range: timestamp_ge must be <= timestamp_le".to_string(),
            ));
        }
        if let (Some(ge), Some(le)) = (self.amount_ge, self.amount_le)
            && ge > le
        {
            return Err(EngineError::Validation(
                "invalid range: amount_ge must be <= amount_le".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the storage query with [`TokenSearch`].
    pub fn build(&self) -> ResultEngine<Select<transactions::Entity>> {
        self.build_with(&TokenSearch)
    }

    /// Build the storage query, delegating `search` to `searcher`.
    ///
    /// Nothing is executed; the returned select can be refined further.
    pub fn build_with<S>(&self, searcher: &S) -> ResultEngine<Select<transactions::Entity>>
    where
        S: SearchFilter,
    {
        self.validate()?;

        let mut query = transactions::Entity::find();
        if let Some(id) = self.transaction_id {
            query = query.filter(transactions::Column::Id.eq(id));
        }
        if let Some(account_id) = self.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(movement_id) = self.movement_id {
            query = query.filter(transactions::Column::MovementId.eq(movement_id));
        }
        if let Some(ge) = self.timestamp_ge {
            query = query.filter(transactions::Column::Timestamp.gte(ge));
        }
        if let Some(le) = self.timestamp_le {
            query = query.filter(transactions::Column::Timestamp.lte(le));
        }

        let amount = Expr::col((transactions::Entity, transactions::Column::Amount));
        let amount = if self.is_amount_abs {
            Expr::expr(Func::abs(amount))
        } else {
            amount
        };
        if let Some(ge) = self.amount_ge {
            query = query.filter(amount.clone().gte(operand(ge.into())));
        }
        if let Some(le) = self.amount_le {
            query = query.filter(amount.lte(operand(le.into())));
        }

        query = apply_constraints::<transactions::Entity, _>(query, &self.constraints)?;

        if let Some(term) = self.search.as_deref() {
            let name = Expr::col((transactions::Entity, transactions::Column::SearchName)).into();
            query = searcher.apply(term, query, name);
        }

        let (primary, descending): (SimpleExpr, bool) = match self.order_by {
            Some(token) => (
                column_expr::<transactions::Entity>(token.field)?.into(),
                token.direction.is_descending(),
            ),
            None => (
                Expr::col((transactions::Entity, transactions::Column::Timestamp)).into(),
                self.is_descending,
            ),
        };
        let tie_break = Expr::col((transactions::Entity, transactions::Column::Id)).into();
        query = order_with_tie_break(query, primary, tie_break, descending);

        if self.per_page > 0 {
            query = query
                .offset(self.page.saturating_mul(self.per_page))
                .limit(self.per_page);
        }

        Ok(query)
    }
}

fn pair_into_transaction(
    (model, account): (transactions::Model, Option<accounts::Model>),
) -> ResultEngine<Transaction> {
    let account =
        account.ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
    Transaction::from_models(model, &account)
}

impl<R> Engine<R>
where
    R: ExchangeRateSource,
{
    pub async fn transaction(&self, id: i32) -> ResultEngine<Transaction> {
        let pair = transactions::Entity::find_by_id(id)
            .find_also_related(accounts::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        pair_into_transaction(pair)
    }

    /// Lists transactions matching `query`, in the query's order.
    pub async fn list_transactions(&self, query: &TransactionQuery) -> ResultEngine<Vec<Transaction>> {
        let rows = query
            .build()?
            .find_also_related(accounts::Entity)
            .all(&self.database)
            .await?;
        tracing::debug!(rows = rows.len(), page = query.page, "transactions listed");
        rows.into_iter().map(pair_into_transaction).collect()
    }

    /// Records a transaction on an account.
    ///
    /// Without an explicit `account_balance` the balance is the one of the
    /// account's latest transaction up to `timestamp`, plus `amount`.
    pub async fn new_transaction(&self, new: TransactionNew) -> ResultEngine<Transaction> {
        let name = normalize_required_name(&new.name, "transaction")?;
        with_tx!(self, |db_tx| {
            let account = accounts::Entity::find_by_id(new.account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            if let Some(movement_id) = new.movement_id {
                movements::Entity::find_by_id(movement_id)
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
            }

            let account_balance = match new.account_balance {
                Some(balance) => balance,
                None => {
                    let previous = transactions::Entity::find()
                        .filter(transactions::Column::AccountId.eq(new.account_id))
                        .filter(transactions::Column::Timestamp.lte(new.timestamp))
                        .order_by_desc(transactions::Column::Timestamp)
                        .order_by_desc(transactions::Column::Id)
                        .one(&db_tx)
                        .await?
                        .map_or(Decimal::ZERO, |t| t.account_balance);
                    previous.checked_add(new.amount).ok_or_else(|| {
                        EngineError::Validation("account balance overflow".to_string())
                    })?
                }
            };

            let model = transactions::ActiveModel {
                id: ActiveValue::NotSet,
                amount: ActiveValue::Set(new.amount),
                timestamp: ActiveValue::Set(new.timestamp),
                search_name: ActiveValue::Set(fold_text(&name)),
                name: ActiveValue::Set(name),
                account_id: ActiveValue::Set(new.account_id),
                movement_id: ActiveValue::Set(new.movement_id),
                account_balance: ActiveValue::Set(account_balance),
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(
                transaction_id = model.id,
                account_id = model.account_id,
                "transaction created"
            );
            Transaction::from_models(model, &account)
        })
    }

    /// Moves a transaction into another movement, or out of any with `None`.
    pub async fn reassign_transaction(
        &self,
        transaction_id: i32,
        movement_id: Option<i32>,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let (model, account) = transactions::Entity::find_by_id(transaction_id)
                .find_also_related(accounts::Entity)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            if let Some(movement_id) = movement_id {
                movements::Entity::find_by_id(movement_id)
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
            }

            let mut active: transactions::ActiveModel = model.into();
            active.movement_id = ActiveValue::Set(movement_id);
            let model = active.update(&db_tx).await?;
            pair_into_transaction((model, account))
        })
    }
}
