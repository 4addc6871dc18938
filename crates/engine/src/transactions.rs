//! Transaction primitives.
//!
//! A `Transaction` is a single dated, signed entry against an account. It is
//! owned by its account and optionally classified into a movement; both links
//! are plain foreign keys; the reverse direction is resolved by queries on
//! [`Engine`](crate::Engine).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, ResultEngine, query::EntitySchema, query::FieldType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i32,
    pub amount: Decimal,
    pub timestamp: NaiveDate,
    pub name: String,
    /// Currency of the owning account.
    pub currency_code: CurrencyCode,
    pub account_id: i32,
    pub movement_id: Option<i32>,
    /// Running balance of the account right after this transaction.
    pub account_balance: Decimal,
}

/// Input for [`Engine::new_transaction`](crate::Engine::new_transaction).
#[derive(Clone, Debug)]
pub struct TransactionNew {
    pub account_id: i32,
    pub movement_id: Option<i32>,
    pub amount: Decimal,
    pub timestamp: NaiveDate,
    pub name: String,
    /// When `None` the balance is derived from the account's latest entry.
    pub account_balance: Option<Decimal>,
}

/// Filterable fields of a transaction, in declaration order.
///
/// Every entry must name a column of [`Model`].
pub const TRANSACTION_SCHEMA: EntitySchema = EntitySchema::new(
    "transaction",
    &[
        ("id", FieldType::Integer),
        ("amount", FieldType::Decimal),
        ("timestamp", FieldType::Date),
        ("name", FieldType::Text),
        ("account_id", FieldType::Integer),
        ("movement_id", FieldType::Union(&[FieldType::Integer, FieldType::Null])),
        ("account_balance", FieldType::Decimal),
    ],
);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Double")]
    pub amount: Decimal,
    pub timestamp: Date,
    pub name: String,
    /// `name` folded for searching, written on insert.
    pub search_name: String,
    pub account_id: i32,
    pub movement_id: Option<i32>,
    #[sea_orm(column_type = "Double")]
    pub account_balance: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::movements::Entity",
        from = "Column::MovementId",
        to = "super::movements::Column::Id",
        on_delete = "Cascade"
    )]
    Movement,
    #[sea_orm(has_many = "super::files::Entity")]
    Files,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movement.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Transaction {
    /// Build a domain transaction from its row and the owning account row.
    pub(crate) fn from_models(
        model: Model,
        account: &super::accounts::Model,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            amount: model.amount,
            timestamp: model.timestamp,
            name: model.name,
            currency_code: crate::util::model_currency(&account.currency_code)?,
            account_id: model.account_id,
            movement_id: model.movement_id,
            account_balance: model.account_balance,
        })
    }
}
