//! Movements group transactions that belong to one economic event (for
//! example the two sides of a transfer between accounts).
//!
//! A movement stores nothing but its name: the amount, the currencies and the
//! timestamp bounds are all derived from the member transactions.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, EngineError, ResultEngine, Transaction};

/// What movement listings are ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementField {
    /// Earliest member timestamp, resolved in storage.
    #[default]
    Timestamp,
    /// Converted amount, resolved after fetching.
    Amount,
}

impl MovementField {
    pub const fn as_str(self) -> &'static str {
        match self {
            MovementField::Timestamp => "timestamp",
            MovementField::Amount => "amount",
        }
    }
}

impl fmt::Display for MovementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(MovementField::Timestamp),
            "amount" => Ok(MovementField::Amount),
            other => Err(EngineError::Validation(format!(
                "unknown movement sort field: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i32,
    pub name: String,
    pub transactions: Vec<Transaction>,
}

impl Movement {
    /// Date of the oldest member transaction.
    ///
    /// Fails with [`EngineError::EmptyMovement`] when there are no members.
    pub fn earliest_timestamp(&self) -> ResultEngine<NaiveDate> {
        self.transactions
            .iter()
            .map(|t| t.timestamp)
            .min()
            .ok_or(EngineError::EmptyMovement(self.id))
    }

    /// Date of the newest member transaction.
    ///
    /// Fails with [`EngineError::EmptyMovement`] when there are no members.
    pub fn latest_timestamp(&self) -> ResultEngine<NaiveDate> {
        self.transactions
            .iter()
            .map(|t| t.timestamp)
            .max()
            .ok_or(EngineError::EmptyMovement(self.id))
    }

    /// Distinct currencies of the member transactions.
    pub fn currencies(&self) -> BTreeSet<CurrencyCode> {
        self.transactions.iter().map(|t| t.currency_code).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
