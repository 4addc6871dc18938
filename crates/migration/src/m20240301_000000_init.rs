//! Initial schema migration.
//!
//! Creates the relations the query engine reads from:
//!
//! - `accounts`: money containers, each in a single currency
//! - `movements`: named groupings of transactions (one economic event)
//! - `transactions`: dated, signed entries owned by an account
//! - `files`: attachment metadata hanging off a transaction

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    CurrencyCode,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Amount,
    Timestamp,
    Name,
    SearchName,
    AccountId,
    MovementId,
    AccountBalance,
}

#[derive(Iden)]
enum Files {
    Table,
    Id,
    TransactionId,
    Name,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CurrencyCode)
                            .string_len(3)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // SQLite keeps decimals as REAL. A NUMERIC column would
                    // store integral amounts as INTEGER and break decoding.
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Timestamp).date().not_null())
                    .col(ColumnDef::new(Transactions::Name).string().not_null())
                    // Case-folded copy of `name`; SQLite only folds ASCII.
                    .col(ColumnDef::new(Transactions::SearchName).string().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).integer().not_null())
                    .col(ColumnDef::new(Transactions::MovementId).integer())
                    .col(
                        ColumnDef::new(Transactions::AccountBalance)
                            .double()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-movement_id")
                            .from(Transactions::Table, Transactions::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-timestamp-id")
                    .table(Transactions::Table)
                    .col(Transactions::Timestamp)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-movement_id")
                    .table(Transactions::Table)
                    .col(Transactions::MovementId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Files
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Files::TransactionId).integer().not_null())
                    .col(ColumnDef::new(Files::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-files-transaction_id")
                            .from(Files::Table, Files::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
