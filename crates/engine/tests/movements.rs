use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Amount, AmountFilter, CurrencyCode, Engine, EngineError, MovementField, MovementQuery,
    MovementSummary, TransactionNew, TransactionQuery, rates::MemoryRates,
};
use migration::MigratorTrait;

async fn engine_with_rates(rates: MemoryRates) -> (Engine<MemoryRates>, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .rates(rates)
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_db() -> (Engine<MemoryRates>, DatabaseConnection) {
    engine_with_rates(MemoryRates::new()).await
}

fn code(c: &str) -> CurrencyCode {
    CurrencyCode::try_from(c).unwrap()
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

async fn add(
    engine: &Engine<MemoryRates>,
    account_id: i32,
    movement_id: i32,
    amount: Decimal,
    timestamp: NaiveDate,
    name: &str,
) -> i32 {
    engine
        .new_transaction(TransactionNew {
            account_id,
            movement_id: Some(movement_id),
            amount,
            timestamp,
            name: name.to_string(),
            account_balance: None,
        })
        .await
        .unwrap()
        .id
}

fn ids(summaries: &[MovementSummary]) -> Vec<i32> {
    summaries.iter().map(|s| s.id).collect()
}

#[tokio::test]
async fn movement_totals_and_bounds() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();
    let m = engine.new_movement("Dinner split").await.unwrap();
    add(&engine, account.id, m.id, dec!(100.00), date(1, 5), "Dinner").await;
    add(&engine, account.id, m.id, dec!(-40.00), date(1, 6), "Refund").await;

    let movement = engine.movement(m.id).await.unwrap();
    assert_eq!(movement.transactions.len(), 2);
    assert_eq!(movement.earliest_timestamp().unwrap(), date(1, 5));
    assert_eq!(movement.latest_timestamp().unwrap(), date(1, 6));

    let summaries = engine
        .list_movements(&MovementQuery::default(), &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.amount, Amount::Known(dec!(60)));
    assert_eq!(summary.amounts[&code("USD")], Amount::Known(dec!(60)));
    assert_eq!(summary.earliest_timestamp, Some(date(1, 5)));
    assert_eq!(summary.latest_timestamp, Some(date(1, 6)));
    assert_eq!(summary.name, "Dinner split");
}

#[tokio::test]
async fn converts_through_the_rate_source() {
    let rates = MemoryRates::new()
        .with_rate(code("EUR"), code("USD"), date(1, 1), dec!(2))
        .with_rate(code("USD"), code("EUR"), date(1, 1), dec!(0.5));
    let (engine, _db) = engine_with_rates(rates).await;
    let usd = engine.new_account("Checking", code("USD")).await.unwrap();
    let eur = engine.new_account("Girokonto", code("EUR")).await.unwrap();
    let m = engine.new_movement("Transfer").await.unwrap();
    add(&engine, usd.id, m.id, dec!(-100), date(2, 1), "Out").await;
    add(&engine, eur.id, m.id, dec!(49), date(2, 2), "In").await;

    let summaries = engine
        .list_movements(&MovementQuery::default(), &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(summaries[0].amount, Amount::Known(dec!(-2)));
    assert_eq!(summaries[0].amounts[&code("EUR")], Amount::Known(dec!(-1)));
    assert_eq!(summaries[0].amounts.len(), 2);
}

#[tokio::test]
async fn missing_movement_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.movement(404).await,
        Err(EngineError::KeyNotFound("movement not exists".to_string()))
    );
    assert!(matches!(
        engine.delete_movement(404).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn date_window_applies_to_earliest_transaction() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();

    let january = engine.new_movement("January").await.unwrap();
    add(&engine, account.id, january.id, dec!(1), date(1, 5), "a").await;

    let straddling = engine.new_movement("Straddling").await.unwrap();
    add(&engine, account.id, straddling.id, dec!(1), date(1, 30), "b").await;
    add(&engine, account.id, straddling.id, dec!(1), date(2, 2), "c").await;

    let february = engine.new_movement("February").await.unwrap();
    add(&engine, account.id, february.id, dec!(1), date(2, 1), "d").await;

    let march = engine.new_movement("March").await.unwrap();
    add(&engine, account.id, march.id, dec!(1), date(3, 1), "e").await;

    engine.new_movement("Empty").await.unwrap();

    let query = MovementQuery {
        start_date: Some(date(2, 1)),
        end_date: Some(date(3, 1)),
        ..MovementQuery::default()
    };
    let summaries = engine
        .list_movements(&query, &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(ids(&summaries), vec![february.id]);

    let all = engine
        .list_movements(&MovementQuery::default(), &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(
        ids(&all),
        vec![march.id, february.id, straddling.id, january.id]
    );

    let inverted = MovementQuery {
        start_date: Some(date(3, 1)),
        end_date: Some(date(2, 1)),
        ..MovementQuery::default()
    }
    .build();
    assert!(matches!(inverted, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn equal_timestamps_are_ordered_by_id() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();
    let mut created = Vec::new();
    for name in ["a", "b", "c"] {
        let m = engine.new_movement(name).await.unwrap();
        add(&engine, account.id, m.id, dec!(1), date(4, 1), name).await;
        created.push(m.id);
    }

    let desc = engine
        .list_movements(&MovementQuery::default(), &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(ids(&desc), vec![created[2], created[1], created[0]]);

    let asc_page = engine
        .list_movements(
            &MovementQuery {
                is_descending: false,
                page: 1,
                per_page: 1,
                ..MovementQuery::default()
            },
            &AmountFilter::default(),
            code("USD"),
        )
        .await
        .unwrap();
    assert_eq!(ids(&asc_page), vec![created[1]]);
}

#[tokio::test]
async fn search_matches_member_transaction_names() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();
    let trip = engine.new_movement("Trip").await.unwrap();
    add(&engine, account.id, trip.id, dec!(-300), date(5, 1), "Hotel Lisbon").await;
    add(&engine, account.id, trip.id, dec!(-80), date(5, 2), "Train").await;
    let rent = engine.new_movement("Rent").await.unwrap();
    add(&engine, account.id, rent.id, dec!(-900), date(5, 1), "Rent May").await;

    let query = MovementQuery {
        search: Some("lisbon".to_string()),
        ..MovementQuery::default()
    };
    let summaries = engine
        .list_movements(&query, &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(ids(&summaries), vec![trip.id]);
    // Materialization loads every member, not only the matching ones.
    assert_eq!(summaries[0].transactions.len(), 2);
    assert_eq!(summaries[0].amount, Amount::Known(dec!(-380)));
}

#[tokio::test]
async fn amount_filter_and_sort_run_after_conversion() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();
    let mut created = Vec::new();
    for (d, amount) in [(1, dec!(10)), (2, dec!(-50)), (3, dec!(30)), (4, dec!(0.5))] {
        let m = engine.new_movement("m").await.unwrap();
        add(&engine, account.id, m.id, amount, date(6, d), "tx").await;
        created.push(m.id);
    }

    let by_amount = MovementQuery {
        sort_by: MovementField::Amount,
        ..MovementQuery::default()
    };
    let summaries = engine
        .list_movements(&by_amount, &AmountFilter::default(), code("USD"))
        .await
        .unwrap();
    assert_eq!(
        ids(&summaries),
        vec![created[2], created[0], created[3], created[1]]
    );

    let filter = AmountFilter {
        amount_gt: Some(dec!(0.5)),
        amount_lt: Some(dec!(30)),
    };
    let summaries = engine
        .list_movements(
            &MovementQuery {
                is_descending: false,
                ..by_amount
            },
            &filter,
            code("USD"),
        )
        .await
        .unwrap();
    assert_eq!(ids(&summaries), vec![created[0]]);
}

#[tokio::test]
async fn profit_and_loss_over_a_range() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();

    let dinner = engine.new_movement("Dinner").await.unwrap();
    add(&engine, account.id, dinner.id, dec!(100), date(7, 3), "Paid").await;
    add(&engine, account.id, dinner.id, dec!(-40), date(7, 4), "Split").await;

    let taxi = engine.new_movement("Taxi").await.unwrap();
    add(&engine, account.id, taxi.id, dec!(-25), date(7, 10), "Taxi").await;

    let later = engine.new_movement("Later").await.unwrap();
    add(&engine, account.id, later.id, dec!(-1000), date(8, 1), "Outside").await;

    let pl = engine
        .pl_statement(date(7, 1), date(8, 1), code("USD"))
        .await
        .unwrap();
    assert_eq!(pl.income, Amount::Known(dec!(60)));
    assert_eq!(pl.expenses, Amount::Known(dec!(-25)));
    assert_eq!(pl.start_date, date(7, 1));
    assert_eq!(pl.end_date, date(8, 1));
    assert_eq!(pl.currency_code, code("USD"));

    let empty = engine
        .pl_statement(date(9, 1), date(10, 1), code("USD"))
        .await
        .unwrap();
    assert_eq!(empty.income, Amount::ZERO);
    assert_eq!(empty.expenses, Amount::ZERO);
}

#[tokio::test]
async fn reassigning_and_deleting_movements() {
    let (engine, _db) = engine_with_db().await;
    let account = engine.new_account("Checking", code("USD")).await.unwrap();
    let first = engine.new_movement("First").await.unwrap();
    let second = engine.new_movement("Second").await.unwrap();
    let moved = add(&engine, account.id, first.id, dec!(5), date(9, 1), "moved").await;
    let stays = add(&engine, account.id, first.id, dec!(7), date(9, 2), "stays").await;

    let tx = engine
        .reassign_transaction(moved, Some(second.id))
        .await
        .unwrap();
    assert_eq!(tx.movement_id, Some(second.id));
    assert_eq!(engine.movement(second.id).await.unwrap().transactions.len(), 1);

    let members = engine
        .list_transactions(&TransactionQuery {
            movement_id: Some(first.id),
            ..TransactionQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(members.iter().map(|t| t.id).collect::<Vec<_>>(), vec![stays]);

    assert!(matches!(
        engine.reassign_transaction(moved, Some(404)).await,
        Err(EngineError::KeyNotFound(_))
    ));

    engine.attach_file(stays, "stays.pdf").await.unwrap();
    engine.delete_movement(first.id).await.unwrap();
    assert!(matches!(
        engine.movement(first.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.transaction(stays).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(engine.transaction_files(stays).await.unwrap().is_empty());
    assert!(engine.transaction(moved).await.is_ok());

    let detached = engine.reassign_transaction(moved, None).await.unwrap();
    assert_eq!(detached.movement_id, None);
}
