//! End-to-end aggregation against a real SQLite file

use chrono::{Duration, Utc};
use solar_archive::{AggregationRunner, Progress};
use solar_core::{parse_timestamp, Deadline, PowerRecord, Resolution, Table, Timestamp};
use solar_db::DbClient;
use tempfile::TempDir;

async fn open_db() -> (TempDir, DbClient) {
    let dir = tempfile::tempdir().unwrap();
    let db = DbClient::open(dir.path().join("solarlogging.db"))
        .await
        .unwrap();
    db.init_schema().await.unwrap();
    (dir, db)
}

fn ts(raw: &str) -> Timestamp {
    parse_timestamp(raw).unwrap()
}

/// One sample per minute from 10:00 to 11:09, and a week and a bit of daily totals
async fn seed(db: &DbClient) {
    let start = ts("2024-03-01T10:00:00+00:00");
    let samples: Vec<PowerRecord> = (0..70)
        .map(|m| PowerRecord::new(start + Duration::minutes(m), 100.0, 300.0, 400.0))
        .collect();
    db.insert_batch(Table::Samples, &samples).await.unwrap();

    let first_day = ts("2024-02-26T00:00:00+00:00");
    let daily: Vec<PowerRecord> = (0..8)
        .map(|d| PowerRecord::new(first_day + Duration::days(d), 1.5, 6.0, 4.0))
        .collect();
    db.insert_batch(Table::Daily, &daily).await.unwrap();
}

async fn render(db: &DbClient, table: Table) -> String {
    let rows = db
        .select_range(
            table,
            &ts("2000-01-01T00:00:00+00:00"),
            &ts("2100-01-01T00:00:00+00:00"),
        )
        .await
        .unwrap();
    rows.iter()
        .map(|r| format!("{} {:.2} {:.2} {:.2}", r.timestamp, r.grid, r.solar, r.home))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn written(db: &DbClient, deadline: &Deadline) -> Vec<usize> {
    AggregationRunner::new()
        .run_all(db, deadline)
        .await
        .into_iter()
        .map(|report| report.result.unwrap().rows_written)
        .collect()
}

#[tokio::test]
async fn test_full_pass_fills_every_summary() {
    let (_dir, db) = open_db().await;
    seed(&db).await;

    assert_eq!(written(&db, &Deadline::unbounded()).await, [13, 1, 1, 1]);

    assert_eq!(db.count_rows(Table::FiveMinute).await.unwrap(), 13);
    insta::assert_snapshot!(render(&db, Table::Hourly).await, @"2024-03-01T10:00:00+00:00 100.00 300.00 400.00");
    insta::assert_snapshot!(render(&db, Table::Weekly).await, @"2024-02-26T00:00:00+00:00 10.50 42.00 28.00");
    insta::assert_snapshot!(render(&db, Table::Monthly).await, @"2024-02-01T00:00:00+00:00 6.00 24.00 16.00");
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let (_dir, db) = open_db().await;
    seed(&db).await;

    written(&db, &Deadline::unbounded()).await;
    assert_eq!(written(&db, &Deadline::unbounded()).await, [0, 0, 0, 0]);
    assert_eq!(db.count_rows(Table::FiveMinute).await.unwrap(), 13);
}

#[tokio::test]
async fn test_expired_deadline_then_catch_up() {
    let (_dir, db) = open_db().await;
    seed(&db).await;

    let expired = Deadline::with_grace(Utc::now(), Duration::seconds(60));
    let reports = AggregationRunner::new().run_all(&db, &expired).await;
    for report in reports {
        let outcome = report.result.unwrap();
        assert_eq!(outcome.rows_written, 0);
        assert_eq!(outcome.progress, Progress::DeadlineReached);
    }

    assert_eq!(written(&db, &Deadline::unbounded()).await, [13, 1, 1, 1]);
}

#[tokio::test]
async fn test_purged_fine_tables_rebuild() {
    let (_dir, db) = open_db().await;
    seed(&db).await;
    written(&db, &Deadline::unbounded()).await;
    let before = render(&db, Table::FiveMinute).await;

    let fine = [Resolution::FiveMinute.table(), Resolution::Hourly.table()];
    assert_eq!(db.clear_tables(&fine).await.unwrap(), 14);
    assert_eq!(db.count_rows(Table::FiveMinute).await.unwrap(), 0);
    assert_eq!(db.count_rows(Table::Weekly).await.unwrap(), 1);

    assert_eq!(written(&db, &Deadline::unbounded()).await, [13, 1, 0, 0]);
    assert_eq!(render(&db, Table::FiveMinute).await, before);
}

#[tokio::test]
async fn test_small_chunks_match_default() {
    let (_dir, db) = open_db().await;
    seed(&db).await;

    let runner = AggregationRunner::new().with_chunk_slots(2);
    loop {
        let reports = runner.run_all(&db, &Deadline::unbounded()).await;
        let total: usize = reports
            .into_iter()
            .map(|r| r.result.unwrap().rows_written)
            .sum();
        if total == 0 {
            break;
        }
    }

    assert_eq!(db.count_rows(Table::FiveMinute).await.unwrap(), 13);
    assert_eq!(db.count_rows(Table::Hourly).await.unwrap(), 1);
}
