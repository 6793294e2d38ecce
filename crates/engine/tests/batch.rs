mod common;

use common::*;
use engine::{SyncOptions, SyncStrategy};

#[tokio::test]
async fn active_partners_cover_both_roles_and_both_event_kinds() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let ordered = customer(&db, "C-001", "Ordered", None).await;
    let paying = customer(&db, "C-002", "Paying", None).await;
    let previous_year = customer(&db, "C-003", "Last year", None).await;
    let cancelled = customer(&db, "C-004", "Cancelled", None).await;
    let s = supplier(&db, "S-001", "Steelworks", None).await;

    order(&db, ordered, "SO-1", units(100), at(2024, 2, 1), "completed").await;
    order(&db, ordered, "SO-2", units(100), at(2024, 3, 1), "completed").await;
    payment(&db, paying, "RC-1", units(50), at(2024, 4, 1)).await;
    order(&db, previous_year, "SO-3", units(100), at(2023, 12, 31), "completed").await;
    order(&db, cancelled, "SO-4", units(100), at(2024, 5, 1), "cancelled").await;
    payment(&db, s, "PV-1", units(75), at(2024, 6, 1)).await;

    let active = engine.active_partners(year(2024)).await.unwrap();
    assert_eq!(active.len(), 3);
    assert!(active.contains(&ordered));
    assert!(active.contains(&paying));
    assert!(active.contains(&s));
    assert!(!active.contains(&previous_year));
    assert!(!active.contains(&cancelled));
    // Customers come before suppliers.
    assert_eq!(active.last(), Some(&s));
}

#[tokio::test]
async fn full_batch_syncs_every_active_partner() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let a = customer(&db, "C-001", "Alpha", None).await;
    let b = customer(&db, "C-002", "Beta", None).await;
    let s = supplier(&db, "S-001", "Steelworks", None).await;
    let idle = customer(&db, "C-003", "Idle", None).await;
    order(&db, a, "SO-1", units(100), at(2023, 2, 1), "completed").await;
    order(&db, a, "SO-2", units(100), at(2024, 2, 1), "completed").await;
    payment(&db, b, "RC-1", units(50), at(2024, 4, 1)).await;
    order(&db, s, "PO-1", units(70), at(2024, 6, 1), "received").await;

    let summary = engine.sync_full_all(year(2024)).await.unwrap();

    assert_eq!(summary.strategy, SyncStrategy::Full);
    assert_eq!(summary.total_checked, 3);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 0);
    assert!(summary.failures.is_empty());

    for partner in [a, b, s] {
        assert!(engine.period(partner, year(2024)).await.unwrap().is_some());
    }
    assert!(engine.period(idle, year(2024)).await.unwrap().is_none());
    // Full strategy backfilled Alpha's first year too.
    assert!(engine.period(a, year(2023)).await.unwrap().is_some());
}

#[tokio::test]
async fn batch_records_failures_and_keeps_going() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let a = customer(&db, "C-001", "Alpha", None).await;
    let b = customer(&db, "C-002", "Beta", None).await;
    let s = supplier(&db, "S-001", "Steelworks", None).await;
    order(&db, a, "SO-1", units(100), at(2024, 2, 1), "completed").await;
    payment(&db, b, "RC-1", units(50), at(2024, 4, 1)).await;
    order(&db, s, "PO-1", units(70), at(2024, 6, 1), "received").await;

    engine
        .sync_snap(a, year(2024), &SyncOptions::default())
        .await
        .unwrap();
    engine.lock_period(a, year(2024)).await.unwrap();

    let summary = engine.sync_snap_all(year(2024)).await.unwrap();

    assert_eq!(summary.total_checked, 3);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(
        summary.success_count + summary.failure_count,
        summary.total_checked
    );
    assert_eq!(summary.failures[0].partner, a);
    assert!(summary.failures[0].message.contains("locked"));
    assert!(engine.period(b, year(2024)).await.unwrap().is_some());
    assert!(engine.period(s, year(2024)).await.unwrap().is_some());
}

#[tokio::test]
async fn empty_year_is_a_successful_empty_batch() {
    let (engine, _db) = engine_on(day(2024, 9, 1)).await;

    let summary = engine.sync_all(year(2019), SyncStrategy::Snapshot).await.unwrap();
    assert_eq!(summary.total_checked, 0);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failure_count, 0);
}
