mod common;

use std::sync::Arc;

use common::*;
use engine::{
    DebtListFilter, DebtStatus, EngineError, EventKind, LedgerConfig, MemoryCache, Money,
    PartnerKind, PartnerRef, SyncOptions,
};
use uuid::Uuid;

#[tokio::test]
async fn typed_list_includes_partners_without_periods() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let acme = customer(&db, "C-001", "Acme", None).await;
    let zeta = customer(&db, "C-002", "Zeta", None).await;
    let _steel = supplier(&db, "S-001", "Steelworks", None).await;
    order(&db, acme, "SO-1", units(1_000), at(2024, 1, 10), "completed").await;
    engine
        .sync_snap(acme, year(2024), &SyncOptions::default())
        .await
        .unwrap();

    let page = engine
        .list(&DebtListFilter {
            partner_kind: Some(PartnerKind::Customer),
            year: Some(year(2024)),
            ..DebtListFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    let partners: Vec<_> = page.items.iter().map(|item| item.partner).collect();
    assert_eq!(partners, vec![acme, zeta]);

    let acme_row = &page.items[0];
    assert!(acme_row.has_period);
    assert_eq!(acme_row.closing_balance, units(1_000));
    assert_eq!(acme_row.status, DebtStatus::Unpaid);

    let zeta_row = &page.items[1];
    assert!(!zeta_row.has_period);
    assert_eq!(zeta_row.closing_balance, Money::ZERO);
    assert_eq!(zeta_row.status, DebtStatus::Paid);

    assert_eq!(page.summary.increase, units(1_000));
    assert_eq!(page.summary.closing, units(1_000));
}

#[tokio::test]
async fn untyped_list_only_shows_stored_periods() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let acme = customer(&db, "C-001", "Acme", None).await;
    let _idle = customer(&db, "C-002", "Idle", None).await;
    let steel = supplier(&db, "S-001", "Steelworks", None).await;
    order(&db, acme, "SO-1", units(1_000), at(2024, 1, 10), "completed").await;
    payment(&db, acme, "RC-1", units(400), at(2024, 2, 10)).await;
    order(&db, steel, "PO-1", units(300), at(2024, 3, 10), "received").await;
    engine.sync_full_all(year(2024)).await.unwrap();

    let page = engine
        .list(&DebtListFilter {
            year: Some(year(2024)),
            ..DebtListFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    let names: Vec<_> = page.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Acme", "Steelworks"]);
    assert_eq!(page.items[1].partner, steel);
    assert_eq!(page.summary.increase, units(1_300));
    assert_eq!(page.summary.decrease, units(400));
    assert_eq!(page.summary.closing, units(900));
}

#[tokio::test]
async fn filters_narrow_rows_and_summary_together() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let acme = customer(&db, "C-001", "Acme Trading", None).await;
    let beta = customer(&db, "C-002", "Beta", None).await;
    let gamma = customer(&db, "X-100", "Gamma", None).await;
    order(&db, acme, "SO-1", units(1_000), at(2024, 1, 10), "completed").await;
    order(&db, beta, "SO-2", units(500), at(2024, 1, 10), "completed").await;
    payment(&db, beta, "RC-1", units(500), at(2024, 1, 20)).await;
    order(&db, gamma, "SO-3", units(50), at(2024, 1, 10), "completed").await;

    let assign = SyncOptions {
        assigned_user_id: Some("u-9".to_string()),
        ..SyncOptions::default()
    };
    engine.sync_snap(acme, year(2024), &assign).await.unwrap();
    engine.sync_snap(beta, year(2024), &assign).await.unwrap();
    engine
        .sync_snap(gamma, year(2024), &SyncOptions::default())
        .await
        .unwrap();

    let base = DebtListFilter {
        partner_kind: Some(PartnerKind::Customer),
        year: Some(year(2024)),
        ..DebtListFilter::default()
    };

    let unpaid = engine
        .list(&DebtListFilter {
            status: Some(DebtStatus::Unpaid),
            ..base.clone()
        })
        .await
        .unwrap();
    let partners: Vec<_> = unpaid.items.iter().map(|item| item.partner).collect();
    assert_eq!(partners, vec![acme, gamma]);
    assert_eq!(unpaid.summary.closing, units(1_050));

    let searched = engine
        .list(&DebtListFilter {
            search: Some("x-1".to_string()),
            ..base.clone()
        })
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.items[0].partner, gamma);

    let by_name = engine
        .list(&DebtListFilter {
            search: Some("TRADING".to_string()),
            ..base.clone()
        })
        .await
        .unwrap();
    assert_eq!(by_name.items[0].partner, acme);

    let assigned = engine
        .list(&DebtListFilter {
            assigned_user_id: Some("u-9".to_string()),
            ..base.clone()
        })
        .await
        .unwrap();
    assert_eq!(assigned.total, 2);
    assert_eq!(assigned.summary.increase, units(1_500));
}

#[tokio::test]
async fn pages_split_the_rows_but_not_the_summary() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    for (code, name) in [("C-1", "Anna"), ("C-2", "Bruno"), ("C-3", "Carla")] {
        let c = customer(&db, code, name, None).await;
        order(&db, c, code, units(100), at(2024, 5, 5), "completed").await;
    }
    engine.sync_snap_all(year(2024)).await.unwrap();

    let page = engine
        .list(&DebtListFilter {
            year: Some(year(2024)),
            page: 2,
            page_size: 2,
            ..DebtListFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Carla");
    assert_eq!(page.summary.closing, units(300));
}

#[tokio::test]
async fn invalid_paging_is_rejected() {
    let (engine, _db) = engine_on(day(2024, 9, 1)).await;

    let err = engine
        .list(&DebtListFilter {
            page: 0,
            ..DebtListFilter::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFilter(_)));

    let err = engine
        .list(&DebtListFilter {
            page_size: 1_000,
            ..DebtListFilter::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFilter(_)));
}

#[tokio::test]
async fn without_a_year_rows_show_the_latest_period() {
    let (engine, db) = engine_on(day(2025, 2, 1)).await;
    let acme = customer(&db, "C-001", "Acme", None).await;
    let zeta = customer(&db, "C-002", "Zeta", None).await;
    order(&db, acme, "SO-1", units(1_000_000), at(2024, 1, 15), "completed").await;
    payment(&db, acme, "RC-1", units(600_000), at(2024, 6, 10)).await;
    order(&db, zeta, "SO-2", units(5), at(2023, 4, 1), "completed").await;
    engine
        .sync_snap(acme, year(2024), &SyncOptions::default())
        .await
        .unwrap();
    engine
        .sync_full(zeta, year(2024), &SyncOptions::default())
        .await
        .unwrap();
    // Older acme row must not win over 2024.
    engine
        .sync_snap(acme, year(2023), &SyncOptions::default())
        .await
        .unwrap();

    let unpaid = engine
        .list(&DebtListFilter {
            partner_kind: Some(PartnerKind::Customer),
            status: Some(DebtStatus::Unpaid),
            ..DebtListFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(unpaid.year, None);
    assert_eq!(unpaid.total, 1);
    let row = &unpaid.items[0];
    assert_eq!(row.partner, acme);
    assert_eq!(row.year, Some(year(2024)));
    assert!(row.has_period);
    assert_eq!(row.closing_balance, units(400_000));
    assert_eq!(unpaid.summary.closing, units(400_000));

    let untyped = engine.list(&DebtListFilter::default()).await.unwrap();
    assert_eq!(untyped.total, 2);
    let rows: Vec<_> = untyped
        .items
        .iter()
        .map(|item| (item.partner, item.year, item.closing_balance))
        .collect();
    assert_eq!(
        rows,
        vec![
            (acme, Some(year(2024)), units(400_000)),
            (zeta, Some(year(2024)), units(5)),
        ]
    );
}

#[tokio::test]
async fn typed_latest_view_zeroes_partners_without_periods() {
    let (engine, db) = engine_on(day(2025, 2, 1)).await;
    let idle = customer(&db, "C-001", "Idle", None).await;

    let page = engine
        .list(&DebtListFilter {
            partner_kind: Some(PartnerKind::Customer),
            ..DebtListFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].partner, idle);
    assert_eq!(page.items[0].year, None);
    assert!(!page.items[0].has_period);
    assert_eq!(page.items[0].status, DebtStatus::Paid);
}

#[tokio::test]
async fn cached_views_are_dropped_after_a_sync() {
    let db = database().await;
    let cache = Arc::new(MemoryCache::new());
    let engine = builder(&db, day(2024, 9, 1))
        .cache(cache.clone())
        .build()
        .await
        .unwrap();
    let c = customer(&db, "C-001", "Acme", None).await;
    order(&db, c, "SO-1", units(100), at(2024, 5, 5), "completed").await;
    engine
        .sync_snap(c, year(2024), &SyncOptions::default())
        .await
        .unwrap();

    let filter = DebtListFilter {
        year: Some(year(2024)),
        ..DebtListFilter::default()
    };
    let first = engine.list(&filter).await.unwrap();
    engine.detail(c, year(2024)).await.unwrap();
    assert_eq!(cache.len(), 2);

    // Source data changes are invisible until a sync commits.
    order(&db, c, "SO-2", units(50), at(2024, 6, 5), "completed").await;
    assert_eq!(engine.list(&filter).await.unwrap(), first);

    engine
        .sync_snap(c, year(2024), &SyncOptions::default())
        .await
        .unwrap();
    assert!(cache.is_empty());

    let fresh = engine.list(&filter).await.unwrap();
    assert_eq!(fresh.items[0].closing_balance, units(150));
}

#[tokio::test]
async fn oversized_cache_ttl_is_capped() {
    let db = database().await;
    let cache = Arc::new(MemoryCache::new());
    let engine = builder(&db, day(2024, 9, 1))
        .config(LedgerConfig {
            cache_ttl_secs: u64::MAX,
            ..LedgerConfig::default()
        })
        .cache(cache.clone())
        .build()
        .await
        .unwrap();
    customer(&db, "C-001", "Acme", None).await;

    let filter = DebtListFilter {
        partner_kind: Some(PartnerKind::Customer),
        ..DebtListFilter::default()
    };
    let first = engine.list(&filter).await.unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(engine.list(&filter).await.unwrap(), first);
}

#[tokio::test]
async fn detail_flattens_the_year_history() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let c = customer(&db, "C-001", "Acme", Some("billing@acme.test")).await;
    order(&db, c, "SO-1", units(1_000), at(2024, 1, 15), "completed").await;
    order(&db, c, "SO-X", units(9_000), at(2024, 2, 1), "cancelled").await;
    payment(&db, c, "RC-1", units(600), at(2024, 6, 10)).await;
    adjustment(&db, c, "return", units(50), at(2024, 3, 3)).await;
    order(&db, c, "SO-0", units(70), at(2023, 12, 31), "completed").await;
    engine
        .sync_snap(c, year(2024), &SyncOptions::default())
        .await
        .unwrap();

    let detail = engine.detail(c, year(2024)).await.unwrap();

    assert_eq!(detail.partner.partner, c);
    assert_eq!(detail.partner.email.as_deref(), Some("billing@acme.test"));
    assert!(detail.period.id.is_some());
    assert_eq!(detail.period.closing_balance, units(420));

    let kinds: Vec<_> = detail.history.iter().map(|line| line.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::Increase, EventKind::Return, EventKind::Decrease]
    );
    assert_eq!(detail.history[0].reference, "SO-1");
    assert_eq!(detail.history[1].note.as_deref(), Some("return booked"));
    assert_eq!(detail.history[2].amount, units(600));
}

#[tokio::test]
async fn detail_of_an_unsynced_year_is_zeroed() {
    let (engine, db) = engine_on(day(2024, 9, 1)).await;
    let c = customer(&db, "C-001", "Acme", None).await;

    let detail = engine.detail(c, year(2021)).await.unwrap();
    assert!(detail.period.id.is_none());
    assert_eq!(detail.period.closing_balance, Money::ZERO);
    assert!(detail.history.is_empty());

    let err = engine
        .detail(PartnerRef::Supplier(Uuid::new_v4()), year(2021))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
