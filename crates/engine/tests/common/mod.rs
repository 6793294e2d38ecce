#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use uuid::Uuid;

use engine::{
    Engine, EngineBuilder, EngineError, LedgerConfig, Money, Notification, Notifier, PartnerRef,
    PeriodYear,
};
use migration::MigratorTrait;

pub fn year(value: i32) -> PeriodYear {
    PeriodYear::new(value).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).single().unwrap()
}

pub fn units(value: i64) -> Money {
    Money::from_units(value)
}

pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub fn builder(db: &DatabaseConnection, today: NaiveDate) -> EngineBuilder {
    Engine::builder()
        .database(db.clone())
        .config(LedgerConfig::default())
        .today(today)
}

/// Engine whose "today" is `today`, on a fresh migrated database.
pub async fn engine_on(today: NaiveDate) -> (Engine, DatabaseConnection) {
    let db = database().await;
    let engine = builder(&db, today).build().await.unwrap();
    (engine, db)
}

pub async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        values,
    ))
    .await
    .unwrap();
}

pub async fn customer(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    email: Option<&str>,
) -> PartnerRef {
    let id = Uuid::new_v4();
    exec(
        db,
        "INSERT INTO customers (id, code, name, email, current_debt) VALUES (?, ?, ?, ?, 0)",
        vec![
            id.to_string().into(),
            code.into(),
            name.into(),
            email.map(ToString::to_string).into(),
        ],
    )
    .await;
    PartnerRef::Customer(id)
}

pub async fn supplier(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    email: Option<&str>,
) -> PartnerRef {
    let id = Uuid::new_v4();
    exec(
        db,
        "INSERT INTO suppliers (id, code, name, email, total_payable) VALUES (?, ?, ?, ?, 0)",
        vec![
            id.to_string().into(),
            code.into(),
            name.into(),
            email.map(ToString::to_string).into(),
        ],
    )
    .await;
    PartnerRef::Supplier(id)
}

/// Order for a customer (sales) or a supplier (purchase).
pub async fn order(
    db: &DatabaseConnection,
    partner: PartnerRef,
    code: &str,
    amount: Money,
    when: DateTime<Utc>,
    status: &str,
) {
    let sql = match partner {
        PartnerRef::Customer(_) => {
            "INSERT INTO sales_orders (id, code, customer_id, total_amount, status, order_date) \
             VALUES (?, ?, ?, ?, ?, ?)"
        }
        PartnerRef::Supplier(_) => {
            "INSERT INTO purchase_orders (id, code, supplier_id, total_amount, status, order_date) \
             VALUES (?, ?, ?, ?, ?, ?)"
        }
    };
    exec(
        db,
        sql,
        vec![
            Uuid::new_v4().to_string().into(),
            code.into(),
            partner.id().to_string().into(),
            amount.minor().into(),
            status.into(),
            when.into(),
        ],
    )
    .await;
}

/// Receipt from a customer or voucher to a supplier.
pub async fn payment(
    db: &DatabaseConnection,
    partner: PartnerRef,
    code: &str,
    amount: Money,
    when: DateTime<Utc>,
) {
    let sql = match partner {
        PartnerRef::Customer(_) => {
            "INSERT INTO payment_receipts (id, code, customer_id, amount, receipt_date) \
             VALUES (?, ?, ?, ?, ?)"
        }
        PartnerRef::Supplier(_) => {
            "INSERT INTO payment_vouchers (id, code, supplier_id, amount, payment_date) \
             VALUES (?, ?, ?, ?, ?)"
        }
    };
    exec(
        db,
        sql,
        vec![
            Uuid::new_v4().to_string().into(),
            code.into(),
            partner.id().to_string().into(),
            amount.minor().into(),
            when.into(),
        ],
    )
    .await;
}

/// `kind` is `"return"` or `"adjustment"`.
pub async fn adjustment(
    db: &DatabaseConnection,
    partner: PartnerRef,
    kind: &str,
    amount: Money,
    when: DateTime<Utc>,
) {
    exec(
        db,
        "INSERT INTO debt_adjustments (id, partner_kind, partner_id, kind, amount, occurred_at, note) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().to_string().into(),
            partner.kind().as_str().into(),
            partner.id().to_string().into(),
            kind.into(),
            amount.minor().into(),
            when.into(),
            Some(format!("{kind} booked")).into(),
        ],
    )
    .await;
}

/// Notifier that keeps every message it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), EngineError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
