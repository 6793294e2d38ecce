use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    DebtListFilter, DebtStatus, Engine, LedgerConfig, Money, NoticeKind, PartnerKind, PartnerRef,
    PeriodYear, SyncOptions, SyncStrategy,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "debtbook_admin")]
#[command(about = "Debt ledger maintenance: sync, audit and inspect partner balances")]
struct Cli {
    /// Optional settings file (TOML, without extension).
    #[arg(long)]
    config: Option<String>,

    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Audit tolerance as a decimal amount (`12.50`), over `[ledger] tolerance`.
    #[arg(long, global = true)]
    tolerance: Option<Money>,

    /// Paid threshold as a decimal amount, over `[ledger] paid_threshold`.
    #[arg(long, global = true)]
    paid_threshold: Option<Money>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute one partner's period.
    Sync(SyncArgs),
    /// Recompute every partner active in a year.
    SyncAll(SyncAllArgs),
    /// Audit a year of the ledger. Exits with 1 when defects are found.
    Check(YearArgs),
    List(ListArgs),
    Detail(PartnerYearArgs),
    Lock(PartnerYearArgs),
    Unlock(PartnerYearArgs),
    /// Send a balance reminder, or a period reconciliation with `--year`.
    Notify(NotifyArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Full,
    Snapshot,
}

impl From<Strategy> for SyncStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::Full => SyncStrategy::Full,
            Strategy::Snapshot => SyncStrategy::Snapshot,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Customer,
    Supplier,
}

impl From<Kind> for PartnerKind {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Customer => PartnerKind::Customer,
            Kind::Supplier => PartnerKind::Supplier,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Status {
    Paid,
    Unpaid,
}

impl From<Status> for DebtStatus {
    fn from(value: Status) -> Self {
        match value {
            Status::Paid => DebtStatus::Paid,
            Status::Unpaid => DebtStatus::Unpaid,
        }
    }
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// `customer:<uuid>` or `supplier:<uuid>`.
    #[arg(long)]
    partner: PartnerRef,
    #[arg(long)]
    year: PeriodYear,
    #[arg(long, value_enum, default_value = "snapshot")]
    strategy: Strategy,
    /// Note appended to the period.
    #[arg(long)]
    notes: Option<String>,
    /// New responsible user; an empty value clears it.
    #[arg(long)]
    assign: Option<String>,
}

#[derive(Args, Debug)]
struct SyncAllArgs {
    #[arg(long)]
    year: PeriodYear,
    #[arg(long, value_enum, default_value = "snapshot")]
    strategy: Strategy,
}

#[derive(Args, Debug)]
struct YearArgs {
    #[arg(long)]
    year: PeriodYear,
}

#[derive(Args, Debug)]
struct PartnerYearArgs {
    #[arg(long)]
    partner: PartnerRef,
    #[arg(long)]
    year: PeriodYear,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, value_enum)]
    kind: Option<Kind>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    assigned: Option<String>,
    #[arg(long, value_enum)]
    status: Option<Status>,
    #[arg(long)]
    year: Option<PeriodYear>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 20)]
    page_size: u32,
}

#[derive(Args, Debug)]
struct NotifyArgs {
    #[arg(long)]
    partner: PartnerRef,
    #[arg(long)]
    year: Option<PeriodYear>,
}

impl Cli {
    fn ledger_config(&self, mut ledger: LedgerConfig) -> LedgerConfig {
        if let Some(tolerance) = self.tolerance {
            ledger.tolerance = tolerance;
        }
        if let Some(paid_threshold) = self.paid_threshold {
            ledger.paid_threshold = paid_threshold;
        }
        ledger
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await.map_err(|err| {
        tracing::error!("failed to connect to database: {err}");
        err
    })?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("database ready, migrations applied");
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "debtbook_admin={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let ledger = cli.ledger_config(settings.ledger);
    let database_url = cli
        .database_url
        .clone()
        .or(settings.database.url)
        .unwrap_or_else(|| settings::DEFAULT_DATABASE_URL.to_string());
    let db = connect_db(&database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .config(ledger)
        .build()
        .await?;

    match cli.command {
        Command::Sync(args) => {
            let options = SyncOptions {
                notes: args.notes,
                assigned_user_id: args.assign,
            };
            let period = engine
                .sync(args.partner, args.year, args.strategy.into(), &options)
                .await?;
            print_json(&period)?;
        }
        Command::SyncAll(args) => {
            let summary = engine.sync_all(args.year, args.strategy.into()).await?;
            print_json(&summary)?;
        }
        Command::Check(args) => {
            let report = engine.check_integrity(args.year).await?;
            print_json(&report)?;
            if !report.is_clean() {
                tracing::warn!(
                    year = %args.year,
                    defects = report.total_defects,
                    "integrity check failed"
                );
                std::process::exit(1);
            }
        }
        Command::List(args) => {
            let filter = DebtListFilter {
                partner_kind: args.kind.map(Into::into),
                search: args.search,
                assigned_user_id: args.assigned,
                status: args.status.map(Into::into),
                year: args.year,
                page: args.page,
                page_size: args.page_size,
            };
            print_json(&engine.list(&filter).await?)?;
        }
        Command::Detail(args) => {
            print_json(&engine.detail(args.partner, args.year).await?)?;
        }
        Command::Lock(args) => {
            engine.lock_period(args.partner, args.year).await?;
            tracing::info!(partner = %args.partner, year = %args.year, "period locked");
            println!("locked: {} {}", args.partner, args.year);
        }
        Command::Unlock(args) => {
            engine.unlock_period(args.partner, args.year).await?;
            tracing::info!(partner = %args.partner, year = %args.year, "period unlocked");
            println!("unlocked: {} {}", args.partner, args.year);
        }
        Command::Notify(args) => {
            let kind = match args.year {
                Some(year) => NoticeKind::PeriodReconciliation { year },
                None => NoticeKind::BalanceReminder,
            };
            print_json(&engine.notify_partner(args.partner, kind).await?)?;
        }
    }

    Ok(())
}
