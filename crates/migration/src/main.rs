use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "Usage: migration [up|down [steps]|fresh|refresh|status]";

/// Schema actions on the debt ledger database.
enum Action {
    Up,
    /// Roll back `steps` migrations (one by default).
    Down(u32),
    Fresh,
    Refresh,
    Status,
}

fn parse_action(mut args: impl Iterator<Item = String>) -> Option<Action> {
    let action = match args.next().as_deref().unwrap_or("up") {
        "up" => Action::Up,
        "down" => match args.next() {
            Some(steps) => Action::Down(steps.parse().ok()?),
            None => Action::Down(1),
        },
        "fresh" => Action::Fresh,
        "refresh" => Action::Refresh,
        "status" => Action::Status,
        _ => return None,
    };
    Some(action)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(action) = parse_action(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./debtbook.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match action {
        Action::Up => migration::Migrator::up(&db, None).await?,
        Action::Down(steps) => migration::Migrator::down(&db, Some(steps)).await?,
        Action::Fresh => migration::Migrator::fresh(&db).await?,
        Action::Refresh => migration::Migrator::refresh(&db).await?,
        Action::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
