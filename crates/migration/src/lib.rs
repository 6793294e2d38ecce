pub use sea_orm_migration::prelude::*;

mod m20260301_000000_partners_and_sources;
mod m20260310_000000_debt_periods;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000000_partners_and_sources::Migration),
            Box::new(m20260310_000000_debt_periods::Migration),
        ]
    }
}
