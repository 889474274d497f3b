pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_users_table;
mod m20260101_000002_create_projects_table;
mod m20260101_000003_create_sales_tables;
mod m20260101_000004_create_expenses_tables;
mod m20260101_000005_create_checks_tables;
mod m20260101_000006_create_company_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users_table::Migration),
            Box::new(m20260101_000002_create_projects_table::Migration),
            Box::new(m20260101_000003_create_sales_tables::Migration),
            Box::new(m20260101_000004_create_expenses_tables::Migration),
            Box::new(m20260101_000005_create_checks_tables::Migration),
            Box::new(m20260101_000006_create_company_settings_table::Migration),
        ]
    }
}
