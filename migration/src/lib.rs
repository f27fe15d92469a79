pub use sea_orm_migration::prelude::*;

mod m20260810_101500_create_users_table;
mod m20260810_102200_create_courses_table;
mod m20260810_103000_create_payments_table;
mod m20260811_091500_create_progress_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260810_101500_create_users_table::Migration),
            Box::new(m20260810_102200_create_courses_table::Migration),
            Box::new(m20260810_103000_create_payments_table::Migration),
            Box::new(m20260811_091500_create_progress_table::Migration),
        ]
    }
}
