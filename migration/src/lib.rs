//! Database migrations for the Membership API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_05_01_000001_create_profiles;
mod m2025_05_01_000002_create_organizations;
mod m2025_05_01_000003_create_pending_registrations;
mod m2025_05_01_000004_create_user_roles;
mod m2025_05_01_000005_create_invoices;
mod m2025_05_01_000006_create_reassignment_requests;
mod m2025_05_01_000007_create_organization_dependents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_05_01_000001_create_profiles::Migration),
            Box::new(m2025_05_01_000002_create_organizations::Migration),
            Box::new(m2025_05_01_000003_create_pending_registrations::Migration),
            Box::new(m2025_05_01_000004_create_user_roles::Migration),
            Box::new(m2025_05_01_000005_create_invoices::Migration),
            Box::new(m2025_05_01_000006_create_reassignment_requests::Migration),
            Box::new(m2025_05_01_000007_create_organization_dependents::Migration),
        ]
    }
}
