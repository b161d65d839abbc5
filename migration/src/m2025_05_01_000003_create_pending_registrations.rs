//! Migration to create the pending_registrations table.
//!
//! Holds self-submitted membership applications until an admin approves or
//! rejects them. The registrant-chosen password is stored only until the
//! Identity Provider user has been provisioned, then cleared.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PendingRegistrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingRegistrations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PendingRegistrations::Email).text().not_null())
                    .col(
                        ColumnDef::new(PendingRegistrations::FirstName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::LastName)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingRegistrations::Phone).text().null())
                    .col(ColumnDef::new(PendingRegistrations::Title).text().null())
                    .col(ColumnDef::new(PendingRegistrations::Password).text().null())
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationAddress)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationCity)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationState)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationPostalCode)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::OrganizationWebsite)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::EnrollmentSize)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::ApprovalStatus)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::PriorityLevel)
                            .text()
                            .not_null()
                            .default("normal"),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::RejectionReason)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(PendingRegistrations::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(PendingRegistrations::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PendingRegistrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Intake scans for duplicates by organization name and by email.
        manager
            .create_index(
                Index::create()
                    .name("idx_pending_registrations_organization_name")
                    .table(PendingRegistrations::Table)
                    .col(PendingRegistrations::OrganizationName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PendingRegistrations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PendingRegistrations {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    Phone,
    Title,
    Password,
    OrganizationName,
    OrganizationAddress,
    OrganizationCity,
    OrganizationState,
    OrganizationPostalCode,
    OrganizationWebsite,
    EnrollmentSize,
    ApprovalStatus,
    PriorityLevel,
    RejectionReason,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
}
