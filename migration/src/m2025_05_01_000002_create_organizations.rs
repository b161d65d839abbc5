//! Migration to create the organizations table.
//!
//! The organization name carries a UNIQUE constraint. The reassignment
//! workflow relies on the constraint violation as its race signal when
//! swapping which row owns a name, so the uniqueness must live in the store
//! rather than in a read-then-write check.

use sea_orm_migration::prelude::*;

use crate::m2025_05_01_000001_create_profiles::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Organizations::Name)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Organizations::Address).text().null())
                    .col(ColumnDef::new(Organizations::City).text().null())
                    .col(ColumnDef::new(Organizations::State).text().null())
                    .col(ColumnDef::new(Organizations::PostalCode).text().null())
                    .col(ColumnDef::new(Organizations::Website).text().null())
                    .col(ColumnDef::new(Organizations::Phone).text().null())
                    .col(ColumnDef::new(Organizations::EnrollmentSize).integer().null())
                    .col(
                        ColumnDef::new(Organizations::MembershipStatus)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Organizations::MembershipStartDate)
                            .date()
                            .null(),
                    )
                    .col(ColumnDef::new(Organizations::AnnualFee).integer().null())
                    .col(
                        ColumnDef::new(Organizations::ContactPersonId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Organizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organizations_contact_person_id")
                            .from(Organizations::Table, Organizations::ContactPersonId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Organizations {
    Table,
    Id,
    Name,
    Address,
    City,
    State,
    PostalCode,
    Website,
    Phone,
    EnrollmentSize,
    MembershipStatus,
    MembershipStartDate,
    AnnualFee,
    ContactPersonId,
    CreatedAt,
    UpdatedAt,
}
