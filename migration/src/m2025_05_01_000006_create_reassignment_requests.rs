//! Migration to create the reassignment_requests table.
//!
//! A reassignment request proposes replacing an organization's primary
//! contact. Approval repoints organization_id to the replacement row before
//! the old organization is deleted, so the column must stay valid at every
//! step of the swap.

use sea_orm_migration::prelude::*;

use crate::m2025_05_01_000002_create_organizations::Organizations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReassignmentRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReassignmentRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::NewContactEmail)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::NewOrganizationData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::NewContactData)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ReassignmentRequests::ReviewedBy).uuid().null())
                    .col(
                        ColumnDef::new(ReassignmentRequests::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReassignmentRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reassignment_requests_organization_id")
                            .from(
                                ReassignmentRequests::Table,
                                ReassignmentRequests::OrganizationId,
                            )
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReassignmentRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ReassignmentRequests {
    Table,
    Id,
    OrganizationId,
    NewContactEmail,
    NewOrganizationData,
    NewContactData,
    Status,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
}
