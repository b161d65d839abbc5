//! Migration to create the remaining organization-scoped tables:
//! organization_invitations, organization_profile_edit_requests, and
//! custom_software_entries. All three cascade with their owning organization
//! through explicit ordered deletes in the reassignment workflow.

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
                    .table(OrganizationInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrganizationInvitations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrganizationInvitations::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationInvitations::Email)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationInvitations::Token)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationInvitations::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationInvitations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organization_invitations_organization_id")
                            .from(
                                OrganizationInvitations::Table,
                                OrganizationInvitations::OrganizationId,
                            )
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrganizationProfileEditRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrganizationProfileEditRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrganizationProfileEditRequests::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationProfileEditRequests::ProposedChanges)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationProfileEditRequests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(OrganizationProfileEditRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organization_profile_edit_requests_organization_id")
                            .from(
                                OrganizationProfileEditRequests::Table,
                                OrganizationProfileEditRequests::OrganizationId,
                            )
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomSoftwareEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomSoftwareEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomSoftwareEntries::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomSoftwareEntries::Name).text().not_null())
                    .col(ColumnDef::new(CustomSoftwareEntries::Vendor).text().null())
                    .col(ColumnDef::new(CustomSoftwareEntries::Notes).text().null())
                    .col(
                        ColumnDef::new(CustomSoftwareEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_software_entries_organization_id")
                            .from(
                                CustomSoftwareEntries::Table,
                                CustomSoftwareEntries::OrganizationId,
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
            .drop_table(
                Table::drop()
                    .table(CustomSoftwareEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(OrganizationProfileEditRequests::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(OrganizationInvitations::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum OrganizationInvitations {
    Table,
    Id,
    OrganizationId,
    Email,
    Token,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrganizationProfileEditRequests {
    Table,
    Id,
    OrganizationId,
    ProposedChanges,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CustomSoftwareEntries {
    Table,
    Id,
    OrganizationId,
    Name,
    Vendor,
    Notes,
    CreatedAt,
}
