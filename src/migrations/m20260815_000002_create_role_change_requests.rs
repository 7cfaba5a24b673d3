//! Migration: Create role_change_requests table

use sea_orm_migration::prelude::*;

use super::m20260815_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleChangeRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleChangeRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::Organization)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::FromRole)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoleChangeRequests::ToRole).string().not_null())
                    .col(
                        ColumnDef::new(RoleChangeRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::RequestedByName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::RequestedByEmail)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoleChangeRequests::Reason).string().null())
                    .col(
                        ColumnDef::new(RoleChangeRequests::AdminResponse)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RoleChangeRequests::ProcessedBy)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_change_requests_user")
                            .from(RoleChangeRequests::Table, RoleChangeRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_change_requests_org_status")
                    .table(RoleChangeRequests::Table)
                    .col(RoleChangeRequests::Organization)
                    .col(RoleChangeRequests::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(RoleChangeRequests::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum RoleChangeRequests {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    Organization,
    #[iden = "from_role"]
    FromRole,
    #[iden = "to_role"]
    ToRole,
    Status,
    #[iden = "requested_by_name"]
    RequestedByName,
    #[iden = "requested_by_email"]
    RequestedByEmail,
    Reason,
    #[iden = "admin_response"]
    AdminResponse,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "processed_at"]
    ProcessedAt,
    #[iden = "processed_by"]
    ProcessedBy,
}
