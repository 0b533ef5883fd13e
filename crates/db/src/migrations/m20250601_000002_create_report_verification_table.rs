//! Create report_verification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportVerification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportVerification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportVerification::ReportId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportVerification::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportVerification::PhotoUrl).text().not_null())
                    .col(
                        ColumnDef::new(ReportVerification::VerifiedBy)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportVerification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_verification_report")
                            .from(ReportVerification::Table, ReportVerification::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (report_id, created_at) for ordered verification history
        manager
            .create_index(
                Index::create()
                    .name("idx_report_verification_report_created")
                    .table(ReportVerification::Table)
                    .col(ReportVerification::ReportId)
                    .col(ReportVerification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportVerification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportVerification {
    Table,
    Id,
    ReportId,
    Description,
    PhotoUrl,
    VerifiedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
