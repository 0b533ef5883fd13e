//! Create severity_assessment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeverityAssessment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeverityAssessment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SeverityAssessment::ReportId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeverityAssessment::SubmitterId)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeverityAssessment::Severity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeverityAssessment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SeverityAssessment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_severity_assessment_report")
                            .from(SeverityAssessment::Table, SeverityAssessment::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (report_id, submitter_id) - one live score per submitter
        manager
            .create_index(
                Index::create()
                    .name("idx_severity_assessment_report_submitter")
                    .table(SeverityAssessment::Table)
                    .col(SeverityAssessment::ReportId)
                    .col(SeverityAssessment::SubmitterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SeverityAssessment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SeverityAssessment {
    Table,
    Id,
    ReportId,
    SubmitterId,
    Severity,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
