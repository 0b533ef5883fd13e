//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Report::Label).text().not_null())
                    .col(ColumnDef::new(Report::Description).text())
                    .col(ColumnDef::new(Report::ReportType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Report::Severity)
                            .integer()
                            .not_null()
                            .check(
                                Expr::col(Report::Severity)
                                    .gte(1)
                                    .and(Expr::col(Report::Severity).lte(5)),
                            ),
                    )
                    .col(ColumnDef::new(Report::Latitude).double().not_null())
                    .col(ColumnDef::new(Report::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Report::LocationName)
                            .string_len(512)
                            .not_null()
                            .default("Unknown location"),
                    )
                    .col(
                        ColumnDef::new(Report::NotifyAuthority)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Report::Upvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Report::EngagementCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Report::VerifiedBy).string_len(256))
                    .col(ColumnDef::new(Report::ActionActed).boolean())
                    .col(ColumnDef::new(Report::ActionStatus).string_len(256))
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: report_type (similar-report counting, type filters)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_report_type")
                    .table(Report::Table)
                    .col(Report::ReportType)
                    .to_owned(),
            )
            .await?;

        // Index: (latitude, longitude) for box queries
        manager
            .create_index(
                Index::create()
                    .name("idx_report_location")
                    .table(Report::Table)
                    .col(Report::Latitude)
                    .col(Report::Longitude)
                    .to_owned(),
            )
            .await?;

        // Index: created_at DESC (newest-first listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_created_at")
                    .table(Report::Table)
                    .col((Report::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ImageUrl,
    Label,
    Description,
    ReportType,
    Severity,
    Latitude,
    Longitude,
    LocationName,
    NotifyAuthority,
    Upvotes,
    EngagementCount,
    VerifiedBy,
    ActionActed,
    ActionStatus,
    CreatedAt,
    UpdatedAt,
}
