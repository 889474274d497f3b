use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260101_000005_create_checks_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Project/sale/expense references are nullable; a cheque outlives a
        // deleted expense but not a deleted sale.
        manager
            .create_table(
                Table::create()
                    .table(Checks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Checks::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Checks::UserId).uuid().not_null())
                    .col(ColumnDef::new(Checks::ProjectId).uuid().null())
                    .col(ColumnDef::new(Checks::SaleId).uuid().null())
                    .col(ColumnDef::new(Checks::ExpenseId).uuid().null())
                    .col(ColumnDef::new(Checks::CheckType).string_len(16).not_null())
                    .col(ColumnDef::new(Checks::CheckNumber).string().not_null())
                    .col(ColumnDef::new(Checks::BankName).string().null())
                    .col(
                        ColumnDef::new(Checks::Amount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Checks::DrawerName).string().null())
                    .col(ColumnDef::new(Checks::BeneficiaryName).string().null())
                    .col(ColumnDef::new(Checks::IssueDate).date().not_null())
                    .col(ColumnDef::new(Checks::DueDate).date().null())
                    .col(ColumnDef::new(Checks::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Checks::Source).string_len(16).not_null())
                    .col(ColumnDef::new(Checks::Notes).text().null())
                    .col(
                        ColumnDef::new(Checks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Checks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checks_user_id")
                            .from(Checks::Table, Checks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checks_project_id")
                            .from(Checks::Table, Checks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checks_sale_id")
                            .from(Checks::Table, Checks::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checks_expense_id")
                            .from(Checks::Table, Checks::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_checks_user_status")
                    .table(Checks::Table)
                    .col(Checks::UserId)
                    .col(Checks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentChecks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentChecks::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentChecks::PaymentId).uuid().not_null())
                    .col(ColumnDef::new(PaymentChecks::CheckId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentChecks::Amount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_checks_payment_id")
                            .from(PaymentChecks::Table, PaymentChecks::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_checks_check_id")
                            .from(PaymentChecks::Table, PaymentChecks::CheckId)
                            .to(Checks::Table, Checks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentChecks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Checks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Checks {
    Table,
    Id,
    UserId,
    ProjectId,
    SaleId,
    ExpenseId,
    CheckType,
    CheckNumber,
    BankName,
    Amount,
    DrawerName,
    BeneficiaryName,
    IssueDate,
    DueDate,
    Status,
    Source,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PaymentChecks {
    Table,
    Id,
    PaymentId,
    CheckId,
    Amount,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Sales {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
}
