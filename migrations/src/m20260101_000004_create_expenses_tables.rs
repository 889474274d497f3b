use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260101_000004_create_expenses_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Expenses::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::Name).string().not_null())
                    .col(ColumnDef::new(Expenses::Category).string_len(32).not_null())
                    .col(ColumnDef::new(Expenses::Supplier).string().null())
                    .col(
                        ColumnDef::new(Expenses::TotalAmount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::Description).text().null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_project_id")
                            .from(Expenses::Table, Expenses::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpensePayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpensePayments::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpensePayments::ExpenseId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExpensePayments::Amount)
                            .decimal_len(15, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpensePayments::DeclaredAmount)
                            .decimal_len(15, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ExpensePayments::UndeclaredAmount)
                            .decimal_len(15, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ExpensePayments::PaymentDate).date().not_null())
                    .col(
                        ColumnDef::new(ExpensePayments::PaymentMethod)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpensePayments::Reference).string().null())
                    .col(ColumnDef::new(ExpensePayments::Notes).text().null())
                    .col(
                        ColumnDef::new(ExpensePayments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(
                        Expr::col(ExpensePayments::Amount).eq(Expr::col(
                            ExpensePayments::DeclaredAmount,
                        )
                        .add(Expr::col(ExpensePayments::UndeclaredAmount))),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_payments_expense_id")
                            .from(ExpensePayments::Table, ExpensePayments::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_payments_expense_id")
                    .table(ExpensePayments::Table)
                    .col(ExpensePayments::ExpenseId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpensePayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    ProjectId,
    Name,
    Category,
    Supplier,
    TotalAmount,
    ExpenseDate,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpensePayments {
    Table,
    Id,
    ExpenseId,
    Amount,
    DeclaredAmount,
    UndeclaredAmount,
    PaymentDate,
    PaymentMethod,
    Reference,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}
