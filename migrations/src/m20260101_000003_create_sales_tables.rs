use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260101_000003_create_sales_tables"
    }
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .decimal_len(15, 2)
        .not_null()
        .default(0)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Sales::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Sales::UnitNumber).string().not_null())
                    .col(ColumnDef::new(Sales::UnitType).string_len(32).not_null())
                    .col(ColumnDef::new(Sales::UnitSurface).decimal_len(15, 2).null())
                    .col(ColumnDef::new(Sales::ClientName).string().not_null())
                    .col(ColumnDef::new(Sales::ClientPhone).string().null())
                    .col(ColumnDef::new(Sales::ClientEmail).string().null())
                    .col(ColumnDef::new(Sales::ClientAddress).text().null())
                    .col(ColumnDef::new(Sales::ClientCin).string().null())
                    .col(money(Sales::TotalPrice))
                    .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                    .col(ColumnDef::new(Sales::Status).string_len(32).not_null())
                    .col(money(Sales::AdvanceDeclared))
                    .col(money(Sales::AdvanceUndeclared))
                    .col(money(Sales::AdvanceCash))
                    .col(money(Sales::AdvanceCheque))
                    .col(ColumnDef::new(Sales::Notes).text().null())
                    .col(
                        ColumnDef::new(Sales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sales::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_project_id")
                            .from(Sales::Table, Sales::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_project_unit")
                    .table(Sales::Table)
                    .col(Sales::ProjectId)
                    .col(Sales::UnitNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentPlans::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPlans::SaleId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentPlans::InstallmentNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPlans::Description).string().null())
                    .col(ColumnDef::new(PaymentPlans::DueDate).date().not_null())
                    .col(money(PaymentPlans::PlannedAmount))
                    .col(money(PaymentPlans::PaidAmount))
                    .col(money(PaymentPlans::DeclaredAmount))
                    .col(money(PaymentPlans::UndeclaredAmount))
                    .col(money(PaymentPlans::CashAmount))
                    .col(money(PaymentPlans::ChequeAmount))
                    .col(ColumnDef::new(PaymentPlans::PaymentDate).date().null())
                    .col(
                        ColumnDef::new(PaymentPlans::PaymentMethod)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaymentPlans::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentPlans::Notes).text().null())
                    .col(
                        ColumnDef::new(PaymentPlans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentPlans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(
                        Expr::col(PaymentPlans::PaidAmount).eq(Expr::col(
                            PaymentPlans::DeclaredAmount,
                        )
                        .add(Expr::col(PaymentPlans::UndeclaredAmount))),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_plans_sale_id")
                            .from(PaymentPlans::Table, PaymentPlans::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_payment_plans_sale_installment")
                    .table(PaymentPlans::Table)
                    .col(PaymentPlans::SaleId)
                    .col(PaymentPlans::InstallmentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Payments::PlanId).uuid().not_null())
                    .col(ColumnDef::new(Payments::SaleId).uuid().not_null())
                    .col(money(Payments::Amount))
                    .col(money(Payments::DeclaredAmount))
                    .col(money(Payments::UndeclaredAmount))
                    .col(money(Payments::CashAmount))
                    .col(money(Payments::ChequeAmount))
                    .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                    .col(
                        ColumnDef::new(Payments::PaymentMethod)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Reference).string().null())
                    .col(ColumnDef::new(Payments::Notes).text().null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(
                        Expr::col(Payments::Amount).eq(Expr::col(Payments::DeclaredAmount)
                            .add(Expr::col(Payments::UndeclaredAmount))),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_plan_id")
                            .from(Payments::Table, Payments::PlanId)
                            .to(PaymentPlans::Table, PaymentPlans::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_sale_id")
                            .from(Payments::Table, Payments::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentPlans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sales {
    Table,
    Id,
    ProjectId,
    UnitNumber,
    UnitType,
    UnitSurface,
    ClientName,
    ClientPhone,
    ClientEmail,
    ClientAddress,
    ClientCin,
    TotalPrice,
    SaleDate,
    Status,
    AdvanceDeclared,
    AdvanceUndeclared,
    AdvanceCash,
    AdvanceCheque,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PaymentPlans {
    Table,
    Id,
    SaleId,
    InstallmentNumber,
    Description,
    DueDate,
    PlannedAmount,
    PaidAmount,
    DeclaredAmount,
    UndeclaredAmount,
    CashAmount,
    ChequeAmount,
    PaymentDate,
    PaymentMethod,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    PlanId,
    SaleId,
    Amount,
    DeclaredAmount,
    UndeclaredAmount,
    CashAmount,
    ChequeAmount,
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
