use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260101_000006_create_company_settings_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CompanySettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanySettings::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompanySettings::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CompanySettings::CompanyName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CompanySettings::Address).text().null())
                    .col(ColumnDef::new(CompanySettings::Phone).string().null())
                    .col(ColumnDef::new(CompanySettings::Email).string().null())
                    .col(ColumnDef::new(CompanySettings::Ice).string().null())
                    .col(ColumnDef::new(CompanySettings::Rc).string().null())
                    .col(ColumnDef::new(CompanySettings::IfNumber).string().null())
                    .col(ColumnDef::new(CompanySettings::Patente).string().null())
                    .col(ColumnDef::new(CompanySettings::LogoUrl).string().null())
                    .col(ColumnDef::new(CompanySettings::FooterText).text().null())
                    .col(
                        ColumnDef::new(CompanySettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_settings_user_id")
                            .from(CompanySettings::Table, CompanySettings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanySettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CompanySettings {
    Table,
    Id,
    UserId,
    CompanyName,
    Address,
    Phone,
    Email,
    Ice,
    Rc,
    IfNumber,
    Patente,
    LogoUrl,
    FooterText,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
