use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Means of payment used for receipts and expense payments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "especes")]
    Especes,
    #[sea_orm(string_value = "cheque")]
    Cheque,
    #[sea_orm(string_value = "virement")]
    Virement,
    #[sea_orm(string_value = "mixte")]
    Mixte,
}

/// One receipt recorded against an installment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "payments")]
#[schema(as = Payment)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plan_id: Uuid,
    pub sale_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub declared_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub undeclared_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cash_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cheque_amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_plan::Entity",
        from = "Column::PlanId",
        to = "super::payment_plan::Column::Id"
    )]
    PaymentPlan,
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    #[sea_orm(has_many = "super::payment_check::Entity")]
    PaymentChecks,
}

impl Related<super::payment_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPlan.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::payment_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentChecks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
