use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payment::PaymentMethod;

/// Installment status. `recu` is accepted on input as a synonym of `paye`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlanStatus {
    #[sea_orm(string_value = "planifie")]
    Planifie,
    #[sea_orm(string_value = "paye")]
    #[serde(alias = "recu")]
    Paye,
    #[sea_orm(string_value = "en_retard")]
    EnRetard,
    #[sea_orm(string_value = "annule")]
    Annule,
}

/// A scheduled installment (échéance) of a sale.
///
/// `paid_amount`, `declared_amount`, `undeclared_amount`, `cash_amount` and
/// `cheque_amount` are the sums of the plan's payments.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "payment_plans")]
#[schema(as = PaymentPlan)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub installment_number: i32,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub planned_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub paid_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub declared_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub undeclared_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cash_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub cheque_amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub status: PaymentPlanStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recu_is_accepted_as_paye() {
        let status: PaymentPlanStatus = serde_json::from_str("\"recu\"").unwrap();
        assert_eq!(status, PaymentPlanStatus::Paye);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"paye\"");
        let late: PaymentPlanStatus = serde_json::from_str("\"en_retard\"").unwrap();
        assert_eq!(late, PaymentPlanStatus::EnRetard);
    }
}
