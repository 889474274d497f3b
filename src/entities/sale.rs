use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of unit sold within a project.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[sea_orm(string_value = "appartement")]
    Appartement,
    #[sea_orm(string_value = "garage")]
    Garage,
    #[sea_orm(string_value = "local")]
    Local,
    #[sea_orm(string_value = "villa")]
    Villa,
    #[sea_orm(string_value = "terrain")]
    Terrain,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[sea_orm(string_value = "en_cours")]
    EnCours,
    #[sea_orm(string_value = "termine")]
    Termine,
    #[sea_orm(string_value = "annule")]
    Annule,
}

impl SaleStatus {
    /// Whether the sale still holds its unit.
    pub fn is_active(self) -> bool {
        !matches!(self, SaleStatus::Annule)
    }

    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::EnCours, SaleStatus::Termine)
                | (SaleStatus::EnCours, SaleStatus::Annule)
                | (SaleStatus::Annule, SaleStatus::EnCours)
        )
    }
}

/// A unit sold to a client. The initial advance is stored on the sale itself,
/// split into declared/undeclared and cash/cheque portions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "sales")]
#[schema(as = Sale)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub unit_number: String,
    pub unit_type: UnitType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub unit_surface: Option<Decimal>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub client_address: Option<String>,
    pub client_cin: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_price: Decimal,
    pub sale_date: NaiveDate,
    pub status: SaleStatus,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_declared: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_undeclared: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_cash: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_cheque: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn advance_total(&self) -> Decimal {
        self.advance_declared + self.advance_undeclared
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(has_many = "super::payment_plan::Entity")]
    PaymentPlans,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::payment_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPlans.def()
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
    fn sale_status_transitions() {
        assert!(SaleStatus::EnCours.can_transition_to(SaleStatus::Termine));
        assert!(SaleStatus::EnCours.can_transition_to(SaleStatus::Annule));
        assert!(SaleStatus::Annule.can_transition_to(SaleStatus::EnCours));
        assert!(!SaleStatus::Termine.can_transition_to(SaleStatus::EnCours));
        assert!(!SaleStatus::Termine.can_transition_to(SaleStatus::Annule));
        assert!(!SaleStatus::EnCours.can_transition_to(SaleStatus::EnCours));
    }

    #[test]
    fn unit_type_uses_wire_names() {
        let parsed: UnitType = serde_json::from_str("\"garage\"").unwrap();
        assert_eq!(parsed, UnitType::Garage);
        assert_eq!(
            serde_json::to_string(&UnitType::Appartement).unwrap(),
            "\"appartement\""
        );
        assert!(serde_json::from_str::<UnitType>("\"castle\"").is_err());
    }
}
