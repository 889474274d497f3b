use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Direction of a cheque: received from a client or issued to a supplier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    #[sea_orm(string_value = "recu")]
    Recu,
    #[sea_orm(string_value = "emis")]
    Emis,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    #[sea_orm(string_value = "emis")]
    Emis,
    #[sea_orm(string_value = "encaisse")]
    Encaisse,
    #[sea_orm(string_value = "rejete")]
    Rejete,
    #[sea_orm(string_value = "annule")]
    Annule,
}

impl CheckStatus {
    /// `encaisse` and `annule` are terminal; a rejected cheque may be
    /// presented again.
    pub fn can_transition_to(self, next: CheckStatus) -> bool {
        use CheckStatus::*;
        matches!(
            (self, next),
            (Emis, Encaisse) | (Emis, Rejete) | (Emis, Annule) | (Rejete, Emis) | (Rejete, Annule)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CheckStatus::Encaisse | CheckStatus::Annule)
    }
}

/// Where a cheque row came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CheckSource {
    #[sea_orm(string_value = "manuel")]
    Manuel,
    #[sea_orm(string_value = "avance_vente")]
    AvanceVente,
    #[sea_orm(string_value = "paiement")]
    Paiement,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "checks")]
#[schema(as = Check)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub expense_id: Option<Uuid>,
    pub check_type: CheckType,
    pub check_number: String,
    pub bank_name: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub drawer_name: Option<String>,
    pub beneficiary_name: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: CheckStatus,
    pub source: CheckSource,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Date used for period filtering and due-soon reporting.
    pub fn effective_date(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.issue_date)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    #[sea_orm(
        belongs_to = "super::expense::Entity",
        from = "Column::ExpenseId",
        to = "super::expense::Column::Id"
    )]
    Expense,
    #[sea_orm(has_many = "super::payment_check::Entity")]
    PaymentChecks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
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
    use rstest::rstest;

    #[rstest]
    #[case(CheckStatus::Emis, CheckStatus::Encaisse, true)]
    #[case(CheckStatus::Emis, CheckStatus::Rejete, true)]
    #[case(CheckStatus::Emis, CheckStatus::Annule, true)]
    #[case(CheckStatus::Rejete, CheckStatus::Emis, true)]
    #[case(CheckStatus::Rejete, CheckStatus::Annule, true)]
    #[case(CheckStatus::Rejete, CheckStatus::Encaisse, false)]
    #[case(CheckStatus::Encaisse, CheckStatus::Emis, false)]
    #[case(CheckStatus::Encaisse, CheckStatus::Annule, false)]
    #[case(CheckStatus::Annule, CheckStatus::Emis, false)]
    #[case(CheckStatus::Emis, CheckStatus::Emis, false)]
    fn check_lifecycle(#[case] from: CheckStatus, #[case] to: CheckStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn terminal_states_have_no_exit() {
        use sea_orm::Iterable;
        for from in CheckStatus::iter().filter(|s| s.is_terminal()) {
            assert!(CheckStatus::iter().all(|to| !from.can_transition_to(to)));
        }
    }
}
