use crate::{
    db::DbPool,
    entities::{
        expense, expense_payment, project,
        sale::{self, SaleStatus, UnitType},
    },
    errors::ServiceError,
    services::{
        checks::delete_derived_cheques, ensure_non_negative, non_empty, owned_project,
        owned_project_ids,
        reconciliation::{percentage, round_money},
        sales::paid_by_sale,
    },
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub location: String,
    pub company: Option<String>,
    #[serde(default)]
    pub total_surface: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub lot_count: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub apartment_count: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub garage_count: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub company: Option<String>,
    pub total_surface: Option<Decimal>,
    #[validate(range(min = 0))]
    pub lot_count: Option<i32>,
    #[validate(range(min = 0))]
    pub apartment_count: Option<i32>,
    #[validate(range(min = 0))]
    pub garage_count: Option<i32>,
    pub description: Option<String>,
}

/// Unit families the project declares a capacity for. Local, villa and
/// terrain units share the lots left over after apartments and garages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitGroup {
    Appartement,
    Garage,
    Autre,
}

impl From<UnitType> for UnitGroup {
    fn from(unit_type: UnitType) -> Self {
        match unit_type {
            UnitType::Appartement => UnitGroup::Appartement,
            UnitType::Garage => UnitGroup::Garage,
            UnitType::Local | UnitType::Villa | UnitType::Terrain => UnitGroup::Autre,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitGroupInventory {
    pub group: UnitGroup,
    pub capacity: i64,
    pub sold: i64,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SoldUnit {
    pub sale_id: Uuid,
    pub unit_number: String,
    pub unit_type: UnitType,
    pub client_name: String,
    pub status: SaleStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitInventory {
    pub project_id: Uuid,
    pub groups: Vec<UnitGroupInventory>,
    pub total_capacity: i64,
    pub total_sold: i64,
    pub total_available: i64,
    pub units: Vec<SoldUnit>,
}

impl UnitInventory {
    fn build(project: &project::Model, active_sales: &[sale::Model]) -> Self {
        let apartments = i64::from(project.apartment_count);
        let garages = i64::from(project.garage_count);
        let others = (i64::from(project.lot_count) - apartments - garages).max(0);

        let groups: Vec<UnitGroupInventory> = [
            (UnitGroup::Appartement, apartments),
            (UnitGroup::Garage, garages),
            (UnitGroup::Autre, others),
        ]
        .into_iter()
        .map(|(group, capacity)| {
            let sold = active_sales
                .iter()
                .filter(|s| UnitGroup::from(s.unit_type) == group)
                .count() as i64;
            UnitGroupInventory {
                group,
                capacity,
                sold,
                available: (capacity - sold).max(0),
            }
        })
        .collect();

        let total_capacity = i64::from(project.lot_count).max(apartments + garages);
        let total_sold = active_sales.len() as i64;
        let mut units: Vec<SoldUnit> = active_sales
            .iter()
            .map(|s| SoldUnit {
                sale_id: s.id,
                unit_number: s.unit_number.clone(),
                unit_type: s.unit_type,
                client_name: s.client_name.clone(),
                status: s.status,
            })
            .collect();
        units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));

        Self {
            project_id: project.id,
            groups,
            total_capacity,
            total_sold,
            total_available: (total_capacity - total_sold).max(0),
            units,
        }
    }
}

/// Commercial and cost figures for one project or a user's whole portfolio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectStats {
    pub project_count: u64,
    pub sales_count: u64,
    /// Sum of active sale prices
    pub revenue: Decimal,
    /// Advances plus installment receipts
    pub collected: Decimal,
    pub remaining: Decimal,
    pub collection_rate: Decimal,
    pub expenses_total: Decimal,
    pub expenses_paid: Decimal,
    pub margin: Decimal,
}

/// Service for projects and their aggregate figures
#[derive(Clone)]
pub struct ProjectService {
    db_pool: Arc<DbPool>,
}

impl ProjectService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_projects(
        &self,
        user_id: Uuid,
        search: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<project::Model>, u64), ServiceError> {
        let mut query = project::Entity::find().filter(project::Column::UserId.eq(user_id));
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(project::Column::Name.contains(term))
                    .add(project::Column::Location.contains(term)),
            );
        }

        let paginator = query
            .order_by_desc(project::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let projects = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((projects, total))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_project(
        &self,
        user_id: Uuid,
        request: CreateProjectRequest,
    ) -> Result<project::Model, ServiceError> {
        request.validate()?;
        ensure_non_negative("total_surface", request.total_surface)?;

        let project = project::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(non_empty("name", &request.name)?),
            location: Set(request.location.trim().to_string()),
            company: Set(request.company),
            total_surface: Set(request.total_surface),
            lot_count: Set(request.lot_count),
            apartment_count: Set(request.apartment_count),
            garage_count: Set(request.garage_count),
            description: Set(request.description),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    pub async fn get_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<project::Model, ServiceError> {
        owned_project(&*self.db_pool, user_id, project_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<project::Model, ServiceError> {
        request.validate()?;
        let mut active: project::ActiveModel =
            owned_project(&*self.db_pool, user_id, project_id).await?.into();

        if let Some(name) = request.name {
            active.name = Set(non_empty("name", &name)?);
        }
        if let Some(location) = request.location {
            active.location = Set(location.trim().to_string());
        }
        if let Some(company) = request.company {
            active.company = Set(Some(company));
        }
        if let Some(surface) = request.total_surface {
            ensure_non_negative("total_surface", surface)?;
            active.total_surface = Set(surface);
        }
        if let Some(count) = request.lot_count {
            active.lot_count = Set(count);
        }
        if let Some(count) = request.apartment_count {
            active.apartment_count = Set(count);
        }
        if let Some(count) = request.garage_count {
            active.garage_count = Set(count);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Deletes the project; sales, plans, payments and expenses go with it.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, user_id: Uuid, project_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let project = owned_project(&txn, user_id, project_id).await?;
        let sale_ids: Vec<Uuid> = sale::Entity::find()
            .select_only()
            .column(sale::Column::Id)
            .filter(sale::Column::ProjectId.eq(project.id))
            .into_tuple()
            .all(&txn)
            .await?;
        let cheques = delete_derived_cheques(&txn, sale_ids).await?;
        project.delete(&txn).await?;
        txn.commit().await?;
        info!(project_id = %project_id, cheques, "project deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unit_inventory(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<UnitInventory, ServiceError> {
        let project = owned_project(&*self.db_pool, user_id, project_id).await?;
        let active_sales = active_sales(&*self.db_pool, vec![project.id]).await?;
        Ok(UnitInventory::build(&project, &active_sales))
    }

    #[instrument(skip(self))]
    pub async fn project_stats(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectStats, ServiceError> {
        let project = owned_project(&*self.db_pool, user_id, project_id).await?;
        compute_stats(&*self.db_pool, vec![project.id]).await
    }

    #[instrument(skip(self))]
    pub async fn portfolio_stats(&self, user_id: Uuid) -> Result<ProjectStats, ServiceError> {
        let ids = owned_project_ids(&*self.db_pool, user_id).await?;
        compute_stats(&*self.db_pool, ids).await
    }
}

async fn active_sales<C: ConnectionTrait>(
    conn: &C,
    project_ids: Vec<Uuid>,
) -> Result<Vec<sale::Model>, ServiceError> {
    Ok(sale::Entity::find()
        .filter(sale::Column::ProjectId.is_in(project_ids))
        .filter(sale::Column::Status.ne(SaleStatus::Annule))
        .all(conn)
        .await?)
}

async fn compute_stats<C: ConnectionTrait>(
    conn: &C,
    project_ids: Vec<Uuid>,
) -> Result<ProjectStats, ServiceError> {
    if project_ids.is_empty() {
        return Ok(ProjectStats::default());
    }
    let project_count = project_ids.len() as u64;

    let sales = active_sales(conn, project_ids.clone()).await?;
    let paid = paid_by_sale(conn, sales.iter().map(|s| s.id).collect()).await?;
    let revenue: Decimal = sales.iter().map(|s| s.total_price).sum();
    let collected: Decimal = sales
        .iter()
        .map(|s| s.advance_total() + paid.get(&s.id).copied().unwrap_or_default())
        .sum();

    let expenses = expense::Entity::find()
        .filter(expense::Column::ProjectId.is_in(project_ids))
        .all(conn)
        .await?;
    let expenses_total: Decimal = expenses.iter().map(|e| e.total_amount).sum();
    let expenses_paid: Decimal = if expenses.is_empty() {
        Decimal::ZERO
    } else {
        expense_payment::Entity::find()
            .filter(expense_payment::Column::ExpenseId.is_in(expenses.iter().map(|e| e.id)))
            .all(conn)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum()
    };

    Ok(ProjectStats {
        project_count,
        sales_count: sales.len() as u64,
        revenue: round_money(revenue),
        collected: round_money(collected),
        remaining: round_money((revenue - collected).max(Decimal::ZERO)),
        collection_rate: percentage(collected, revenue),
        expenses_total: round_money(expenses_total),
        expenses_paid: round_money(expenses_paid),
        margin: round_money(revenue - expenses_total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn project(lots: i32, apartments: i32, garages: i32) -> project::Model {
        project::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Résidence Atlas".into(),
            location: "Casablanca".into(),
            company: None,
            total_surface: dec!(2400),
            lot_count: lots,
            apartment_count: apartments,
            garage_count: garages,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sold(project_id: Uuid, unit: &str, unit_type: UnitType) -> sale::Model {
        sale::Model {
            id: Uuid::new_v4(),
            project_id,
            unit_number: unit.into(),
            unit_type,
            unit_surface: None,
            client_name: "Client".into(),
            client_phone: None,
            client_email: None,
            client_address: None,
            client_cin: None,
            total_price: dec!(500000),
            sale_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            status: SaleStatus::EnCours,
            advance_declared: Decimal::ZERO,
            advance_undeclared: Decimal::ZERO,
            advance_cash: Decimal::ZERO,
            advance_cheque: Decimal::ZERO,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn inventory_groups_units_by_family() {
        let p = project(30, 20, 6);
        let sales = vec![
            sold(p.id, "B-2", UnitType::Appartement),
            sold(p.id, "A-1", UnitType::Appartement),
            sold(p.id, "G-1", UnitType::Garage),
            sold(p.id, "L-1", UnitType::Local),
        ];
        let inventory = UnitInventory::build(&p, &sales);

        let by_group = |g: UnitGroup| inventory.groups.iter().find(|i| i.group == g).unwrap();
        assert_eq!(by_group(UnitGroup::Appartement).sold, 2);
        assert_eq!(by_group(UnitGroup::Appartement).available, 18);
        assert_eq!(by_group(UnitGroup::Garage).available, 5);
        assert_eq!(by_group(UnitGroup::Autre).capacity, 4);
        assert_eq!(by_group(UnitGroup::Autre).available, 3);
        assert_eq!(inventory.total_capacity, 30);
        assert_eq!(inventory.total_available, 26);
        assert_eq!(inventory.units[0].unit_number, "A-1");
    }

    #[test]
    fn oversold_family_reports_zero_available() {
        let p = project(0, 1, 0);
        let sales = vec![
            sold(p.id, "A-1", UnitType::Appartement),
            sold(p.id, "A-2", UnitType::Appartement),
        ];
        let inventory = UnitInventory::build(&p, &sales);
        assert_eq!(inventory.groups[0].available, 0);
        assert_eq!(inventory.total_capacity, 1);
        assert_eq!(inventory.total_available, 0);
    }
}
