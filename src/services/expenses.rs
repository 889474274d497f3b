use crate::{
    common::DateRange,
    db::DbPool,
    entities::{
        expense::{self, ExpenseCategory},
        expense_payment,
        payment::PaymentMethod,
        project,
    },
    errors::ServiceError,
    services::{
        ensure_positive, non_empty, owned_expense, owned_project, owned_project_ids,
        reconciliation::{percentage, round_money, AmountSplit},
        today,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    pub project_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub category: ExpenseCategory,
    pub supplier: Option<String>,
    pub total_amount: Decimal,
    /// Defaults to today
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub supplier: Option<String>,
    pub total_amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordExpensePaymentRequest {
    pub amount: Decimal,
    /// Defaults to the whole amount
    pub declared_amount: Option<Decimal>,
    pub undeclared_amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl RecordExpensePaymentRequest {
    fn split(&self) -> Result<AmountSplit, ServiceError> {
        let split = match (self.declared_amount, self.undeclared_amount) {
            (Some(declared), Some(undeclared)) => AmountSplit {
                total: self.amount,
                declared,
                undeclared,
                cash: Decimal::ZERO,
                cheque: Decimal::ZERO,
            },
            (Some(declared), None) => AmountSplit::from_declared(self.amount, declared)?,
            (None, Some(undeclared)) => {
                AmountSplit::from_declared(self.amount, self.amount - undeclared)?
            }
            (None, None) => AmountSplit::from_declared(self.amount, self.amount)?,
        };
        split.validate()?;
        Ok(split)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpensePaymentStatus {
    NonPaye,
    Partiel,
    Paye,
}

/// An expense with the figures derived from its payments.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpenseWithTotals {
    #[serde(flatten)]
    pub expense: expense::Model,
    pub project_name: String,
    pub total_paid: Decimal,
    pub declared_paid: Decimal,
    pub undeclared_paid: Decimal,
    pub remaining: Decimal,
    pub payment_count: u64,
    pub progress: Decimal,
    pub payment_status: ExpensePaymentStatus,
}

impl ExpenseWithTotals {
    pub fn new(
        expense: expense::Model,
        project_name: String,
        payments: &[expense_payment::Model],
    ) -> Self {
        let total_paid = round_money(payments.iter().map(|p| p.amount).sum());
        let declared_paid = round_money(payments.iter().map(|p| p.declared_amount).sum());
        let undeclared_paid = round_money(payments.iter().map(|p| p.undeclared_amount).sum());
        let payment_status = if total_paid <= Decimal::ZERO {
            ExpensePaymentStatus::NonPaye
        } else if total_paid >= expense.total_amount {
            ExpensePaymentStatus::Paye
        } else {
            ExpensePaymentStatus::Partiel
        };
        Self {
            project_name,
            total_paid,
            declared_paid,
            undeclared_paid,
            remaining: round_money((expense.total_amount - total_paid).max(Decimal::ZERO)),
            payment_count: payments.len() as u64,
            progress: percentage(total_paid, expense.total_amount),
            payment_status,
            expense,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub expense: ExpenseWithTotals,
    pub payments: Vec<expense_payment::Model>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub project_id: Option<Uuid>,
    pub category: Option<ExpenseCategory>,
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryTotals {
    pub category: ExpenseCategory,
    pub count: u64,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ExpenseStats {
    pub count: u64,
    pub total_amount: Decimal,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub declared_paid: Decimal,
    pub undeclared_paid: Decimal,
    pub progress: Decimal,
    pub by_category: Vec<CategoryTotals>,
}

impl ExpenseStats {
    pub fn from_rows(rows: &[ExpenseWithTotals]) -> Self {
        let mut stats = Self {
            count: rows.len() as u64,
            ..Default::default()
        };
        let mut by_category: BTreeMap<ExpenseCategory, CategoryTotals> = BTreeMap::new();
        for row in rows {
            stats.total_amount += row.expense.total_amount;
            stats.total_paid += row.total_paid;
            stats.remaining += row.remaining;
            stats.declared_paid += row.declared_paid;
            stats.undeclared_paid += row.undeclared_paid;

            let entry = by_category
                .entry(row.expense.category)
                .or_insert_with(|| CategoryTotals {
                    category: row.expense.category,
                    count: 0,
                    total_amount: Decimal::ZERO,
                    total_paid: Decimal::ZERO,
                });
            entry.count += 1;
            entry.total_amount += row.expense.total_amount;
            entry.total_paid += row.total_paid;
        }
        stats.total_amount = round_money(stats.total_amount);
        stats.total_paid = round_money(stats.total_paid);
        stats.remaining = round_money(stats.remaining);
        stats.declared_paid = round_money(stats.declared_paid);
        stats.undeclared_paid = round_money(stats.undeclared_paid);
        stats.progress = percentage(stats.total_paid, stats.total_amount);
        stats.by_category = by_category.into_values().collect();
        stats
    }
}

async fn payments_by_expense<C: ConnectionTrait>(
    conn: &C,
    expense_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<expense_payment::Model>>, ServiceError> {
    let mut grouped: HashMap<Uuid, Vec<expense_payment::Model>> = HashMap::new();
    if expense_ids.is_empty() {
        return Ok(grouped);
    }
    let payments = expense_payment::Entity::find()
        .filter(expense_payment::Column::ExpenseId.is_in(expense_ids))
        .order_by_asc(expense_payment::Column::PaymentDate)
        .order_by_asc(expense_payment::Column::CreatedAt)
        .all(conn)
        .await?;
    for payment in payments {
        grouped.entry(payment.expense_id).or_default().push(payment);
    }
    Ok(grouped)
}

/// Service for project expenses and the payments that settle them
#[derive(Clone)]
pub struct ExpenseService {
    db_pool: Arc<DbPool>,
}

impl ExpenseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn project_scope(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Uuid>, ServiceError> {
        match project_id {
            Some(id) => Ok(vec![owned_project(&*self.db_pool, user_id, id).await?.id]),
            None => owned_project_ids(&*self.db_pool, user_id).await,
        }
    }

    fn filtered(project_ids: Vec<Uuid>, filter: &ExpenseFilter) -> sea_orm::SelectTwo<expense::Entity, project::Entity> {
        let mut query = expense::Entity::find()
            .find_also_related(project::Entity)
            .filter(expense::Column::ProjectId.is_in(project_ids))
            .filter(filter.range.condition(expense::Column::ExpenseDate));
        if let Some(category) = filter.category {
            query = query.filter(expense::Column::Category.eq(category));
        }
        query
    }

    async fn with_totals(
        &self,
        rows: Vec<(expense::Model, Option<project::Model>)>,
    ) -> Result<Vec<ExpenseWithTotals>, ServiceError> {
        let mut payments =
            payments_by_expense(&*self.db_pool, rows.iter().map(|(e, _)| e.id).collect()).await?;
        Ok(rows
            .into_iter()
            .map(|(expense, project)| {
                let paid = payments.remove(&expense.id).unwrap_or_default();
                let project_name = project.map(|p| p.name).unwrap_or_default();
                ExpenseWithTotals::new(expense, project_name, &paid)
            })
            .collect())
    }

    #[instrument(skip(self, filter))]
    pub async fn list_expenses(
        &self,
        user_id: Uuid,
        filter: ExpenseFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ExpenseWithTotals>, u64), ServiceError> {
        let project_ids = self.project_scope(user_id, filter.project_id).await?;
        if project_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let paginator = Self::filtered(project_ids, &filter)
            .order_by_desc(expense::Column::ExpenseDate)
            .order_by_desc(expense::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((self.with_totals(rows).await?, total))
    }

    #[instrument(skip(self, request), fields(project_id = %request.project_id))]
    pub async fn create_expense(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<ExpenseWithTotals, ServiceError> {
        request.validate()?;
        ensure_positive("total_amount", request.total_amount)?;
        let project = owned_project(&*self.db_pool, user_id, request.project_id).await?;

        let expense = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project.id),
            name: Set(non_empty("name", &request.name)?),
            category: Set(request.category),
            supplier: Set(request.supplier),
            total_amount: Set(request.total_amount),
            expense_date: Set(request.expense_date.unwrap_or_else(today)),
            description: Set(request.description),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(expense_id = %expense.id, amount = %expense.total_amount, "expense created");
        Ok(ExpenseWithTotals::new(expense, project.name, &[]))
    }

    #[instrument(skip(self))]
    pub async fn get_expense(&self, user_id: Uuid, expense_id: Uuid) -> Result<ExpenseDetail, ServiceError> {
        let (expense, project) = owned_expense(&*self.db_pool, user_id, expense_id).await?;
        let payments = payments_by_expense(&*self.db_pool, vec![expense.id])
            .await?
            .remove(&expense.id)
            .unwrap_or_default();
        Ok(ExpenseDetail {
            expense: ExpenseWithTotals::new(expense, project.name, &payments),
            payments,
        })
    }

    /// The total may not drop below what has already been paid.
    #[instrument(skip(self, request))]
    pub async fn update_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<ExpenseWithTotals, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let (current, project) = owned_expense(db, user_id, expense_id).await?;
        let payments = payments_by_expense(db, vec![current.id])
            .await?
            .remove(&current.id)
            .unwrap_or_default();

        let mut active: expense::ActiveModel = current.into();
        if let Some(total) = request.total_amount {
            ensure_positive("total_amount", total)?;
            let paid: Decimal = payments.iter().map(|p| p.amount).sum();
            if total < paid {
                return Err(ServiceError::validation(format!(
                    "Total amount {total} is below the {paid} already paid"
                )));
            }
            active.total_amount = Set(total);
        }
        if let Some(name) = request.name {
            active.name = Set(non_empty("name", &name)?);
        }
        if let Some(category) = request.category {
            active.category = Set(category);
        }
        if let Some(supplier) = request.supplier {
            active.supplier = Set(Some(supplier));
        }
        if let Some(date) = request.expense_date {
            active.expense_date = Set(date);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }

        let expense = active.update(db).await?;
        Ok(ExpenseWithTotals::new(expense, project.name, &payments))
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ServiceError> {
        let (expense, _) = owned_expense(&*self.db_pool, user_id, expense_id).await?;
        expense.delete(&*self.db_pool).await?;
        info!(expense_id = %expense_id, "expense deleted");
        Ok(())
    }

    pub async fn list_payments(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> Result<Vec<expense_payment::Model>, ServiceError> {
        let (expense, _) = owned_expense(&*self.db_pool, user_id, expense_id).await?;
        Ok(payments_by_expense(&*self.db_pool, vec![expense.id])
            .await?
            .remove(&expense.id)
            .unwrap_or_default())
    }

    /// Records a payment unless it would take the expense past its total.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn record_payment(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: RecordExpensePaymentRequest,
    ) -> Result<ExpenseDetail, ServiceError> {
        request.validate()?;
        ensure_positive("amount", request.amount)?;
        let split = request.split()?;

        let txn = self.db_pool.begin().await?;
        let (expense, _) = owned_expense(&txn, user_id, expense_id).await?;
        let paid: Decimal = payments_by_expense(&txn, vec![expense.id])
            .await?
            .remove(&expense.id)
            .unwrap_or_default()
            .iter()
            .map(|p| p.amount)
            .sum();
        if paid + split.total > expense.total_amount {
            return Err(ServiceError::validation(format!(
                "Payment of {} exceeds the {} left on this expense",
                split.total,
                (expense.total_amount - paid).max(Decimal::ZERO)
            )));
        }

        let payment = expense_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            expense_id: Set(expense.id),
            amount: Set(split.total),
            declared_amount: Set(split.declared),
            undeclared_amount: Set(split.undeclared),
            payment_date: Set(request.payment_date.unwrap_or_else(today)),
            payment_method: Set(request.payment_method.unwrap_or(PaymentMethod::Especes)),
            reference: Set(request.reference),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(payment_id = %payment.id, expense_id = %expense_id, "expense payment recorded");
        self.get_expense(user_id, expense_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_payment(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let (expense, _) = owned_expense(db, user_id, expense_id).await?;
        let payment = expense_payment::Entity::find_by_id(payment_id)
            .filter(expense_payment::Column::ExpenseId.eq(expense.id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Expense payment", payment_id))?;
        payment.delete(db).await?;
        info!(payment_id = %payment_id, expense_id = %expense_id, "expense payment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        range: DateRange,
    ) -> Result<ExpenseStats, ServiceError> {
        let project_ids = self.project_scope(user_id, project_id).await?;
        if project_ids.is_empty() {
            return Ok(ExpenseStats::default());
        }
        let filter = ExpenseFilter {
            range,
            ..Default::default()
        };
        let rows = Self::filtered(project_ids, &filter).all(&*self.db_pool).await?;
        Ok(ExpenseStats::from_rows(&self.with_totals(rows).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expense(category: ExpenseCategory, total: Decimal) -> expense::Model {
        expense::Model {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "Gros oeuvre".into(),
            category,
            supplier: None,
            total_amount: total,
            expense_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn paid(expense_id: Uuid, amount: Decimal, declared: Decimal) -> expense_payment::Model {
        expense_payment::Model {
            id: Uuid::new_v4(),
            expense_id,
            amount,
            declared_amount: declared,
            undeclared_amount: amount - declared,
            payment_date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            payment_method: PaymentMethod::Virement,
            reference: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn totals_follow_payments() {
        let e = expense(ExpenseCategory::Construction, dec!(10000));
        let payments = vec![paid(e.id, dec!(3000), dec!(3000)), paid(e.id, dec!(2000), dec!(500))];
        let row = ExpenseWithTotals::new(e, "Atlas".into(), &payments);
        assert_eq!(row.total_paid, dec!(5000));
        assert_eq!(row.declared_paid, dec!(3500));
        assert_eq!(row.undeclared_paid, dec!(1500));
        assert_eq!(row.remaining, dec!(5000));
        assert_eq!(row.progress, dec!(50));
        assert_eq!(row.payment_count, 2);
        assert_eq!(row.payment_status, ExpensePaymentStatus::Partiel);
    }

    #[test]
    fn payment_status_bounds() {
        let e = expense(ExpenseCategory::Terrain, dec!(800));
        assert_eq!(
            ExpenseWithTotals::new(e.clone(), String::new(), &[]).payment_status,
            ExpensePaymentStatus::NonPaye
        );
        let full = vec![paid(e.id, dec!(800), dec!(800))];
        assert_eq!(
            ExpenseWithTotals::new(e, String::new(), &full).payment_status,
            ExpensePaymentStatus::Paye
        );
    }

    #[test]
    fn stats_group_by_category() {
        let a = expense(ExpenseCategory::Marketing, dec!(1000));
        let b = expense(ExpenseCategory::Terrain, dec!(5000));
        let c = expense(ExpenseCategory::Marketing, dec!(500));
        let rows = vec![
            ExpenseWithTotals::new(a.clone(), String::new(), &[paid(a.id, dec!(1000), dec!(0))]),
            ExpenseWithTotals::new(b, String::new(), &[]),
            ExpenseWithTotals::new(c, String::new(), &[]),
        ];
        let stats = ExpenseStats::from_rows(&rows);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_amount, dec!(6500));
        assert_eq!(stats.total_paid, dec!(1000));
        assert_eq!(stats.undeclared_paid, dec!(1000));
        assert_eq!(stats.remaining, dec!(5500));
        let categories: Vec<ExpenseCategory> = stats.by_category.iter().map(|c| c.category).collect();
        assert_eq!(categories, vec![ExpenseCategory::Terrain, ExpenseCategory::Marketing]);
        assert_eq!(stats.by_category[1].count, 2);
    }

    #[test]
    fn payment_split_defaults() {
        let request = RecordExpensePaymentRequest {
            amount: dec!(900),
            declared_amount: None,
            undeclared_amount: Some(dec!(300)),
            payment_date: None,
            payment_method: None,
            reference: None,
            notes: None,
        };
        let split = request.split().unwrap();
        assert_eq!(split.declared, dec!(600));
        assert_eq!(split.undeclared, dec!(300));
    }
}
