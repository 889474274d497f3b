use crate::{
    common::DateRange,
    db::DbPool,
    entities::check::{self, CheckSource, CheckStatus, CheckType},
    errors::ServiceError,
    services::{
        ensure_positive, non_empty, owned_expense, owned_project, owned_sale,
        reconciliation::round_money, today,
    },
};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A cheque handed over with an advance or an installment receipt.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChequeInput {
    pub check_number: String,
    pub bank_name: Option<String>,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
}

/// Each cheque needs a number and a positive amount, and together they must
/// cover `expected` exactly. No cheques at all is always accepted.
pub(crate) fn validate_cheque_inputs(
    cheques: &[ChequeInput],
    expected: Decimal,
) -> Result<(), ServiceError> {
    if cheques.is_empty() {
        return Ok(());
    }
    for cheque in cheques {
        non_empty("check_number", &cheque.check_number)?;
        ensure_positive("cheque amount", cheque.amount)?;
    }
    let total: Decimal = cheques.iter().map(|c| c.amount).sum();
    if round_money(total) != round_money(expected) {
        return Err(ServiceError::validation(format!(
            "Cheques total {total} but the cheque part is {expected}"
        )));
    }
    Ok(())
}

/// Removes the cheques derived from the advances and receipts of `sale_ids`.
/// Manual cheques referencing those sales are kept.
pub(crate) async fn delete_derived_cheques<C: ConnectionTrait>(
    conn: &C,
    sale_ids: Vec<Uuid>,
) -> Result<u64, ServiceError> {
    if sale_ids.is_empty() {
        return Ok(0);
    }
    let result = check::Entity::delete_many()
        .filter(check::Column::SaleId.is_in(sale_ids))
        .filter(check::Column::Source.is_in([CheckSource::AvanceVente, CheckSource::Paiement]))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// A received cheque in status `emis`, derived from a sale or a receipt.
pub(crate) fn received_cheque(
    user_id: Uuid,
    input: &ChequeInput,
    source: CheckSource,
    project_id: Option<Uuid>,
    sale_id: Option<Uuid>,
    drawer_name: Option<String>,
    issue_date: NaiveDate,
) -> check::ActiveModel {
    check::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        project_id: Set(project_id),
        sale_id: Set(sale_id),
        expense_id: Set(None),
        check_type: Set(CheckType::Recu),
        check_number: Set(input.check_number.trim().to_string()),
        bank_name: Set(input.bank_name.clone()),
        amount: Set(input.amount),
        drawer_name: Set(drawer_name),
        beneficiary_name: Set(None),
        issue_date: Set(issue_date),
        due_date: Set(input.due_date),
        status: Set(CheckStatus::Emis),
        source: Set(source),
        notes: Set(None),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCheckRequest {
    pub check_type: CheckType,
    #[validate(length(min = 1, max = 64))]
    pub check_number: String,
    pub bank_name: Option<String>,
    pub amount: Decimal,
    pub drawer_name: Option<String>,
    pub beneficiary_name: Option<String>,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub expense_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCheckRequest {
    #[validate(length(min = 1, max = 64))]
    pub check_number: Option<String>,
    pub bank_name: Option<String>,
    pub amount: Option<Decimal>,
    pub drawer_name: Option<String>,
    pub beneficiary_name: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCheckStatusRequest {
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CheckFilter {
    pub check_type: Option<CheckType>,
    pub status: Option<CheckStatus>,
    pub project_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub range: DateRange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckBucket {
    pub count: u64,
    pub amount: Decimal,
}

impl CheckBucket {
    fn push(&mut self, amount: Decimal) {
        self.count += 1;
        self.amount += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckStatusBreakdown {
    pub emis: CheckBucket,
    pub encaisse: CheckBucket,
    pub rejete: CheckBucket,
    pub annule: CheckBucket,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckTypeBreakdown {
    pub recu: CheckBucket,
    pub emis: CheckBucket,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CheckStats {
    pub total: CheckBucket,
    pub by_status: CheckStatusBreakdown,
    pub by_type: CheckTypeBreakdown,
    /// Cheques still `emis` whose date falls within the next 7 days
    pub due_soon: CheckBucket,
}

impl CheckStats {
    pub fn from_checks(checks: &[check::Model], today: NaiveDate) -> Self {
        let horizon = today + Duration::days(7);
        let mut stats = Self::default();
        for c in checks {
            stats.total.push(c.amount);
            match c.status {
                CheckStatus::Emis => stats.by_status.emis.push(c.amount),
                CheckStatus::Encaisse => stats.by_status.encaisse.push(c.amount),
                CheckStatus::Rejete => stats.by_status.rejete.push(c.amount),
                CheckStatus::Annule => stats.by_status.annule.push(c.amount),
            }
            match c.check_type {
                CheckType::Recu => stats.by_type.recu.push(c.amount),
                CheckType::Emis => stats.by_type.emis.push(c.amount),
            }
            let date = c.effective_date();
            if c.status == CheckStatus::Emis && date >= today && date <= horizon {
                stats.due_soon.push(c.amount);
            }
        }
        stats
    }
}

/// Service for the cheque register
#[derive(Clone)]
pub struct CheckService {
    db_pool: Arc<DbPool>,
}

impl CheckService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_checks(
        &self,
        user_id: Uuid,
        filter: CheckFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<check::Model>, u64), ServiceError> {
        let mut query = check::Entity::find().filter(check::Column::UserId.eq(user_id));
        if let Some(check_type) = filter.check_type {
            query = query.filter(check::Column::CheckType.eq(check_type));
        }
        if let Some(status) = filter.status {
            query = query.filter(check::Column::Status.eq(status));
        }
        if let Some(project_id) = filter.project_id {
            query = query.filter(check::Column::ProjectId.eq(project_id));
        }
        if let Some(sale_id) = filter.sale_id {
            query = query.filter(check::Column::SaleId.eq(sale_id));
        }
        if !filter.range.is_unbounded() {
            // due date when there is one, issue date otherwise
            query = query.filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(check::Column::DueDate.is_not_null())
                            .add(filter.range.condition(check::Column::DueDate)),
                    )
                    .add(
                        Condition::all()
                            .add(check::Column::DueDate.is_null())
                            .add(filter.range.condition(check::Column::IssueDate)),
                    ),
            );
        }

        let paginator = query
            .order_by_desc(check::Column::IssueDate)
            .order_by_desc(check::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let checks = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((checks, total))
    }

    #[instrument(skip(self, request), fields(check_number = %request.check_number))]
    pub async fn create_check(
        &self,
        user_id: Uuid,
        request: CreateCheckRequest,
    ) -> Result<check::Model, ServiceError> {
        request.validate()?;
        ensure_positive("amount", request.amount)?;
        let db = &*self.db_pool;

        let mut project_id = request.project_id;
        if let Some(id) = project_id {
            owned_project(db, user_id, id).await?;
        }
        if let Some(id) = request.sale_id {
            let (sale, _) = owned_sale(db, user_id, id).await?;
            project_id = project_id.or(Some(sale.project_id));
        }
        if let Some(id) = request.expense_id {
            let (expense, _) = owned_expense(db, user_id, id).await?;
            project_id = project_id.or(Some(expense.project_id));
        }

        let check = check::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            project_id: Set(project_id),
            sale_id: Set(request.sale_id),
            expense_id: Set(request.expense_id),
            check_type: Set(request.check_type),
            check_number: Set(non_empty("check_number", &request.check_number)?),
            bank_name: Set(request.bank_name),
            amount: Set(request.amount),
            drawer_name: Set(request.drawer_name),
            beneficiary_name: Set(request.beneficiary_name),
            issue_date: Set(request.issue_date.unwrap_or_else(today)),
            due_date: Set(request.due_date),
            status: Set(CheckStatus::Emis),
            source: Set(CheckSource::Manuel),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(check_id = %check.id, "check recorded");
        Ok(check)
    }

    pub async fn get_check(&self, user_id: Uuid, check_id: Uuid) -> Result<check::Model, ServiceError> {
        check::Entity::find_by_id(check_id)
            .filter(check::Column::UserId.eq(user_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Check", check_id))
    }

    /// Only a cheque still in status `emis` can be edited. Derived cheques keep
    /// their amount.
    #[instrument(skip(self, request))]
    pub async fn update_check(
        &self,
        user_id: Uuid,
        check_id: Uuid,
        request: UpdateCheckRequest,
    ) -> Result<check::Model, ServiceError> {
        request.validate()?;
        let current = self.get_check(user_id, check_id).await?;
        if current.status != CheckStatus::Emis {
            return Err(ServiceError::invalid_operation(
                "Only a cheque in status emis can be edited",
            ));
        }

        let (source, original_amount) = (current.source, current.amount);
        let mut active: check::ActiveModel = current.into();
        if let Some(number) = request.check_number {
            active.check_number = Set(non_empty("check_number", &number)?);
        }
        if let Some(bank) = request.bank_name {
            active.bank_name = Set(Some(bank));
        }
        if let Some(amount) = request.amount {
            ensure_positive("amount", amount)?;
            if source != CheckSource::Manuel && amount != original_amount {
                return Err(ServiceError::invalid_operation(
                    "The amount of a cheque derived from a sale or payment cannot change",
                ));
            }
            active.amount = Set(amount);
        }
        if let Some(drawer) = request.drawer_name {
            active.drawer_name = Set(Some(drawer));
        }
        if let Some(beneficiary) = request.beneficiary_name {
            active.beneficiary_name = Set(Some(beneficiary));
        }
        if let Some(date) = request.issue_date {
            active.issue_date = Set(date);
        }
        if let Some(date) = request.due_date {
            active.due_date = Set(Some(date));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        user_id: Uuid,
        check_id: Uuid,
        status: CheckStatus,
    ) -> Result<check::Model, ServiceError> {
        let current = self.get_check(user_id, check_id).await?;
        if !current.status.can_transition_to(status) {
            warn!(check_id = %check_id, from = ?current.status, to = ?status, "check transition rejected");
            return Err(ServiceError::invalid_operation(format!(
                "A cheque cannot go from {:?} to {:?}",
                current.status, status
            )));
        }

        let mut active: check::ActiveModel = current.into();
        active.status = Set(status);
        let check = active.update(&*self.db_pool).await?;
        info!(check_id = %check_id, status = ?status, "check status changed");
        Ok(check)
    }

    /// Manual cheques can always be deleted; derived ones only once cancelled.
    #[instrument(skip(self))]
    pub async fn delete_check(&self, user_id: Uuid, check_id: Uuid) -> Result<(), ServiceError> {
        let check = self.get_check(user_id, check_id).await?;
        if check.source != CheckSource::Manuel && check.status != CheckStatus::Annule {
            return Err(ServiceError::invalid_operation(
                "A cheque derived from a sale or payment must be cancelled before deletion",
            ));
        }
        check.delete(&*self.db_pool).await?;
        info!(check_id = %check_id, "check deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, user_id: Uuid) -> Result<CheckStats, ServiceError> {
        let checks = check::Entity::find()
            .filter(check::Column::UserId.eq(user_id))
            .all(&*self.db_pool)
            .await?;
        Ok(CheckStats::from_checks(&checks, today()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn cheque(number: &str, amount: Decimal) -> ChequeInput {
        ChequeInput {
            check_number: number.into(),
            bank_name: Some("Attijariwafa".into()),
            amount,
            due_date: None,
        }
    }

    fn check(
        check_type: CheckType,
        status: CheckStatus,
        amount: Decimal,
        issue: NaiveDate,
        due: Option<NaiveDate>,
    ) -> check::Model {
        check::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_id: None,
            sale_id: None,
            expense_id: None,
            check_type,
            check_number: "0001".into(),
            bank_name: None,
            amount,
            drawer_name: None,
            beneficiary_name: None,
            issue_date: issue,
            due_date: due,
            status,
            source: CheckSource::Manuel,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn cheques_must_cover_the_cheque_part() {
        let pair = vec![cheque("100", dec!(30000)), cheque("101", dec!(20000))];
        assert!(validate_cheque_inputs(&pair, dec!(50000)).is_ok());
        assert!(validate_cheque_inputs(&pair, dec!(60000)).is_err());
        assert!(validate_cheque_inputs(&[], dec!(60000)).is_ok());
        assert!(validate_cheque_inputs(&[cheque(" ", dec!(10))], dec!(10)).is_err());
        assert!(validate_cheque_inputs(&[cheque("1", dec!(0))], dec!(0)).is_err());
    }

    #[test]
    fn stats_bucket_by_status_type_and_due_window() {
        let today = d(2026, 10, 14);
        let checks = vec![
            check(CheckType::Recu, CheckStatus::Emis, dec!(1000), d(2026, 10, 1), Some(d(2026, 10, 20))),
            check(CheckType::Recu, CheckStatus::Emis, dec!(500), d(2026, 10, 16), None),
            check(CheckType::Recu, CheckStatus::Emis, dec!(700), d(2026, 10, 1), Some(d(2026, 11, 30))),
            check(CheckType::Emis, CheckStatus::Encaisse, dec!(300), d(2026, 10, 1), Some(d(2026, 10, 15))),
            check(CheckType::Emis, CheckStatus::Rejete, dec!(200), d(2026, 9, 1), None),
        ];
        let stats = CheckStats::from_checks(&checks, today);
        assert_eq!(stats.total, CheckBucket { count: 5, amount: dec!(2700) });
        assert_eq!(stats.by_status.emis.count, 3);
        assert_eq!(stats.by_status.encaisse.amount, dec!(300));
        assert_eq!(stats.by_type.emis, CheckBucket { count: 2, amount: dec!(500) });
        assert_eq!(stats.due_soon, CheckBucket { count: 2, amount: dec!(1500) });
    }
}
