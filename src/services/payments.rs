use crate::{
    common::DateRange,
    db::DbPool,
    entities::{
        check::{self, CheckSource, CheckStatus},
        payment::{self, PaymentMethod},
        payment_check,
        payment_plan::{self, PaymentPlanStatus},
        project,
        sale::{self, SaleStatus},
    },
    errors::ServiceError,
    services::{
        checks::{received_cheque, validate_cheque_inputs, ChequeInput},
        ensure_positive, owned_sale, owned_sale_ids,
        reconciliation::{
            build_schedule, calculate_payment_plan_status, round_money, AmountSplit,
            PaymentSchedule,
        },
        sales::{new_plan, paid_by_sale, plans_of_sale, CollectedBreakdown, InstallmentInput},
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
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Width of the "upcoming" window used by the stats endpoint.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePlanRequest {
    /// Defaults to the next free number
    #[validate(range(min = 1))]
    pub installment_number: Option<i32>,
    pub due_date: NaiveDate,
    pub planned_amount: Decimal,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanRequest {
    pub due_date: Option<NaiveDate>,
    pub planned_amount: Option<Decimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// A receipt against an installment. When the declared/undeclared parts are
/// omitted the whole amount is declared; when only one is given the other is
/// the remainder.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub declared_amount: Option<Decimal>,
    pub undeclared_amount: Option<Decimal>,
    #[serde(default)]
    pub cash_amount: Decimal,
    #[serde(default)]
    pub cheque_amount: Decimal,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    /// Derived from the cash/cheque parts when omitted
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub cheques: Vec<ChequeInput>,
}

impl RecordPaymentRequest {
    pub fn split(&self) -> Result<AmountSplit, ServiceError> {
        let (declared, undeclared) = match (self.declared_amount, self.undeclared_amount) {
            (Some(declared), Some(undeclared)) => (declared, undeclared),
            (Some(declared), None) => {
                let split = AmountSplit::from_declared(self.amount, declared)?;
                (split.declared, split.undeclared)
            }
            (None, Some(undeclared)) => (self.amount - undeclared, undeclared),
            (None, None) => (self.amount, Decimal::ZERO),
        };
        let split = AmountSplit {
            total: self.amount,
            declared,
            undeclared,
            cash: self.cash_amount,
            cheque: self.cheque_amount,
        };
        split.validate()?;
        Ok(split)
    }
}

fn method_for(split: &AmountSplit) -> PaymentMethod {
    match (split.cash.is_zero(), split.cheque.is_zero()) {
        (true, false) => PaymentMethod::Cheque,
        (false, false) => PaymentMethod::Mixte,
        _ => PaymentMethod::Especes,
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentWithCheques {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub cheques: Vec<check::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: payment_plan::Model,
    pub outstanding: Decimal,
    pub payments: Vec<PaymentWithCheques>,
}

/// An installment still expecting money, with enough context to chase it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DuePlan {
    #[serde(flatten)]
    pub plan: payment_plan::Model,
    pub outstanding: Decimal,
    pub days_until_due: i64,
    pub project_id: Uuid,
    pub project_name: String,
    pub unit_number: String,
    pub client_name: String,
    pub client_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DueSummary {
    pub count: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaymentStats {
    /// Receipts dated within the period
    pub collected: CollectedBreakdown,
    pub payment_count: u64,
    pub overdue: DueSummary,
    pub upcoming: DueSummary,
}

/// Recomputes an installment's aggregates from its receipts.
pub(crate) async fn recompute_plan<C: ConnectionTrait>(
    conn: &C,
    plan: payment_plan::Model,
    today: NaiveDate,
) -> Result<payment_plan::Model, ServiceError> {
    let payments = payment::Entity::find()
        .filter(payment::Column::PlanId.eq(plan.id))
        .all(conn)
        .await?;

    let mut totals = CollectedBreakdown::default();
    for p in &payments {
        totals.add(&AmountSplit {
            total: p.amount,
            declared: p.declared_amount,
            undeclared: p.undeclared_amount,
            cash: p.cash_amount,
            cheque: p.cheque_amount,
        });
    }
    let totals = totals.rounded();

    let last_date = payments.iter().map(|p| p.payment_date).max();
    let method = match payments.first() {
        None => None,
        Some(first) if payments.iter().all(|p| p.payment_method == first.payment_method) => {
            Some(first.payment_method)
        }
        Some(_) => Some(PaymentMethod::Mixte),
    };
    let status = calculate_payment_plan_status(
        plan.planned_amount,
        totals.total,
        plan.due_date,
        plan.status,
        today,
    );

    let mut active: payment_plan::ActiveModel = plan.into();
    active.paid_amount = Set(totals.total);
    active.declared_amount = Set(totals.declared);
    active.undeclared_amount = Set(totals.undeclared);
    active.cash_amount = Set(totals.cash);
    active.cheque_amount = Set(totals.cheque);
    active.payment_date = Set(last_date);
    active.payment_method = Set(method);
    active.status = Set(status);
    Ok(active.update(conn).await?)
}

/// Reports a missing parent as the child itself being missing.
fn hide_as(entity: &str, id: Uuid, err: ServiceError) -> ServiceError {
    match err {
        ServiceError::NotFound(_) => ServiceError::not_found(entity, id),
        other => other,
    }
}

async fn owned_plan<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<(payment_plan::Model, sale::Model), ServiceError> {
    let plan = payment_plan::Entity::find_by_id(plan_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payment plan", plan_id))?;
    let (sale, _) = owned_sale(conn, user_id, plan.sale_id)
        .await
        .map_err(|e| hide_as("Payment plan", plan_id, e))?;
    Ok((plan, sale))
}

async fn payment_count<C: ConnectionTrait>(conn: &C, plan_id: Uuid) -> Result<u64, ServiceError> {
    Ok(payment::Entity::find()
        .filter(payment::Column::PlanId.eq(plan_id))
        .count(conn)
        .await?)
}

fn with_derived_status(mut plan: payment_plan::Model, today: NaiveDate) -> payment_plan::Model {
    plan.status = calculate_payment_plan_status(
        plan.planned_amount,
        plan.paid_amount,
        plan.due_date,
        plan.status,
        today,
    );
    plan
}

fn outstanding(plan: &payment_plan::Model) -> Decimal {
    (plan.planned_amount - plan.paid_amount).max(Decimal::ZERO)
}

/// Service for installments and the receipts recorded against them
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn schedule(&self, user_id: Uuid, sale_id: Uuid) -> Result<PaymentSchedule, ServiceError> {
        let db = &*self.db_pool;
        let (sale, _) = owned_sale(db, user_id, sale_id).await?;
        let plans = plans_of_sale(db, sale.id).await?;
        Ok(build_schedule(&sale, &plans, today()))
    }

    #[instrument(skip(self, request))]
    pub async fn add_plan(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        request: CreatePlanRequest,
    ) -> Result<payment_plan::Model, ServiceError> {
        request.validate()?;
        ensure_positive("planned_amount", request.planned_amount)?;

        let txn = self.db_pool.begin().await?;
        let (sale, _) = owned_sale(&txn, user_id, sale_id).await?;
        if sale.status == SaleStatus::Annule {
            return Err(ServiceError::invalid_operation(
                "Cannot add an installment to a cancelled sale",
            ));
        }

        let existing = plans_of_sale(&txn, sale.id).await?;
        let number = match request.installment_number {
            Some(n) => {
                if existing.iter().any(|p| p.installment_number == n) {
                    return Err(ServiceError::Conflict(format!(
                        "Installment {n} already exists for this sale"
                    )));
                }
                n
            }
            None => existing
                .iter()
                .map(|p| p.installment_number)
                .max()
                .unwrap_or(0)
                + 1,
        };

        let input = InstallmentInput {
            installment_number: number,
            due_date: request.due_date,
            planned_amount: request.planned_amount,
            description: request.description,
        };
        let mut active = new_plan(sale.id, &input, today());
        active.notes = Set(request.notes);
        let plan = active.insert(&txn).await.map_err(|e| {
            ServiceError::conflict_on_unique(
                e,
                format!("Installment {number} already exists for this sale"),
            )
        })?;
        txn.commit().await?;

        info!(plan_id = %plan.id, sale_id = %sale_id, number, "installment added");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn get_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<PlanDetail, ServiceError> {
        let db = &*self.db_pool;
        let (plan, _) = owned_plan(db, user_id, plan_id).await?;

        let payments = payment::Entity::find()
            .filter(payment::Column::PlanId.eq(plan.id))
            .order_by_asc(payment::Column::PaymentDate)
            .order_by_asc(payment::Column::CreatedAt)
            .find_with_related(payment_check::Entity)
            .all(db)
            .await?;

        let check_ids: Vec<Uuid> = payments
            .iter()
            .flat_map(|(_, links)| links.iter().map(|l| l.check_id))
            .collect();
        let cheques: HashMap<Uuid, check::Model> = if check_ids.is_empty() {
            HashMap::new()
        } else {
            check::Entity::find()
                .filter(check::Column::Id.is_in(check_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let payments = payments
            .into_iter()
            .map(|(payment, links)| PaymentWithCheques {
                cheques: links
                    .iter()
                    .filter_map(|l| cheques.get(&l.check_id).cloned())
                    .collect(),
                payment,
            })
            .collect();

        let plan = with_derived_status(plan, today());
        Ok(PlanDetail {
            outstanding: outstanding(&plan),
            plan,
            payments,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        request: UpdatePlanRequest,
    ) -> Result<payment_plan::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let (plan, _) = owned_plan(&txn, user_id, plan_id).await?;
        if plan.status == PaymentPlanStatus::Annule {
            return Err(ServiceError::invalid_operation(
                "A cancelled installment cannot be edited",
            ));
        }

        let planned = request.planned_amount.unwrap_or(plan.planned_amount);
        ensure_positive("planned_amount", planned)?;
        let due_date = request.due_date.unwrap_or(plan.due_date);
        let status = calculate_payment_plan_status(planned, plan.paid_amount, due_date, plan.status, today());

        let mut active: payment_plan::ActiveModel = plan.into();
        active.planned_amount = Set(planned);
        active.due_date = Set(due_date);
        active.status = Set(status);
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        let plan = active.update(&txn).await?;
        txn.commit().await?;
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn delete_plan(&self, user_id: Uuid, plan_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let (plan, _) = owned_plan(db, user_id, plan_id).await?;
        if payment_count(db, plan.id).await? > 0 {
            return Err(ServiceError::invalid_operation(
                "An installment with receipts cannot be deleted",
            ));
        }
        plan.delete(db).await?;
        info!(plan_id = %plan_id, "installment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn cancel_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<payment_plan::Model, ServiceError> {
        let db = &*self.db_pool;
        let (plan, _) = owned_plan(db, user_id, plan_id).await?;
        if payment_count(db, plan.id).await? > 0 {
            warn!(plan_id = %plan_id, "cancel rejected: installment has receipts");
            return Err(ServiceError::invalid_operation(
                "An installment with receipts cannot be cancelled",
            ));
        }
        let mut active: payment_plan::ActiveModel = plan.into();
        active.status = Set(PaymentPlanStatus::Annule);
        let plan = active.update(db).await?;
        info!(plan_id = %plan_id, "installment cancelled");
        Ok(plan)
    }

    /// Records a receipt with its cheques and refreshes the installment, all
    /// in one transaction.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn record_payment(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<PlanDetail, ServiceError> {
        request.validate()?;
        ensure_positive("amount", request.amount)?;
        let split = request.split()?;
        validate_cheque_inputs(&request.cheques, split.cheque)?;

        let txn = self.db_pool.begin().await?;
        let (plan, sale) = owned_plan(&txn, user_id, plan_id).await?;
        if plan.status == PaymentPlanStatus::Annule {
            return Err(ServiceError::invalid_operation(
                "Cannot record a payment on a cancelled installment",
            ));
        }
        if sale.status == SaleStatus::Annule {
            return Err(ServiceError::invalid_operation(
                "Cannot record a payment on a cancelled sale",
            ));
        }

        let already_paid = sale.advance_total()
            + paid_by_sale(&txn, vec![sale.id])
                .await?
                .remove(&sale.id)
                .unwrap_or_default();
        if already_paid + split.total > sale.total_price {
            return Err(ServiceError::validation(format!(
                "Payment of {} would bring the total paid to {} above the price {}",
                split.total,
                already_paid + split.total,
                sale.total_price
            )));
        }

        let payment_date = request.payment_date.unwrap_or_else(today);
        let payment = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            plan_id: Set(plan.id),
            sale_id: Set(sale.id),
            amount: Set(split.total),
            declared_amount: Set(split.declared),
            undeclared_amount: Set(split.undeclared),
            cash_amount: Set(split.cash),
            cheque_amount: Set(split.cheque),
            payment_date: Set(payment_date),
            payment_method: Set(request.payment_method.unwrap_or_else(|| method_for(&split))),
            reference: Set(request.reference),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        for input in &request.cheques {
            let cheque = received_cheque(
                user_id,
                input,
                CheckSource::Paiement,
                Some(sale.project_id),
                Some(sale.id),
                Some(sale.client_name.clone()),
                payment_date,
            )
            .insert(&txn)
            .await?;
            payment_check::ActiveModel {
                id: Set(Uuid::new_v4()),
                payment_id: Set(payment.id),
                check_id: Set(cheque.id),
                amount: Set(input.amount),
            }
            .insert(&txn)
            .await?;
        }

        let plan = recompute_plan(&txn, plan, today()).await?;
        txn.commit().await?;

        info!(
            payment_id = %payment.id,
            plan_id = %plan.id,
            paid = %plan.paid_amount,
            status = ?plan.status,
            "payment recorded"
        );
        self.get_plan(user_id, plan.id).await
    }

    /// Removes a receipt, cancels its still-pending cheques and refreshes the
    /// installment.
    #[instrument(skip(self))]
    pub async fn delete_payment(&self, user_id: Uuid, payment_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let payment = payment::Entity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", payment_id))?;
        let (plan, _) = owned_plan(&txn, user_id, payment.plan_id)
            .await
            .map_err(|e| hide_as("Payment", payment_id, e))?;

        let links = payment_check::Entity::find()
            .filter(payment_check::Column::PaymentId.eq(payment.id))
            .all(&txn)
            .await?;
        let check_ids: Vec<Uuid> = links.iter().map(|l| l.check_id).collect();
        if !check_ids.is_empty() {
            let pending = check::Entity::find()
                .filter(check::Column::Id.is_in(check_ids))
                .filter(check::Column::Status.eq(CheckStatus::Emis))
                .all(&txn)
                .await?;
            for cheque in pending {
                let mut active: check::ActiveModel = cheque.into();
                active.status = Set(CheckStatus::Annule);
                active.update(&txn).await?;
            }
        }
        payment_check::Entity::delete_many()
            .filter(payment_check::Column::PaymentId.eq(payment.id))
            .exec(&txn)
            .await?;
        payment.delete(&txn).await?;

        let plan = recompute_plan(&txn, plan, today()).await?;
        txn.commit().await?;
        info!(payment_id = %payment_id, plan_id = %plan.id, "payment deleted");
        Ok(())
    }

    /// Unpaid installments of active sales with their context, ordered by due date.
    async fn open_plans(&self, user_id: Uuid) -> Result<Vec<DuePlan>, ServiceError> {
        let db = &*self.db_pool;
        let sale_ids = owned_sale_ids(db, user_id, None).await?;
        if sale_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sales: HashMap<Uuid, (sale::Model, Option<project::Model>)> = sale::Entity::find()
            .filter(sale::Column::Id.is_in(sale_ids.clone()))
            .filter(sale::Column::Status.ne(SaleStatus::Annule))
            .find_also_related(project::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(s, p)| (s.id, (s, p)))
            .collect();

        let today = today();
        let plans = payment_plan::Entity::find()
            .filter(payment_plan::Column::SaleId.is_in(sale_ids))
            .filter(payment_plan::Column::Status.ne(PaymentPlanStatus::Annule))
            .order_by_asc(payment_plan::Column::DueDate)
            .all(db)
            .await?;

        Ok(plans
            .into_iter()
            .filter(|p| p.paid_amount < p.planned_amount)
            .filter_map(|plan| {
                let (sale, project) = sales.get(&plan.sale_id)?;
                let plan = with_derived_status(plan, today);
                Some(DuePlan {
                    outstanding: outstanding(&plan),
                    days_until_due: (plan.due_date - today).num_days(),
                    project_id: sale.project_id,
                    project_name: project.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
                    unit_number: sale.unit_number.clone(),
                    client_name: sale.client_name.clone(),
                    client_phone: sale.client_phone.clone(),
                    plan,
                })
            })
            .collect())
    }

    /// Open installments falling due between today and `days` from now.
    #[instrument(skip(self))]
    pub async fn upcoming(&self, user_id: Uuid, days: i64) -> Result<Vec<DuePlan>, ServiceError> {
        if days < 0 {
            return Err(ServiceError::validation("days cannot be negative"));
        }
        Ok(self
            .open_plans(user_id)
            .await?
            .into_iter()
            .filter(|p| (0..=days).contains(&p.days_until_due))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn overdue(&self, user_id: Uuid) -> Result<Vec<DuePlan>, ServiceError> {
        Ok(self
            .open_plans(user_id)
            .await?
            .into_iter()
            .filter(|p| p.plan.status == PaymentPlanStatus::EnRetard)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, user_id: Uuid, range: DateRange) -> Result<PaymentStats, ServiceError> {
        let db = &*self.db_pool;
        let sale_ids = owned_sale_ids(db, user_id, None).await?;
        if sale_ids.is_empty() {
            return Ok(PaymentStats::default());
        }

        let payments = payment::Entity::find()
            .filter(payment::Column::SaleId.is_in(sale_ids))
            .filter(range.condition(payment::Column::PaymentDate))
            .all(db)
            .await?;
        let mut collected = CollectedBreakdown::default();
        for p in &payments {
            collected.add(&AmountSplit {
                total: p.amount,
                declared: p.declared_amount,
                undeclared: p.undeclared_amount,
                cash: p.cash_amount,
                cheque: p.cheque_amount,
            });
        }

        let open = self.open_plans(user_id).await?;
        let mut overdue = DueSummary::default();
        let mut upcoming = DueSummary::default();
        for due in &open {
            if due.plan.status == PaymentPlanStatus::EnRetard {
                overdue.count += 1;
                overdue.amount += due.outstanding;
            } else if (0..=UPCOMING_WINDOW_DAYS).contains(&due.days_until_due) {
                upcoming.count += 1;
                upcoming.amount += due.outstanding;
            }
        }
        overdue.amount = round_money(overdue.amount);
        upcoming.amount = round_money(upcoming.amount);

        Ok(PaymentStats {
            collected: collected.rounded(),
            payment_count: payments.len() as u64,
            overdue,
            upcoming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal) -> RecordPaymentRequest {
        RecordPaymentRequest {
            amount,
            declared_amount: None,
            undeclared_amount: None,
            cash_amount: Decimal::ZERO,
            cheque_amount: Decimal::ZERO,
            payment_date: None,
            payment_method: None,
            reference: None,
            notes: None,
            cheques: Vec::new(),
        }
    }

    #[test]
    fn omitted_parts_default_to_fully_declared() {
        let split = request(dec!(1000)).split().unwrap();
        assert_eq!(split.declared, dec!(1000));
        assert_eq!(split.undeclared, Decimal::ZERO);
    }

    #[test]
    fn one_part_implies_the_other() {
        let declared_only = RecordPaymentRequest {
            declared_amount: Some(dec!(600)),
            ..request(dec!(1000))
        };
        assert_eq!(declared_only.split().unwrap().undeclared, dec!(400));

        let undeclared_only = RecordPaymentRequest {
            undeclared_amount: Some(dec!(250)),
            ..request(dec!(1000))
        };
        assert_eq!(undeclared_only.split().unwrap().declared, dec!(750));

        let too_much_undeclared = RecordPaymentRequest {
            undeclared_amount: Some(dec!(1200)),
            ..request(dec!(1000))
        };
        assert_matches!(too_much_undeclared.split(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn inconsistent_means_are_rejected() {
        let bad = RecordPaymentRequest {
            cash_amount: dec!(500),
            cheque_amount: dec!(300),
            ..request(dec!(1000))
        };
        assert_matches!(bad.split(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn method_follows_the_means() {
        let cash = AmountSplit::new(dec!(100), dec!(0), dec!(100), dec!(0));
        let cheque = AmountSplit::new(dec!(100), dec!(0), dec!(0), dec!(100));
        let mixed = AmountSplit::new(dec!(100), dec!(0), dec!(40), dec!(60));
        assert_eq!(method_for(&cash), PaymentMethod::Especes);
        assert_eq!(method_for(&cheque), PaymentMethod::Cheque);
        assert_eq!(method_for(&mixed), PaymentMethod::Mixte);
    }
}
