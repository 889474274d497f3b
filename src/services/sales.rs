use crate::{
    common::DateRange,
    db::DbPool,
    entities::{
        check::{self, CheckSource},
        company_settings, payment_plan,
        payment_plan::PaymentPlanStatus,
        project,
        sale::{self, SaleStatus, UnitType},
    },
    errors::ServiceError,
    services::{
        checks::{delete_derived_cheques, received_cheque, validate_cheque_inputs, ChequeInput},
        ensure_non_negative, ensure_positive, non_empty, owned_project, owned_project_ids,
        owned_sale,
        reconciliation::{
            build_schedule, calculate_payment_plan_status, percentage, round_money, AmountSplit,
            PaymentSchedule,
        },
        settings::settings_or_default,
        today,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// An installment declared together with a new sale.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct InstallmentInput {
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub planned_amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSaleRequest {
    pub project_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub unit_number: String,
    pub unit_type: UnitType,
    pub unit_surface: Option<Decimal>,
    #[validate(length(min = 1, max = 255))]
    pub client_name: String,
    pub client_phone: Option<String>,
    #[validate(email)]
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub client_cin: Option<String>,
    pub total_price: Decimal,
    /// Defaults to today
    pub sale_date: Option<NaiveDate>,
    #[serde(default)]
    pub advance_declared: Decimal,
    #[serde(default)]
    pub advance_undeclared: Decimal,
    #[serde(default)]
    pub advance_cash: Decimal,
    #[serde(default)]
    pub advance_cheque: Decimal,
    pub notes: Option<String>,
    #[serde(default)]
    pub installments: Vec<InstallmentInput>,
    #[serde(default)]
    pub advance_cheques: Vec<ChequeInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSaleRequest {
    #[validate(length(min = 1, max = 64))]
    pub unit_number: Option<String>,
    pub unit_type: Option<UnitType>,
    pub unit_surface: Option<Decimal>,
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    #[validate(email)]
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub client_cin: Option<String>,
    pub total_price: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub advance_declared: Option<Decimal>,
    pub advance_undeclared: Option<Decimal>,
    pub advance_cash: Option<Decimal>,
    pub advance_cheque: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSaleStatusRequest {
    pub status: SaleStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<SaleStatus>,
    pub search: Option<String>,
    pub range: DateRange,
}

/// A sale row with its collection figures.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleSummary {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub project_name: String,
    pub advance_total: Decimal,
    /// Advance plus installment receipts
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
}

impl SaleSummary {
    fn new(sale: sale::Model, project_name: String, paid_installments: Decimal) -> Self {
        let advance_total = sale.advance_total();
        let total_paid = round_money(advance_total + paid_installments);
        Self {
            project_name,
            advance_total,
            total_paid,
            remaining: round_money((sale.total_price - total_paid).max(Decimal::ZERO)),
            progress: percentage(total_paid, sale.total_price),
            sale,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub summary: SaleSummary,
    pub schedule: PaymentSchedule,
}

/// Everything needed to print a client's account statement.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleStatement {
    pub company: company_settings::Model,
    pub project: project::Model,
    pub sale: SaleSummary,
    pub schedule: PaymentSchedule,
    pub cheques: Vec<check::Model>,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SaleStatusCounts {
    pub en_cours: u64,
    pub termine: u64,
    pub annule: u64,
}

/// Collected money with its declared/undeclared and cash/cheque parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CollectedBreakdown {
    pub total: Decimal,
    pub declared: Decimal,
    pub undeclared: Decimal,
    pub cash: Decimal,
    pub cheque: Decimal,
}

impl CollectedBreakdown {
    pub(crate) fn add(&mut self, split: &AmountSplit) {
        self.total += split.total;
        self.declared += split.declared;
        self.undeclared += split.undeclared;
        self.cash += split.cash;
        self.cheque += split.cheque;
    }

    pub(crate) fn rounded(self) -> Self {
        Self {
            total: round_money(self.total),
            declared: round_money(self.declared),
            undeclared: round_money(self.undeclared),
            cash: round_money(self.cash),
            cheque: round_money(self.cheque),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SaleStats {
    pub count: u64,
    pub by_status: SaleStatusCounts,
    /// Price of sales that are not cancelled
    pub total_value: Decimal,
    pub average_price: Decimal,
    pub total_advance: Decimal,
    pub collected: CollectedBreakdown,
}

/// Sum of installment receipts per sale, cancelled installments excluded.
pub(crate) async fn paid_by_sale<C: ConnectionTrait>(
    conn: &C,
    sale_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
    let mut paid = HashMap::new();
    if sale_ids.is_empty() {
        return Ok(paid);
    }
    let plans = payment_plan::Entity::find()
        .filter(payment_plan::Column::SaleId.is_in(sale_ids))
        .filter(payment_plan::Column::Status.ne(PaymentPlanStatus::Annule))
        .all(conn)
        .await?;
    for plan in plans {
        *paid.entry(plan.sale_id).or_insert(Decimal::ZERO) += plan.paid_amount;
    }
    Ok(paid)
}

pub(crate) async fn plans_of_sale<C: ConnectionTrait>(
    conn: &C,
    sale_id: Uuid,
) -> Result<Vec<payment_plan::Model>, ServiceError> {
    Ok(payment_plan::Entity::find()
        .filter(payment_plan::Column::SaleId.eq(sale_id))
        .order_by_asc(payment_plan::Column::InstallmentNumber)
        .all(conn)
        .await?)
}

/// Rejects a unit already held by another active sale of the project.
async fn ensure_unit_available<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    unit_number: &str,
    except_sale: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = sale::Entity::find()
        .filter(sale::Column::ProjectId.eq(project_id))
        .filter(sale::Column::UnitNumber.eq(unit_number))
        .filter(sale::Column::Status.ne(SaleStatus::Annule));
    if let Some(id) = except_sale {
        query = query.filter(sale::Column::Id.ne(id));
    }
    if let Some(holder) = query.one(conn).await? {
        warn!(project_id = %project_id, unit = unit_number, holder = %holder.id, "unit already sold");
        return Err(ServiceError::Conflict(format!(
            "Unit {unit_number} is already sold to {}",
            holder.client_name
        )));
    }
    Ok(())
}

fn validate_pricing(total_price: Decimal, advance: &AmountSplit) -> Result<(), ServiceError> {
    ensure_positive("total_price", total_price)?;
    advance.validate()?;
    if advance.total > total_price {
        return Err(ServiceError::validation(format!(
            "Advance ({}) exceeds the total price ({})",
            advance.total, total_price
        )));
    }
    Ok(())
}

fn validate_installments(
    installments: &[InstallmentInput],
    advance_total: Decimal,
    total_price: Decimal,
) -> Result<(), ServiceError> {
    let mut numbers = HashSet::new();
    for installment in installments {
        if installment.installment_number < 1 {
            return Err(ServiceError::validation(
                "Installment numbers start at 1",
            ));
        }
        if !numbers.insert(installment.installment_number) {
            return Err(ServiceError::validation(format!(
                "Installment {} is listed twice",
                installment.installment_number
            )));
        }
        ensure_positive("planned_amount", installment.planned_amount)?;
    }
    let planned: Decimal = installments.iter().map(|i| i.planned_amount).sum();
    if planned + advance_total > total_price {
        return Err(ServiceError::validation(format!(
            "Advance plus installments ({}) exceed the total price ({})",
            planned + advance_total,
            total_price
        )));
    }
    Ok(())
}

/// Service for sales, their schedule and statements
#[derive(Clone)]
pub struct SaleService {
    db_pool: Arc<DbPool>,
    currency: String,
}

impl SaleService {
    pub fn new(db_pool: Arc<DbPool>, currency: String) -> Self {
        Self { db_pool, currency }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_sales(
        &self,
        user_id: Uuid,
        filter: SaleFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<SaleSummary>, u64), ServiceError> {
        let db = &*self.db_pool;
        let project_ids = match filter.project_id {
            Some(id) => vec![owned_project(db, user_id, id).await?.id],
            None => owned_project_ids(db, user_id).await?,
        };
        if project_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut query = sale::Entity::find()
            .find_also_related(project::Entity)
            .filter(sale::Column::ProjectId.is_in(project_ids))
            .filter(filter.range.condition(sale::Column::SaleDate));
        if let Some(status) = filter.status {
            query = query.filter(sale::Column::Status.eq(status));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(sale::Column::ClientName.contains(term))
                    .add(sale::Column::UnitNumber.contains(term)),
            );
        }

        let paginator = query
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let paid = paid_by_sale(db, rows.iter().map(|(s, _)| s.id).collect()).await?;
        let items = rows
            .into_iter()
            .map(|(sale, project)| {
                let paid = paid.get(&sale.id).copied().unwrap_or_default();
                let project_name = project.map(|p| p.name).unwrap_or_default();
                SaleSummary::new(sale, project_name, paid)
            })
            .collect();
        Ok((items, total))
    }

    /// Creates the sale with its installments and advance cheques in one transaction.
    #[instrument(skip(self, request), fields(project_id = %request.project_id, unit = %request.unit_number))]
    pub async fn create_sale(
        &self,
        user_id: Uuid,
        request: CreateSaleRequest,
    ) -> Result<SaleDetail, ServiceError> {
        request.validate()?;
        let advance = AmountSplit::new(
            request.advance_declared,
            request.advance_undeclared,
            request.advance_cash,
            request.advance_cheque,
        );
        validate_pricing(request.total_price, &advance)?;
        validate_installments(&request.installments, advance.total, request.total_price)?;
        validate_cheque_inputs(&request.advance_cheques, advance.cheque)?;
        if let Some(surface) = request.unit_surface {
            ensure_non_negative("unit_surface", surface)?;
        }

        let unit_number = non_empty("unit_number", &request.unit_number)?;
        let client_name = non_empty("client_name", &request.client_name)?;
        let sale_date = request.sale_date.unwrap_or_else(today);
        let now = today();

        let txn = self.db_pool.begin().await?;
        let project = owned_project(&txn, user_id, request.project_id).await?;
        ensure_unit_available(&txn, project.id, &unit_number, None).await?;

        let sale = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project.id),
            unit_number: Set(unit_number),
            unit_type: Set(request.unit_type),
            unit_surface: Set(request.unit_surface),
            client_name: Set(client_name.clone()),
            client_phone: Set(request.client_phone),
            client_email: Set(request.client_email),
            client_address: Set(request.client_address),
            client_cin: Set(request.client_cin),
            total_price: Set(request.total_price),
            sale_date: Set(sale_date),
            status: Set(SaleStatus::EnCours),
            advance_declared: Set(advance.declared),
            advance_undeclared: Set(advance.undeclared),
            advance_cash: Set(advance.cash),
            advance_cheque: Set(advance.cheque),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for installment in &request.installments {
            new_plan(sale.id, installment, now).insert(&txn).await?;
        }

        for cheque in &request.advance_cheques {
            received_cheque(
                user_id,
                cheque,
                CheckSource::AvanceVente,
                Some(project.id),
                Some(sale.id),
                Some(client_name.clone()),
                sale_date,
            )
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(
            sale_id = %sale.id,
            installments = request.installments.len(),
            advance = %advance.total,
            "sale created"
        );

        self.detail(sale, project.name).await
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, user_id: Uuid, sale_id: Uuid) -> Result<SaleDetail, ServiceError> {
        let (sale, project) = owned_sale(&*self.db_pool, user_id, sale_id).await?;
        self.detail(sale, project.name).await
    }

    async fn detail(&self, sale: sale::Model, project_name: String) -> Result<SaleDetail, ServiceError> {
        let plans = plans_of_sale(&*self.db_pool, sale.id).await?;
        let schedule = build_schedule(&sale, &plans, today());
        let paid_installments = schedule.totals.total_paid - sale.advance_total();
        Ok(SaleDetail {
            summary: SaleSummary::new(sale, project_name, paid_installments),
            schedule,
        })
    }

    /// Edits client, unit and pricing fields. Auto-derived cheques are left as they are.
    #[instrument(skip(self, request))]
    pub async fn update_sale(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        request: UpdateSaleRequest,
    ) -> Result<SaleDetail, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await?;
        let (current, project) = owned_sale(&txn, user_id, sale_id).await?;

        let total_price = request.total_price.unwrap_or(current.total_price);
        let advance = AmountSplit::new(
            request.advance_declared.unwrap_or(current.advance_declared),
            request.advance_undeclared.unwrap_or(current.advance_undeclared),
            request.advance_cash.unwrap_or(current.advance_cash),
            request.advance_cheque.unwrap_or(current.advance_cheque),
        );
        validate_pricing(total_price, &advance)?;

        let paid_installments = paid_by_sale(&txn, vec![current.id])
            .await?
            .remove(&current.id)
            .unwrap_or_default();
        if advance.total + paid_installments > total_price {
            return Err(ServiceError::validation(format!(
                "Collected amount ({}) would exceed the total price ({})",
                advance.total + paid_installments,
                total_price
            )));
        }

        let unit_number = match request.unit_number {
            Some(unit) => non_empty("unit_number", &unit)?,
            None => current.unit_number.clone(),
        };
        if unit_number != current.unit_number && current.status.is_active() {
            ensure_unit_available(&txn, project.id, &unit_number, Some(current.id)).await?;
        }

        let mut active: sale::ActiveModel = current.into();
        active.unit_number = Set(unit_number);
        if let Some(unit_type) = request.unit_type {
            active.unit_type = Set(unit_type);
        }
        if let Some(surface) = request.unit_surface {
            ensure_non_negative("unit_surface", surface)?;
            active.unit_surface = Set(Some(surface));
        }
        if let Some(name) = request.client_name {
            active.client_name = Set(non_empty("client_name", &name)?);
        }
        if let Some(phone) = request.client_phone {
            active.client_phone = Set(Some(phone));
        }
        if let Some(email) = request.client_email {
            active.client_email = Set(Some(email));
        }
        if let Some(address) = request.client_address {
            active.client_address = Set(Some(address));
        }
        if let Some(cin) = request.client_cin {
            active.client_cin = Set(Some(cin));
        }
        if let Some(date) = request.sale_date {
            active.sale_date = Set(date);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.total_price = Set(total_price);
        active.advance_declared = Set(advance.declared);
        active.advance_undeclared = Set(advance.undeclared);
        active.advance_cash = Set(advance.cash);
        active.advance_cheque = Set(advance.cheque);

        let sale = active.update(&txn).await?;
        txn.commit().await?;
        self.detail(sale, project.name).await
    }

    /// Applies a status transition. Cancelling also cancels the installments
    /// that have received nothing; reactivating checks the unit is still free.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        status: SaleStatus,
    ) -> Result<SaleDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let (current, project) = owned_sale(&txn, user_id, sale_id).await?;

        if !current.status.can_transition_to(status) {
            warn!(sale_id = %sale_id, from = ?current.status, to = ?status, "sale transition rejected");
            return Err(ServiceError::invalid_operation(format!(
                "Cannot move a sale from {:?} to {:?}",
                current.status, status
            )));
        }
        if current.status == SaleStatus::Annule && status == SaleStatus::EnCours {
            ensure_unit_available(&txn, project.id, &current.unit_number, Some(current.id)).await?;
        }

        if status == SaleStatus::Annule {
            let unpaid = payment_plan::Entity::find()
                .filter(payment_plan::Column::SaleId.eq(current.id))
                .filter(payment_plan::Column::PaidAmount.eq(Decimal::ZERO))
                .filter(payment_plan::Column::Status.ne(PaymentPlanStatus::Annule))
                .all(&txn)
                .await?;
            for plan in unpaid {
                let mut active: payment_plan::ActiveModel = plan.into();
                active.status = Set(PaymentPlanStatus::Annule);
                active.update(&txn).await?;
            }
        }

        let mut active: sale::ActiveModel = current.into();
        active.status = Set(status);
        let sale = active.update(&txn).await?;
        txn.commit().await?;

        info!(sale_id = %sale_id, status = ?status, "sale status changed");
        self.detail(sale, project.name).await
    }

    /// Deletes the sale with its plans, receipts and derived cheques.
    /// Manual cheques survive with their sale reference cleared.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, user_id: Uuid, sale_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let (sale, _) = owned_sale(&txn, user_id, sale_id).await?;
        let cheques = delete_derived_cheques(&txn, vec![sale.id]).await?;
        sale.delete(&txn).await?;
        txn.commit().await?;
        info!(sale_id = %sale_id, cheques, "sale deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn statement(&self, user_id: Uuid, sale_id: Uuid) -> Result<SaleStatement, ServiceError> {
        let db = &*self.db_pool;
        let (sale, project) = owned_sale(db, user_id, sale_id).await?;
        let company = settings_or_default(db, user_id).await?;
        let cheques = check::Entity::find()
            .filter(check::Column::SaleId.eq(sale.id))
            .filter(check::Column::UserId.eq(user_id))
            .order_by_asc(check::Column::IssueDate)
            .all(db)
            .await?;

        let detail = self.detail(sale, project.name.clone()).await?;
        Ok(SaleStatement {
            company,
            project,
            sale: detail.summary,
            schedule: detail.schedule,
            cheques,
            currency: self.currency.clone(),
            generated_at: Utc::now(),
        })
    }

    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        range: DateRange,
    ) -> Result<SaleStats, ServiceError> {
        let db = &*self.db_pool;
        let project_ids = match project_id {
            Some(id) => vec![owned_project(db, user_id, id).await?.id],
            None => owned_project_ids(db, user_id).await?,
        };
        if project_ids.is_empty() {
            return Ok(SaleStats::default());
        }

        let sales = sale::Entity::find()
            .filter(sale::Column::ProjectId.is_in(project_ids))
            .filter(range.condition(sale::Column::SaleDate))
            .all(db)
            .await?;

        let mut stats = SaleStats {
            count: sales.len() as u64,
            ..Default::default()
        };
        let mut active_ids = Vec::new();
        let mut collected = CollectedBreakdown::default();
        for sale in &sales {
            match sale.status {
                SaleStatus::EnCours => stats.by_status.en_cours += 1,
                SaleStatus::Termine => stats.by_status.termine += 1,
                SaleStatus::Annule => stats.by_status.annule += 1,
            }
            if sale.status.is_active() {
                stats.total_value += sale.total_price;
                stats.total_advance += sale.advance_total();
                collected.add(&AmountSplit::advance_of(sale));
                active_ids.push(sale.id);
            }
        }

        if !active_ids.is_empty() {
            let plans = payment_plan::Entity::find()
                .filter(payment_plan::Column::SaleId.is_in(active_ids.clone()))
                .filter(payment_plan::Column::Status.ne(PaymentPlanStatus::Annule))
                .all(db)
                .await?;
            for plan in &plans {
                collected.add(&AmountSplit {
                    total: plan.paid_amount,
                    declared: plan.declared_amount,
                    undeclared: plan.undeclared_amount,
                    cash: plan.cash_amount,
                    cheque: plan.cheque_amount,
                });
            }
        }

        let active_count = active_ids.len() as u64;
        stats.average_price = if active_count == 0 {
            Decimal::ZERO
        } else {
            round_money(stats.total_value / Decimal::from(active_count))
        };
        stats.total_value = round_money(stats.total_value);
        stats.total_advance = round_money(stats.total_advance);
        stats.collected = collected.rounded();
        Ok(stats)
    }
}

pub(crate) fn new_plan(
    sale_id: Uuid,
    installment: &InstallmentInput,
    today: NaiveDate,
) -> payment_plan::ActiveModel {
    payment_plan::ActiveModel {
        id: Set(Uuid::new_v4()),
        sale_id: Set(sale_id),
        installment_number: Set(installment.installment_number),
        description: Set(installment.description.clone()),
        due_date: Set(installment.due_date),
        planned_amount: Set(installment.planned_amount),
        paid_amount: Set(Decimal::ZERO),
        declared_amount: Set(Decimal::ZERO),
        undeclared_amount: Set(Decimal::ZERO),
        cash_amount: Set(Decimal::ZERO),
        cheque_amount: Set(Decimal::ZERO),
        payment_date: Set(None),
        payment_method: Set(None),
        status: Set(calculate_payment_plan_status(
            installment.planned_amount,
            Decimal::ZERO,
            installment.due_date,
            PaymentPlanStatus::Planifie,
            today,
        )),
        notes: Set(None),
        ..Default::default()
    }
}
