//! Payment reconciliation arithmetic.
//!
//! Every amount received or paid is split twice: into a declared and an
//! undeclared portion, and into cash and cheque. A sale's schedule is its
//! initial advance (shown as a virtual installment 0) followed by the stored
//! payment plans, each annotated with running totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    payment::PaymentMethod,
    payment_plan::{self, PaymentPlanStatus},
    sale,
};
use crate::errors::ServiceError;

/// Rounds to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// `part / whole * 100`, rounded to 2 dp and clamped to `[0, 100]`.
/// A zero (or negative) whole yields 0.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / whole * dec!(100))
        .round_dp(2)
        .clamp(Decimal::ZERO, dec!(100))
}

/// An amount with its declared/undeclared and cash/cheque breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct AmountSplit {
    pub total: Decimal,
    pub declared: Decimal,
    pub undeclared: Decimal,
    pub cash: Decimal,
    pub cheque: Decimal,
}

impl AmountSplit {
    pub fn new(declared: Decimal, undeclared: Decimal, cash: Decimal, cheque: Decimal) -> Self {
        Self {
            total: declared + undeclared,
            declared,
            undeclared,
            cash,
            cheque,
        }
    }

    /// Fills the undeclared part from the total; the means of payment is left
    /// unspecified.
    pub fn from_declared(total: Decimal, declared: Decimal) -> Result<Self, ServiceError> {
        if declared > total {
            return Err(ServiceError::ValidationError(
                "Declared amount cannot exceed the total".to_string(),
            ));
        }
        let split = Self {
            total,
            declared,
            undeclared: total - declared,
            cash: Decimal::ZERO,
            cheque: Decimal::ZERO,
        };
        split.validate()?;
        Ok(split)
    }

    /// Cash and cheque both zero means the means of payment was not given.
    pub fn means_unspecified(&self) -> bool {
        self.cash.is_zero() && self.cheque.is_zero()
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        let parts = [
            ("total", self.total),
            ("declared", self.declared),
            ("undeclared", self.undeclared),
            ("cash", self.cash),
            ("cheque", self.cheque),
        ];
        if let Some((name, _)) = parts.iter().find(|(_, value)| value.is_sign_negative() && !value.is_zero()) {
            return Err(ServiceError::ValidationError(format!(
                "The {name} amount cannot be negative"
            )));
        }
        if round_money(self.declared + self.undeclared) != round_money(self.total) {
            return Err(ServiceError::ValidationError(format!(
                "Declared ({}) plus undeclared ({}) must equal the total ({})",
                self.declared, self.undeclared, self.total
            )));
        }
        if !self.means_unspecified() && round_money(self.cash + self.cheque) != round_money(self.total) {
            return Err(ServiceError::ValidationError(format!(
                "Cash ({}) plus cheque ({}) must equal the total ({})",
                self.cash, self.cheque, self.total
            )));
        }
        Ok(())
    }

    pub fn advance_of(sale: &sale::Model) -> Self {
        Self::new(
            sale.advance_declared,
            sale.advance_undeclared,
            sale.advance_cash,
            sale.advance_cheque,
        )
    }
}

/// Derives an installment's status from its amounts and due date.
/// A cancelled plan stays cancelled.
pub fn calculate_payment_plan_status(
    planned: Decimal,
    paid: Decimal,
    due_date: NaiveDate,
    current: PaymentPlanStatus,
    today: NaiveDate,
) -> PaymentPlanStatus {
    if current == PaymentPlanStatus::Annule {
        PaymentPlanStatus::Annule
    } else if planned > Decimal::ZERO && paid >= planned {
        PaymentPlanStatus::Paye
    } else if due_date < today {
        PaymentPlanStatus::EnRetard
    } else {
        PaymentPlanStatus::Planifie
    }
}

/// One row of a sale's schedule, real or virtual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleEntry {
    /// Absent for the virtual initial installment
    pub id: Option<Uuid>,
    pub installment_number: i32,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub planned_amount: Decimal,
    pub paid_amount: Decimal,
    pub declared_amount: Decimal,
    pub undeclared_amount: Decimal,
    pub cash_amount: Decimal,
    pub cheque_amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub status: PaymentPlanStatus,
    pub notes: Option<String>,
    pub is_virtual: bool,
    pub cumulative_paid: Decimal,
    pub remaining_after: Decimal,
}

impl ScheduleEntry {
    fn from_plan(plan: &payment_plan::Model, today: NaiveDate) -> Self {
        Self {
            id: Some(plan.id),
            installment_number: plan.installment_number,
            description: plan.description.clone(),
            due_date: plan.due_date,
            planned_amount: plan.planned_amount,
            paid_amount: plan.paid_amount,
            declared_amount: plan.declared_amount,
            undeclared_amount: plan.undeclared_amount,
            cash_amount: plan.cash_amount,
            cheque_amount: plan.cheque_amount,
            payment_date: plan.payment_date,
            payment_method: plan.payment_method,
            status: calculate_payment_plan_status(
                plan.planned_amount,
                plan.paid_amount,
                plan.due_date,
                plan.status,
                today,
            ),
            notes: plan.notes.clone(),
            is_virtual: false,
            cumulative_paid: Decimal::ZERO,
            remaining_after: Decimal::ZERO,
        }
    }

    /// Amount still expected on this row.
    pub fn outstanding(&self) -> Decimal {
        (self.planned_amount - self.paid_amount).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleTotals {
    pub total_price: Decimal,
    pub total_planned: Decimal,
    pub total_paid: Decimal,
    pub declared_paid: Decimal,
    pub undeclared_paid: Decimal,
    pub cash_paid: Decimal,
    pub cheque_paid: Decimal,
    pub remaining: Decimal,
    pub overdue_amount: Decimal,
    pub overdue_count: u64,
    /// Share of the price collected, 0 to 100
    pub progress: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentSchedule {
    pub sale_id: Uuid,
    pub entries: Vec<ScheduleEntry>,
    pub totals: ScheduleTotals,
}

/// The sale's advance as a display-only installment 0, when there is an
/// advance and no stored plan already uses number 0.
pub fn create_virtual_initial_payment_plan(
    sale: &sale::Model,
    plans: &[payment_plan::Model],
) -> Option<ScheduleEntry> {
    let advance = AmountSplit::advance_of(sale);
    if advance.total <= Decimal::ZERO || plans.iter().any(|p| p.installment_number == 0) {
        return None;
    }

    let payment_method = match (advance.cash.is_zero(), advance.cheque.is_zero()) {
        (false, true) => Some(PaymentMethod::Especes),
        (true, false) => Some(PaymentMethod::Cheque),
        (false, false) => Some(PaymentMethod::Mixte),
        (true, true) => None,
    };

    Some(ScheduleEntry {
        id: None,
        installment_number: 0,
        description: Some("Avance initiale".to_string()),
        due_date: sale.sale_date,
        planned_amount: advance.total,
        paid_amount: advance.total,
        declared_amount: advance.declared,
        undeclared_amount: advance.undeclared,
        cash_amount: advance.cash,
        cheque_amount: advance.cheque,
        payment_date: Some(sale.sale_date),
        payment_method,
        status: PaymentPlanStatus::Paye,
        notes: None,
        is_virtual: true,
        cumulative_paid: Decimal::ZERO,
        remaining_after: Decimal::ZERO,
    })
}

/// Builds the full schedule of a sale: virtual advance row, recomputed plan
/// statuses, running totals and aggregate figures. Cancelled plans are listed
/// but excluded from every total.
pub fn build_schedule(
    sale: &sale::Model,
    plans: &[payment_plan::Model],
    today: NaiveDate,
) -> PaymentSchedule {
    let mut entries: Vec<ScheduleEntry> = create_virtual_initial_payment_plan(sale, plans)
        .into_iter()
        .chain(plans.iter().map(|plan| ScheduleEntry::from_plan(plan, today)))
        .collect();
    entries.sort_by_key(|entry| entry.installment_number);

    let mut totals = ScheduleTotals {
        total_price: sale.total_price,
        ..Default::default()
    };

    let mut cumulative = Decimal::ZERO;
    for entry in entries.iter_mut() {
        if entry.status != PaymentPlanStatus::Annule {
            cumulative += entry.paid_amount;

            totals.total_planned += entry.planned_amount;
            totals.total_paid += entry.paid_amount;
            totals.declared_paid += entry.declared_amount;
            totals.undeclared_paid += entry.undeclared_amount;
            totals.cash_paid += entry.cash_amount;
            totals.cheque_paid += entry.cheque_amount;
            if entry.status == PaymentPlanStatus::EnRetard {
                totals.overdue_amount += entry.outstanding();
                totals.overdue_count += 1;
            }
        }
        entry.cumulative_paid = round_money(cumulative);
        entry.remaining_after = round_money((sale.total_price - cumulative).max(Decimal::ZERO));
    }

    totals.total_planned = round_money(totals.total_planned);
    totals.total_paid = round_money(totals.total_paid);
    totals.declared_paid = round_money(totals.declared_paid);
    totals.undeclared_paid = round_money(totals.undeclared_paid);
    totals.cash_paid = round_money(totals.cash_paid);
    totals.cheque_paid = round_money(totals.cheque_paid);
    totals.overdue_amount = round_money(totals.overdue_amount);
    totals.remaining = round_money((sale.total_price - totals.total_paid).max(Decimal::ZERO));
    totals.progress = percentage(totals.total_paid, sale.total_price);

    PaymentSchedule {
        sale_id: sale.id,
        entries,
        totals,
    }
}
