//! Database entities for the back-office schema.

pub mod check;
pub mod company_settings;
pub mod expense;
pub mod expense_payment;
pub mod payment;
pub mod payment_check;
pub mod payment_plan;
pub mod project;
pub mod sale;
pub mod user;
