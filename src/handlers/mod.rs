pub mod auth;
pub mod checks;
pub mod common;
pub mod expenses;
pub mod payments;
pub mod projects;
pub mod sales;
pub mod settings;

use crate::{
    auth::AuthService,
    db::DbPool,
    services::{
        checks::CheckService, expenses::ExpenseService, payments::PaymentService,
        projects::ProjectService, sales::SaleService, settings::SettingsService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
    pub sales: Arc<SaleService>,
    pub payments: Arc<PaymentService>,
    pub expenses: Arc<ExpenseService>,
    pub checks: Arc<CheckService>,
    pub settings: Arc<SettingsService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, auth_service: Arc<AuthService>, currency: String) -> Self {
        Self {
            auth: auth_service,
            projects: Arc::new(ProjectService::new(db_pool.clone())),
            sales: Arc::new(SaleService::new(db_pool.clone(), currency)),
            payments: Arc::new(PaymentService::new(db_pool.clone())),
            expenses: Arc::new(ExpenseService::new(db_pool.clone())),
            checks: Arc::new(CheckService::new(db_pool.clone())),
            settings: Arc::new(SettingsService::new(db_pool)),
        }
    }
}
