use crate::{
    common::{DateRange, PeriodQuery},
    errors::ServiceError,
    services::{today, total_pages},
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination parameters for list operations
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, clamped to the configured maximum
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Resolves `(page, limit)` against the configured page sizes.
    pub fn resolve(&self, state: &AppState) -> (u64, u64) {
        (self.page.unwrap_or(1).max(1), state.config.page_size(self.limit))
    }
}

/// Builds the `period` date range shared by list and stats endpoints.
pub fn resolve_period(
    period: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<DateRange, ServiceError> {
    PeriodQuery {
        period,
        start_date,
        end_date,
    }
    .resolve(today())
}

pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}

/// 201 with the standard envelope
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Body returned by every delete endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn yes() -> Json<ApiResponse<Deleted>> {
        Json(ApiResponse::success(Deleted { deleted: true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_rounds_total_pages_up() {
        let page = paginated(vec![1, 2, 3], 21, 2, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert!(matches!(
            resolve_period(Some("fortnight".into()), None, None),
            Err(ServiceError::ValidationError(_))
        ));
        assert!(resolve_period(None, None, None).unwrap().is_unbounded());
    }
}
