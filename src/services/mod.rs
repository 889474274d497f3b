// Pure arithmetic shared by sales, payments and expenses
pub mod reconciliation;

// Resource services
pub mod checks;
pub mod expenses;
pub mod payments;
pub mod projects;
pub mod sales;
pub mod settings;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{expense, project, sale};
use crate::errors::ServiceError;

pub use reconciliation::{AmountSplit, PaymentSchedule, ScheduleEntry, ScheduleTotals};

/// Calendar date used for status derivation and period resolution.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn ensure_positive(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub(crate) fn non_empty(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Loads a project owned by `user_id`. Someone else's project is not found.
pub(crate) async fn owned_project<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<project::Model, ServiceError> {
    project::Entity::find_by_id(project_id)
        .filter(project::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project", project_id))
}

/// Loads a sale together with its project, checking ownership through the project.
pub(crate) async fn owned_sale<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    sale_id: Uuid,
) -> Result<(sale::Model, project::Model), ServiceError> {
    match sale::Entity::find_by_id(sale_id)
        .find_also_related(project::Entity)
        .one(conn)
        .await?
    {
        Some((sale, Some(project))) if project.user_id == user_id => Ok((sale, project)),
        _ => Err(ServiceError::not_found("Sale", sale_id)),
    }
}

pub(crate) async fn owned_expense<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    expense_id: Uuid,
) -> Result<(expense::Model, project::Model), ServiceError> {
    match expense::Entity::find_by_id(expense_id)
        .find_also_related(project::Entity)
        .one(conn)
        .await?
    {
        Some((expense, Some(project))) if project.user_id == user_id => Ok((expense, project)),
        _ => Err(ServiceError::not_found("Expense", expense_id)),
    }
}

/// Ids of every project the user owns.
pub(crate) async fn owned_project_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Vec<Uuid>, ServiceError> {
    Ok(project::Entity::find()
        .select_only()
        .column(project::Column::Id)
        .filter(project::Column::UserId.eq(user_id))
        .into_tuple::<Uuid>()
        .all(conn)
        .await?)
}

/// Ids of every sale held by the user's projects, optionally narrowed to one project.
pub(crate) async fn owned_sale_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    project_id: Option<Uuid>,
) -> Result<Vec<Uuid>, ServiceError> {
    let project_ids = match project_id {
        Some(id) => vec![owned_project(conn, user_id, id).await?.id],
        None => owned_project_ids(conn, user_id).await?,
    };
    if project_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(sale::Entity::find()
        .select_only()
        .column(sale::Column::Id)
        .filter(sale::Column::ProjectId.is_in(project_ids))
        .into_tuple::<Uuid>()
        .all(conn)
        .await?)
}

/// Number of pages for `total` rows at `limit` per page.
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_guards() {
        assert!(ensure_positive("amount", dec!(0.01)).is_ok());
        assert_matches!(ensure_positive("amount", dec!(0)), Err(ServiceError::ValidationError(_)));
        assert!(ensure_non_negative("surface", dec!(0)).is_ok());
        assert_matches!(
            ensure_non_negative("surface", dec!(-1)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("name", "  Résidence Atlas ").unwrap(), "Résidence Atlas");
        assert!(non_empty("name", "   ").is_err());
    }

    #[test]
    fn page_count() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
