use crate::{
    db::DbPool,
    entities::company_settings,
    errors::ServiceError,
    services::non_empty,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanySettingsRequest {
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// Identifiant Commun de l'Entreprise
    pub ice: Option<String>,
    /// Registre de commerce
    pub rc: Option<String>,
    /// Identifiant fiscal
    pub if_number: Option<String>,
    pub patente: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    pub footer_text: Option<String>,
}

/// The stored settings, or an unsaved blank row when there are none yet.
pub(crate) async fn settings_or_default<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<company_settings::Model, ServiceError> {
    let stored = company_settings::Entity::find()
        .filter(company_settings::Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(stored.unwrap_or_else(|| company_settings::Model {
        id: Uuid::nil(),
        user_id,
        company_name: String::new(),
        address: None,
        phone: None,
        email: None,
        ice: None,
        rc: None,
        if_number: None,
        patente: None,
        logo_url: None,
        footer_text: None,
        updated_at: Utc::now(),
    }))
}

/// Service for the letterhead printed on statements
#[derive(Clone)]
pub struct SettingsService {
    db_pool: Arc<DbPool>,
}

impl SettingsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn get_company(&self, user_id: Uuid) -> Result<company_settings::Model, ServiceError> {
        settings_or_default(&*self.db_pool, user_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn upsert_company(
        &self,
        user_id: Uuid,
        request: UpdateCompanySettingsRequest,
    ) -> Result<company_settings::Model, ServiceError> {
        request.validate()?;
        let company_name = non_empty("company_name", &request.company_name)?;
        let db = &*self.db_pool;

        let existing = company_settings::Entity::find()
            .filter(company_settings::Column::UserId.eq(user_id))
            .one(db)
            .await?;

        let is_new = existing.is_none();
        let mut active: company_settings::ActiveModel = match existing {
            Some(model) => model.into(),
            None => company_settings::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                ..Default::default()
            },
        };
        active.company_name = Set(company_name);
        active.address = Set(request.address);
        active.phone = Set(request.phone);
        active.email = Set(request.email);
        active.ice = Set(request.ice);
        active.rc = Set(request.rc);
        active.if_number = Set(request.if_number);
        active.patente = Set(request.patente);
        active.logo_url = Set(request.logo_url);
        active.footer_text = Set(request.footer_text);

        let model = if is_new {
            active.insert(db).await?
        } else {
            active.update(db).await?
        };
        info!(user_id = %user_id, "company settings saved");
        Ok(model)
    }
}
