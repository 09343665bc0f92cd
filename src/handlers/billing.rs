// src/handlers/billing.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::settings::BreakdownRequest,
    services::tax_calculator,
};

// POST /api/billing/breakdown
// Taxas omitidas vêm da configuração do hotel
pub async fn compute_breakdown(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<BreakdownRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (service_charge_rate, vat_rate) = match (payload.service_charge_rate, payload.vat_rate) {
        (Some(sc), Some(vat)) => (sc, vat),
        (sc, vat) => {
            let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
                .await
                .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

            let settings = app_state.settings_repo
                .get_settings(&mut *rls_conn, tenant.0, &app_state.billing_policy)
                .await
                .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

            (
                sc.unwrap_or(settings.service_charge_rate),
                vat.unwrap_or(settings.vat_rate),
            )
        }
    };

    let breakdown = tax_calculator::compute_breakdown(payload.base_amount, service_charge_rate, vat_rate)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Arredondamento só na apresentação
    Ok((StatusCode::OK, Json(breakdown.for_display())))
}
