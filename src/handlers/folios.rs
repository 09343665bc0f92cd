// src/handlers/folios.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermFolioRepair, PermFolioWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::folio::{AutoFixResult, PostChargeRequest},
};

// GET /api/folios/{id}
pub async fn get_folio(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(folio_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state.folio_service
        .get_folio_detail(&mut *rls_conn, tenant.0, folio_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// GET /api/folios/{id}/validation
// Divergência não é erro: volta 200 com a lista
pub async fn validate_folio(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(folio_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let validation = app_state.folio_service
        .validate_folio(&mut *rls_conn, tenant.0, folio_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !validation.is_valid {
        tracing::warn!(
            tenant_id = %tenant.0,
            folio_id = %folio_id,
            discrepancies = validation.discrepancies.len(),
            "Folio com totais divergentes"
        );
    }

    Ok((StatusCode::OK, Json(validation)))
}

// POST /api/folios/{id}/auto-fix
pub async fn auto_fix_folio(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioRepair>,
    Path(folio_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let corrected = app_state.folio_service
        .auto_fix_folio(&mut *rls_conn, tenant.0, folio_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(AutoFixResult { folio_id, corrected })))
}

// POST /api/folios/{id}/charges
pub async fn post_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(folio_id): Path<Uuid>,
    Json(payload): Json<PostChargeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let charge = app_state.payment_service
        .post_charge(&mut *rls_conn, tenant.0, folio_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(charge)))
}

// DELETE /api/folios/charges/{id}
pub async fn cancel_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(charge_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let charge = app_state.payment_service
        .cancel_charge(&mut *rls_conn, tenant.0, charge_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(charge)))
}
