// src/handlers/payments.rs

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
        rbac::{PermFolioWrite, PermPaymentOverride, PermSettingsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::payments::{CreatePaymentMethodRequest, RecordPaymentRequest, TogglePaymentMethodRequest},
};

// =============================================================================
//  1. FORMAS DE PAGAMENTO
// =============================================================================

// GET /api/payment-methods
pub async fn list_payment_methods(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let methods = app_state.payment_service
        .list_methods(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(methods)))
}

// POST /api/payment-methods
pub async fn create_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsWrite>,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let method = app_state.payment_service
        .create_method(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(method)))
}

// PATCH /api/payment-methods/{id}
pub async fn toggle_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsWrite>,
    Path(method_id): Path<Uuid>,
    Json(payload): Json<TogglePaymentMethodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let method = app_state.payment_service
        .set_method_enabled(&mut *rls_conn, tenant.0, method_id, payload.enabled)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(method)))
}

// =============================================================================
//  2. PAGAMENTOS
// =============================================================================

// POST /api/folios/{id}/payments
// 201 na primeira vez, 200 quando é o reenvio de um pagamento já gravado
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(folio_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let recorded = app_state.payment_service
        .record_payment(&mut *rls_conn, tenant.0, folio_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let status = if recorded.replayed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(recorded.payment)))
}

// POST /api/payments/{id}/verify
pub async fn verify_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state.payment_service
        .verify_payment(&mut *rls_conn, tenant.0, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payment)))
}

// POST /api/payments/{id}/mark-paid
pub async fn mark_as_paid(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPaymentOverride>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state.payment_service
        .mark_as_paid(&mut *rls_conn, tenant.0, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(user_id = %user.0.id, payment_id = %payment_id, "Baixa manual autorizada");

    Ok((StatusCode::OK, Json(payment)))
}
