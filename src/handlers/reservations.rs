// src/handlers/reservations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
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
        rbac::{PermFolioWrite, PermSettingsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::reservations::{
        ConflictQuery, CreateReservationRequest, CreateRoomRequest, OverstayQuery,
        RescheduleReservationRequest,
    },
    services::payment_status::OverdueContext,
};

// =============================================================================
//  1. QUARTOS
// =============================================================================

// GET /api/rooms
pub async fn list_rooms(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rooms = app_state.reservation_service
        .list_rooms(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rooms)))
}

// POST /api/rooms
pub async fn create_room(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsWrite>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state.reservation_service
        .create_room(&mut *rls_conn, tenant.0, &payload.number, payload.room_type.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(room)))
}

// =============================================================================
//  2. RESERVAS
// =============================================================================

// POST /api/reservations
pub async fn create_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reservation = app_state.reservation_service
        .create_reservation(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

// PATCH /api/reservations/{id}/dates
pub async fn reschedule_reservation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(reservation_id): Path<Uuid>,
    Json(payload): Json<RescheduleReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reservation = app_state.reservation_service
        .reschedule_reservation(
            &mut *rls_conn,
            tenant.0,
            reservation_id,
            payload.check_in_date,
            payload.check_out_date,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reservation)))
}

// POST /api/reservations/{id}/check-in
pub async fn check_in(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reservation = app_state.reservation_service
        .check_in(&mut *rls_conn, tenant.0, reservation_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reservation)))
}

// POST /api/reservations/{id}/check-out
pub async fn check_out(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFolioWrite>,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reservation = app_state.reservation_service
        .check_out(&mut *rls_conn, tenant.0, reservation_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reservation)))
}

// GET /api/reservations/{id}/payment-status
pub async fn get_payment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // O relógio é lido aqui, nunca dentro da regra
    let ctx = OverdueContext {
        today: Utc::now().date_naive(),
        overdue_after_days: app_state.billing_policy.overdue_after_days,
    };

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state.folio_service
        .get_payment_status(&mut *rls_conn, tenant.0, reservation_id, &ctx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// =============================================================================
//  3. CONSULTAS OPERACIONAIS
// =============================================================================

// GET /api/reservations/conflicts?roomId=&checkIn=&checkOut=&excludeReservationId=
pub async fn check_conflict(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<ConflictQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let check = app_state.reservation_service
        .check_conflict(
            &mut *rls_conn,
            tenant.0,
            query.room_id,
            query.check_in,
            query.check_out,
            query.exclude_reservation_id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(check)))
}

// GET /api/reservations/overstays?graceHours=
pub async fn list_overstays(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(query): Query<OverstayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let policy = match query.grace_hours {
        Some(hours) => app_state.billing_policy.overstay
            .with_grace_hours(hours)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?,
        None => app_state.billing_policy.overstay,
    };

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let overstays = app_state.reservation_service
        .detect_overstays(&mut *rls_conn, tenant.0, Utc::now(), &policy, &app_state.billing_policy)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(overstays)))
}
