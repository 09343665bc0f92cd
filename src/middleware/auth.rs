// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::StaffSession,
    services::auth::SessionCheck,
};

// Extrator para obter o funcionário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub StaffSession);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(headers).ok_or(AppError::InvalidToken)?;

    match app_state.auth_service.check_token(token) {
        SessionCheck::Valid(session) => Ok(AuthenticatedUser(session)),
        SessionCheck::Expired => Err(AppError::SessionExpired),
        SessionCheck::Invalid => Err(AppError::InvalidToken),
    }
}

// Token válido + X-Tenant-ID de um hotel ao qual o funcionário pertence
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).map_err(to_api)?;
    let tenant = TenantContext::from_headers(request.headers()).map_err(to_api)?;

    if !user.0.can_access_tenant(tenant.0) {
        tracing::warn!(user_id = %user.0.id, tenant_id = %tenant.0, "Acesso negado ao hotel");
        return Err(to_api(AppError::TenantAccessDenied));
    }

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts, &app_state.i18n_store);
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
