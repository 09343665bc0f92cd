// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// O hotel que o funcionário quer acessar nesta requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    /// Lê e valida o cabeçalho X-Tenant-ID.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(TENANT_ID_HEADER)
            .ok_or(AppError::TenantHeaderMissing)?;

        let value_str = value.to_str().map_err(|_| AppError::TenantHeaderInvalid)?;
        let tenant_id = Uuid::parse_str(value_str.trim()).map_err(|_| AppError::TenantHeaderInvalid)?;

        Ok(TenantContext(tenant_id))
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // O tenant_guard já validou o acesso e deixou o contexto nas extensions
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(*ctx);
        }

        let app_state = AppState::from_ref(state);
        TenantContext::from_headers(&parts.headers).map_err(|e| {
            e.to_api_error(&Locale::from_parts(parts, &app_state.i18n_store), &app_state.i18n_store)
        })
    }
}
