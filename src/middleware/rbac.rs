// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::StaffRole,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
    fn min_role() -> StaffRole;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

pub fn role_allows<T: PermissionDef>(role: StaffRole) -> bool {
    role >= T::min_role()
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts, &app_state.i18n_store);

        // A. Extrai Usuário (colocado pelo tenant_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Compara o papel com o mínimo exigido
        if !role_allows::<T>(user.0.role) {
            tracing::warn!(user_id = %user.0.id, permission = T::slug(), "Permissão negada");
            return Err(AppError::PermissionDenied(T::slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermFolioWrite;
impl PermissionDef for PermFolioWrite {
    fn slug() -> &'static str { "folio:write" }
    fn min_role() -> StaffRole { StaffRole::Staff }
}

pub struct PermPaymentOverride;
impl PermissionDef for PermPaymentOverride {
    fn slug() -> &'static str { "payments:override" }
    fn min_role() -> StaffRole { StaffRole::Manager }
}

pub struct PermFolioRepair;
impl PermissionDef for PermFolioRepair {
    fn slug() -> &'static str { "folio:repair" }
    fn min_role() -> StaffRole { StaffRole::Manager }
}

pub struct PermSettingsWrite;
impl PermissionDef for PermSettingsWrite {
    fn slug() -> &'static str { "settings:write" }
    fn min_role() -> StaffRole { StaffRole::Admin }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(role_allows::<PermFolioWrite>(StaffRole::Staff));
        assert!(!role_allows::<PermPaymentOverride>(StaffRole::Staff));
        assert!(role_allows::<PermPaymentOverride>(StaffRole::Manager));
        assert!(!role_allows::<PermSettingsWrite>(StaffRole::Manager));
        assert!(role_allows::<PermSettingsWrite>(StaffRole::SuperAdmin));
    }
}
