// src/middleware/i18n.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::config::AppState;

// Idioma negociado a partir do Accept-Language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    /// Primeiro idioma do cabeçalho que o catálogo conhece ("pt-BR" -> "pt").
    pub fn negotiate(accept_language: Option<&str>, store: &I18nStore) -> Self {
        let lang = accept_language
            .map(accept_language::parse)
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.split('-').next().unwrap_or_default().to_ascii_lowercase())
            .find(|primary| store.supports(primary))
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }

    pub fn from_parts(parts: &Parts, store: &I18nStore) -> Self {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());
        Self::negotiate(header_value, store)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(Locale::from_parts(parts, &app_state.i18n_store))
    }
}
