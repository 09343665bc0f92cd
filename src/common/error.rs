// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::{payments::PaymentMethodType, reservations::ReservationStatus},
};

// Nosso tipo de erro de domínio. Os handlers o convertem em ApiError (já traduzido).
#[derive(Debug, Error)]
pub enum AppError {
    // --- Validação (nada foi alterado no banco) ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Valor inválido para {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Forma de pagamento não encontrada: {0}")]
    PaymentMethodNotFound(Uuid),

    #[error("Forma de pagamento desativada: {0}")]
    PaymentMethodDisabled(String),

    #[error("Pagamento POS sem referência de terminal")]
    TerminalReferenceRequired,

    #[error("Verificação não se aplica a {0}")]
    VerificationNotApplicable(PaymentMethodType),

    #[error("Datas de estadia inválidas")]
    InvalidStayDates,

    // --- Não encontrado ---
    #[error("Folio não encontrado")]
    FolioNotFound,

    #[error("Reserva não encontrada")]
    ReservationNotFound,

    #[error("Pagamento não encontrado")]
    PaymentNotFound,

    #[error("Lançamento não encontrado")]
    ChargeNotFound,

    #[error("Quarto não encontrado")]
    RoomNotFound,

    // --- Regras de negócio ---
    #[error("Pagamento faturado não pode ser marcado como pago")]
    CreditCannotBeMarkedPaid,

    #[error("Pagamento recusado não pode ser confirmado")]
    PaymentFailed,

    #[error("Saldo devedor em aberto: {balance}")]
    OutstandingBalance { balance: Decimal },

    #[error("Folio fechado")]
    FolioClosed,

    #[error("Transição inválida de {from:?} para {to:?}")]
    InvalidStatusTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    // --- Conflitos ---
    #[error("Conflito com a reserva {0}")]
    ReservationConflict(Uuid),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // --- Autenticação / Autorização ---
    #[error("Token inválido")]
    InvalidToken,

    #[error("Sessão expirada")]
    SessionExpired,

    #[error("Cabeçalho X-Tenant-ID ausente")]
    TenantHeaderMissing,

    #[error("Cabeçalho X-Tenant-ID inválido")]
    TenantHeaderInvalid,

    #[error("Acesso negado ao tenant")]
    TenantAccessDenied,

    #[error("Permissão ausente: {0}")]
    PermissionDenied(&'static str),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

/// Erro pronto para a resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// (status, chave de tradução, argumentos)
    fn describe(&self) -> (StatusCode, &'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation.failed", vec![]),
            AppError::InvalidField { field, value } => (
                StatusCode::BAD_REQUEST,
                "field.invalid",
                vec![("field", field.to_string()), ("value", value.clone())],
            ),
            AppError::PaymentMethodNotFound(id) => (
                StatusCode::BAD_REQUEST,
                "payment_method.not_found",
                vec![("id", id.to_string())],
            ),
            AppError::PaymentMethodDisabled(name) => (
                StatusCode::BAD_REQUEST,
                "payment_method.disabled",
                vec![("name", name.clone())],
            ),
            AppError::TerminalReferenceRequired => {
                (StatusCode::BAD_REQUEST, "payment.terminal_required", vec![])
            }
            AppError::VerificationNotApplicable(method) => (
                StatusCode::BAD_REQUEST,
                "payment.verification_not_applicable",
                vec![("method", method.to_string())],
            ),
            AppError::InvalidStayDates => (StatusCode::BAD_REQUEST, "stay.invalid_dates", vec![]),

            AppError::FolioNotFound => (StatusCode::NOT_FOUND, "folio.not_found", vec![]),
            AppError::ReservationNotFound => (StatusCode::NOT_FOUND, "reservation.not_found", vec![]),
            AppError::PaymentNotFound => (StatusCode::NOT_FOUND, "payment.not_found", vec![]),
            AppError::ChargeNotFound => (StatusCode::NOT_FOUND, "charge.not_found", vec![]),
            AppError::RoomNotFound => (StatusCode::NOT_FOUND, "room.not_found", vec![]),

            AppError::CreditCannotBeMarkedPaid => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "payment.credit_mark_paid",
                vec![],
            ),
            AppError::PaymentFailed => (StatusCode::UNPROCESSABLE_ENTITY, "payment.failed", vec![]),
            AppError::OutstandingBalance { balance } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "folio.outstanding_balance",
                vec![("balance", balance.to_string())],
            ),
            AppError::FolioClosed => (StatusCode::UNPROCESSABLE_ENTITY, "folio.closed", vec![]),
            AppError::InvalidStatusTransition { from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "reservation.invalid_transition",
                vec![("from", status_label(*from)), ("to", status_label(*to))],
            ),

            AppError::ReservationConflict(id) => (
                StatusCode::CONFLICT,
                "reservation.conflict",
                vec![("id", id.to_string())],
            ),
            AppError::UniqueConstraintViolation(detail) => (
                StatusCode::CONFLICT,
                "unique.violation",
                vec![("detail", detail.clone())],
            ),

            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "auth.invalid_token", vec![]),
            AppError::SessionExpired => (StatusCode::UNAUTHORIZED, "auth.session_expired", vec![]),
            AppError::TenantHeaderMissing => (StatusCode::BAD_REQUEST, "tenant.header_missing", vec![]),
            AppError::TenantHeaderInvalid => (StatusCode::BAD_REQUEST, "tenant.header_invalid", vec![]),
            AppError::TenantAccessDenied => (StatusCode::FORBIDDEN, "tenant.access_denied", vec![]),
            AppError::PermissionDenied(permission) => (
                StatusCode::FORBIDDEN,
                "rbac.permission_denied",
                vec![("permission", permission.to_string())],
            ),

            // Falha de acesso a dados: mensagem genérica, com possibilidade de retry
            AppError::DatabaseError(_) => (StatusCode::SERVICE_UNAVAILABLE, "db.unavailable", vec![]),
            AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", vec![]),
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n_store: &I18nStore) -> ApiError {
        let (status, key, args) = self.describe();

        if status.is_server_error() {
            // O detalhe fica só no log, nunca na resposta
            tracing::error!("Erro Interno do Servidor: {}", self);
        } else if status == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::warn!("Regra de negócio violada: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::ReservationConflict(id) => Some(json!({ "conflictingReservationId": id })),
            AppError::OutstandingBalance { balance } => Some(json!({ "balance": balance })),
            _ => None,
        };

        ApiError {
            status,
            error: i18n_store.translate(&locale.0, key, &args),
            details,
        }
    }
}

fn status_label(status: ReservationStatus) -> String {
    match status {
        ReservationStatus::Confirmed => "confirmed",
        ReservationStatus::CheckedIn => "checked_in",
        ReservationStatus::CheckedOut => "checked_out",
    }
    .to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn english() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn test_business_rule_is_distinct_from_validation() {
        let store = I18nStore::new();
        let rule = AppError::CreditCannotBeMarkedPaid.to_api_error(&english(), &store);
        let validation = AppError::PaymentMethodDisabled("Card".into()).to_api_error(&english(), &store);

        assert_eq!(rule.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert!(rule.error.contains("Credit"));
        assert!(validation.error.contains("'Card'"));
    }

    #[test]
    fn test_database_errors_hide_details() {
        let store = I18nStore::new();
        let api = AppError::DatabaseError(sqlx::Error::PoolTimedOut).to_api_error(&english(), &store);

        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(api.error.contains("try again"));
        assert!(api.details.is_none());
    }

    #[test]
    fn test_outstanding_balance_message_is_localized() {
        let store = I18nStore::new();
        let err = AppError::OutstandingBalance { balance: dec!(150.00) };
        let api = err.to_api_error(&Locale("pt".into()), &store);

        assert!(api.error.contains("150.00"));
        assert!(api.error.contains("saldo devedor"));
        assert_eq!(api.details, Some(json!({ "balance": "150.00" })));
    }
}
