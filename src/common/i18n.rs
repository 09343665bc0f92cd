// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// (chave, texto). Placeholders no formato {nome}.
const EN: &[(&str, &str)] = &[
    ("validation.failed", "One or more fields are invalid."),
    ("field.invalid", "Invalid value '{value}' for field '{field}'."),
    ("payment_method.not_found", "Payment method {id} does not exist for this hotel."),
    ("payment_method.disabled", "Payment method '{name}' is disabled and cannot be used."),
    ("payment.terminal_required", "POS payments require a terminal reference."),
    ("payment.verification_not_applicable", "Payments made with '{method}' do not need verification."),
    ("stay.invalid_dates", "Check-out date must be after the check-in date."),
    ("folio.not_found", "Folio not found."),
    ("reservation.not_found", "Reservation not found."),
    ("payment.not_found", "Payment not found."),
    ("charge.not_found", "Charge not found."),
    ("room.not_found", "Room not found."),
    ("payment.credit_mark_paid", "Credit (pay later) payments cannot be marked as paid: credit is a promise to pay, not a payment."),
    ("payment.failed", "This payment was declined and cannot be verified or marked as paid. Record a new payment instead."),
    ("folio.outstanding_balance", "The folio still has an outstanding balance of {balance}. Settle it before checking out."),
    ("folio.closed", "This folio is closed and no longer accepts charges or payments."),
    ("reservation.invalid_transition", "A reservation in status '{from}' cannot move to '{to}'."),
    ("reservation.conflict", "The room is already booked for these dates (reservation {id})."),
    ("unique.violation", "{detail}"),
    ("auth.invalid_token", "Invalid or missing authentication token."),
    ("auth.session_expired", "Your session has expired. Sign in again to continue."),
    ("tenant.access_denied", "You do not have access to this hotel."),
    ("tenant.header_missing", "The X-Tenant-ID header is required."),
    ("tenant.header_invalid", "The X-Tenant-ID header is not a valid UUID."),
    ("rbac.permission_denied", "You need the '{permission}' permission to perform this action."),
    ("db.unavailable", "The service is temporarily unavailable. Please try again."),
    ("internal", "An unexpected error occurred."),
];

const PT: &[(&str, &str)] = &[
    ("validation.failed", "Um ou mais campos são inválidos."),
    ("field.invalid", "Valor '{value}' inválido para o campo '{field}'."),
    ("payment_method.not_found", "A forma de pagamento {id} não existe neste hotel."),
    ("payment_method.disabled", "A forma de pagamento '{name}' está desativada e não pode ser usada."),
    ("payment.terminal_required", "Pagamentos em POS exigem a referência do terminal."),
    ("payment.verification_not_applicable", "Pagamentos em '{method}' não precisam de verificação."),
    ("stay.invalid_dates", "A data de check-out deve ser posterior à data de check-in."),
    ("folio.not_found", "Conta (folio) não encontrada."),
    ("reservation.not_found", "Reserva não encontrada."),
    ("payment.not_found", "Pagamento não encontrado."),
    ("charge.not_found", "Lançamento não encontrado."),
    ("room.not_found", "Quarto não encontrado."),
    ("payment.credit_mark_paid", "Pagamentos faturados (crédito) não podem ser marcados como pagos: crédito é uma promessa de pagamento, não um pagamento."),
    ("payment.failed", "Este pagamento foi recusado e não pode ser verificado nem baixado. Registre um novo pagamento."),
    ("folio.outstanding_balance", "A conta ainda tem saldo devedor de {balance}. Quite antes do check-out."),
    ("folio.closed", "Esta conta está fechada e não aceita mais lançamentos nem pagamentos."),
    ("reservation.invalid_transition", "Uma reserva com status '{from}' não pode passar para '{to}'."),
    ("reservation.conflict", "O quarto já está reservado nessas datas (reserva {id})."),
    ("unique.violation", "{detail}"),
    ("auth.invalid_token", "Token de autenticação inválido ou ausente."),
    ("auth.session_expired", "Sua sessão expirou. Entre novamente para continuar."),
    ("tenant.access_denied", "Você não tem acesso a este hotel."),
    ("tenant.header_missing", "O cabeçalho X-Tenant-ID é obrigatório."),
    ("tenant.header_invalid", "Cabeçalho X-Tenant-ID inválido (não é um UUID)."),
    ("rbac.permission_denied", "Você precisa da permissão '{permission}' para realizar esta ação."),
    ("db.unavailable", "O serviço está temporariamente indisponível. Tente novamente."),
    ("internal", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("pt", PT.iter().copied().collect());
        Self { catalogs }
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Traduz a chave, caindo para inglês e depois para a própria chave.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_have_same_keys() {
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        assert_eq!(en, pt);
    }

    #[test]
    fn test_placeholders_are_filled() {
        let store = I18nStore::new();
        let text = store.translate("pt", "folio.outstanding_balance", &[("balance", "150.00".into())]);
        assert!(text.contains("150.00"));
        assert!(!text.contains("{balance}"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "folio.not_found", &[]), "Folio not found.");
        assert_eq!(store.translate("en", "no.such.key", &[]), "no.such.key");
    }
}
