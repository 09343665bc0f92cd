// src/services/payment_rules.rs
//
// Regras puras de pagamento. Sem banco, sem relógio.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::{error::AppError, validation::STORAGE_SCALE},
    models::payments::{PaymentMethod, PaymentMethodType, PaymentRecordStatus, PaymentStatus},
    services::tax_calculator::percent_of,
};

/// Status de um pagamento a partir da forma e da verificação.
///
/// - dinheiro é pago na hora;
/// - POS, digital e transferência dependem da conciliação com o processador;
/// - crédito (faturado) é promessa de pagamento, nunca prova.
pub fn determine_status(method_type: PaymentMethodType, is_verified: bool) -> PaymentStatus {
    match method_type {
        PaymentMethodType::Cash => PaymentStatus::Paid,
        PaymentMethodType::Pos | PaymentMethodType::Digital | PaymentMethodType::Transfer => {
            if is_verified {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            }
        }
        PaymentMethodType::Credit => PaymentStatus::Unpaid,
    }
}

/// Mesma regra para valores crus (ex: vindos de importação). Desconhecido nunca vira pago.
pub fn determine_status_raw(method_type: &str, is_verified: bool) -> PaymentStatus {
    match method_type.parse::<PaymentMethodType>() {
        Ok(method) => determine_status(method, is_verified),
        Err(_) => PaymentStatus::Pending,
    }
}

pub fn can_mark_as_paid(method_type: PaymentMethodType) -> bool {
    method_type != PaymentMethodType::Credit
}

pub fn requires_verification(method_type: PaymentMethodType) -> bool {
    matches!(
        method_type,
        PaymentMethodType::Pos | PaymentMethodType::Digital | PaymentMethodType::Transfer
    )
}

pub fn requires_terminal(method_type: PaymentMethodType) -> bool {
    method_type == PaymentMethodType::Pos
}

/// Só registros `completed` entram no total pago do folio.
pub fn record_status_on_creation(method_type: PaymentMethodType, is_verified: bool) -> PaymentRecordStatus {
    match determine_status(method_type, is_verified) {
        PaymentStatus::Paid => PaymentRecordStatus::Completed,
        _ => PaymentRecordStatus::Pending,
    }
}

/// Tarifa cobrada pela forma de pagamento: percentual + fixo, na escala da coluna.
pub fn compute_fee(method: &PaymentMethod, amount: Decimal) -> Result<Decimal, AppError> {
    percent_of(amount, method.fee_percentage)
        .and_then(|fee| fee.checked_add(method.fee_fixed))
        .map(|fee| fee.round_dp_with_strategy(STORAGE_SCALE, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| AppError::InvalidField { field: "amount", value: amount.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_credit_is_always_unpaid() {
        for verified in [true, false] {
            assert_eq!(determine_status(PaymentMethodType::Credit, verified), PaymentStatus::Unpaid);
        }
    }

    #[test]
    fn test_cash_is_always_paid() {
        for verified in [true, false] {
            assert_eq!(determine_status(PaymentMethodType::Cash, verified), PaymentStatus::Paid);
        }
    }

    #[test]
    fn test_processor_methods_depend_on_verification() {
        for method in [PaymentMethodType::Pos, PaymentMethodType::Digital, PaymentMethodType::Transfer] {
            assert_eq!(determine_status(method, true), PaymentStatus::Paid);
            assert_eq!(determine_status(method, false), PaymentStatus::Pending);
        }
    }

    #[test]
    fn test_unknown_raw_method_is_pending() {
        assert_eq!(determine_status_raw("voucher", true), PaymentStatus::Pending);
        assert_eq!(determine_status_raw("", false), PaymentStatus::Pending);
        assert_eq!(determine_status_raw("CASH", false), PaymentStatus::Paid);
        assert_eq!(determine_status_raw("credit", true), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_can_mark_as_paid() {
        for method in PaymentMethodType::ALL {
            assert_eq!(can_mark_as_paid(method), method != PaymentMethodType::Credit);
        }
    }

    #[test]
    fn test_verification_and_terminal_requirements() {
        assert!(!requires_verification(PaymentMethodType::Cash));
        assert!(!requires_verification(PaymentMethodType::Credit));
        assert!(requires_verification(PaymentMethodType::Transfer));

        let terminal: Vec<_> = PaymentMethodType::ALL.into_iter().filter(|m| requires_terminal(*m)).collect();
        assert_eq!(terminal, vec![PaymentMethodType::Pos]);
    }

    #[test]
    fn test_only_paid_records_are_completed() {
        assert_eq!(record_status_on_creation(PaymentMethodType::Cash, false), PaymentRecordStatus::Completed);
        assert_eq!(record_status_on_creation(PaymentMethodType::Pos, true), PaymentRecordStatus::Completed);
        assert_eq!(record_status_on_creation(PaymentMethodType::Digital, false), PaymentRecordStatus::Pending);
        assert_eq!(record_status_on_creation(PaymentMethodType::Credit, true), PaymentRecordStatus::Pending);
    }

    #[test]
    fn test_fee_is_percentage_plus_fixed() {
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Maquininha".into(),
            method_type: PaymentMethodType::Pos,
            enabled: true,
            fee_percentage: dec!(1.5),
            fee_fixed: dec!(0.30),
            created_at: Utc::now(),
        };
        assert_eq!(compute_fee(&method, dec!(200.00)).unwrap(), dec!(3.30));
        // 1.5% de 10.0001 = 0.1500015 -> 0.1500 + 0.30
        assert_eq!(compute_fee(&method, dec!(10.0001)).unwrap(), dec!(0.4500));
        assert!(matches!(
            compute_fee(&method, Decimal::MAX),
            Err(AppError::InvalidField { field: "amount", .. })
        ));
    }
}
