// src/services/folio_validator.rs
//
// Reconciliação do folio: recalcula os totais a partir dos lançamentos e
// pagamentos e compara com o que está gravado. Igualdade exata (Decimal).

use rust_decimal::Decimal;

use crate::models::{
    folio::{ChargeStatus, Folio, FolioCharge, FolioDiscrepancy, FolioField, FolioTotals, FolioValidation},
    payments::{PaymentRecord, PaymentRecordStatus},
};

/// Soma dos lançamentos ativos e dos pagamentos concluídos.
/// Soma sobre conjunto: a ordem dos registros não importa.
pub fn compute_totals(charges: &[FolioCharge], payments: &[PaymentRecord]) -> FolioTotals {
    let total_charges: Decimal = charges
        .iter()
        .filter(|c| c.status == ChargeStatus::Active)
        .map(|c| c.amount)
        .sum();

    let total_payments: Decimal = payments
        .iter()
        .filter(|p| p.status == PaymentRecordStatus::Completed)
        .map(|p| p.amount)
        .sum();

    FolioTotals {
        total_charges,
        total_payments,
        balance: total_charges - total_payments,
    }
}

fn check(field: FolioField, stored: Decimal, computed: Decimal, out: &mut Vec<FolioDiscrepancy>) {
    if stored != computed {
        out.push(FolioDiscrepancy { field, stored, computed, delta: computed - stored });
    }
}

pub fn reconcile(folio: &Folio, computed: &FolioTotals) -> FolioValidation {
    let mut discrepancies = Vec::new();
    check(FolioField::TotalCharges, folio.total_charges, computed.total_charges, &mut discrepancies);
    check(FolioField::TotalPayments, folio.total_payments, computed.total_payments, &mut discrepancies);
    check(FolioField::Balance, folio.balance, computed.balance, &mut discrepancies);

    FolioValidation {
        folio_id: folio.id,
        is_valid: discrepancies.is_empty(),
        discrepancies,
    }
}

/// O folio como fica depois da correção.
pub fn apply_totals(folio: &Folio, totals: &FolioTotals) -> Folio {
    Folio {
        total_charges: totals.total_charges,
        total_payments: totals.total_payments,
        balance: totals.balance,
        ..folio.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::payments::PaymentMethodType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_ignore_cancelled_and_uncompleted() {
        let f = folio(dec!(0), dec!(0), dec!(0));
        let charges = vec![
            charge(&f, dec!(250.00), ChargeStatus::Active),
            charge(&f, dec!(80.50), ChargeStatus::Active),
            charge(&f, dec!(999.99), ChargeStatus::Cancelled),
        ];
        let payments = vec![
            payment(&f, PaymentMethodType::Cash, dec!(100.00), PaymentRecordStatus::Completed),
            payment(&f, PaymentMethodType::Pos, dec!(50.00), PaymentRecordStatus::Pending),
            payment(&f, PaymentMethodType::Transfer, dec!(20.00), PaymentRecordStatus::Failed),
            payment(&f, PaymentMethodType::Credit, dec!(230.50), PaymentRecordStatus::Pending),
        ];

        let totals = compute_totals(&charges, &payments);
        assert_eq!(totals.total_charges, dec!(330.50));
        assert_eq!(totals.total_payments, dec!(100.00));
        assert_eq!(totals.balance, dec!(230.50));
    }

    #[test]
    fn test_consistent_folio_is_valid() {
        let f = folio(dec!(330.50), dec!(100.00), dec!(230.50));
        let charges = vec![
            charge(&f, dec!(250.00), ChargeStatus::Active),
            charge(&f, dec!(80.50), ChargeStatus::Active),
        ];
        let payments = vec![payment(&f, PaymentMethodType::Cash, dec!(100), PaymentRecordStatus::Completed)];

        let result = reconcile(&f, &compute_totals(&charges, &payments));
        assert!(result.is_valid);
        assert!(result.discrepancies.is_empty());
    }

    #[test]
    fn test_discrepancy_reports_field_values_and_delta() {
        // Um lançamento de 50 entrou sem atualizar o agregado
        let f = folio(dec!(200.00), dec!(0), dec!(200.00));
        let charges = vec![
            charge(&f, dec!(200.00), ChargeStatus::Active),
            charge(&f, dec!(50.00), ChargeStatus::Active),
        ];

        let result = reconcile(&f, &compute_totals(&charges, &[]));
        assert!(!result.is_valid);
        assert_eq!(
            result.discrepancies,
            vec![
                FolioDiscrepancy {
                    field: FolioField::TotalCharges,
                    stored: dec!(200.00),
                    computed: dec!(250.00),
                    delta: dec!(50.00),
                },
                FolioDiscrepancy {
                    field: FolioField::Balance,
                    stored: dec!(200.00),
                    computed: dec!(250.00),
                    delta: dec!(50.00),
                },
            ]
        );
    }

    #[test]
    fn test_balance_must_match_stored_totals() {
        // Totais certos, saldo gravado errado
        let f = folio(dec!(100), dec!(40), dec!(70));
        let charges = vec![charge(&f, dec!(100), ChargeStatus::Active)];
        let payments = vec![payment(&f, PaymentMethodType::Cash, dec!(40), PaymentRecordStatus::Completed)];

        let result = reconcile(&f, &compute_totals(&charges, &payments));
        assert_eq!(result.discrepancies.len(), 1);
        assert_eq!(result.discrepancies[0].field, FolioField::Balance);
        assert_eq!(result.discrepancies[0].delta, dec!(-10));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let f = folio(dec!(10), dec!(0), dec!(10));
        let charges = vec![charge(&f, dec!(12.34), ChargeStatus::Active)];

        let first = reconcile(&f, &compute_totals(&charges, &[]));
        let second = reconcile(&f, &compute_totals(&charges, &[]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_fix_then_validate_is_valid() {
        let f = folio(dec!(999), dec!(1), dec!(5));
        let charges = vec![
            charge(&f, dec!(25000), ChargeStatus::Active),
            charge(&f, dec!(10), ChargeStatus::Cancelled),
        ];
        let payments = vec![
            payment(&f, PaymentMethodType::Cash, dec!(10000), PaymentRecordStatus::Completed),
            payment(&f, PaymentMethodType::Digital, dec!(5000), PaymentRecordStatus::Completed),
        ];
        let totals = compute_totals(&charges, &payments);

        let fixed = apply_totals(&f, &totals);
        assert!(reconcile(&fixed, &compute_totals(&charges, &payments)).is_valid);
        assert_eq!(fixed.balance, fixed.total_charges - fixed.total_payments);
        assert_eq!(fixed.balance, dec!(10000));

        // Rodar de novo não muda nada
        assert_eq!(apply_totals(&fixed, &totals), fixed);
    }

    #[test]
    fn test_totals_are_order_independent() {
        let f = folio(dec!(0), dec!(0), dec!(0));
        let mut charges = vec![
            charge(&f, dec!(0.10), ChargeStatus::Active),
            charge(&f, dec!(0.20), ChargeStatus::Active),
            charge(&f, dec!(0.30), ChargeStatus::Active),
        ];
        let forward = compute_totals(&charges, &[]);
        charges.reverse();
        let backward = compute_totals(&charges, &[]);

        assert_eq!(forward, backward);
        assert_eq!(forward.total_charges, dec!(0.60));
    }
}
