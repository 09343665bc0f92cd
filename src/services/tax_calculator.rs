// src/services/tax_calculator.rs

use rust_decimal::Decimal;

use crate::{common::error::AppError, models::billing::TaxBreakdown};

/// Taxa de serviço sobre a base; VAT sobre o subtotal (base + serviço).
/// A ordem importa: o VAT incide também sobre a taxa de serviço.
pub fn compute_breakdown(
    base_amount: Decimal,
    service_charge_rate_pct: Decimal,
    vat_rate_pct: Decimal,
) -> Result<TaxBreakdown, AppError> {
    if base_amount < Decimal::ZERO {
        return Err(AppError::InvalidField { field: "baseAmount", value: base_amount.to_string() });
    }
    if service_charge_rate_pct < Decimal::ZERO {
        return Err(AppError::InvalidField {
            field: "serviceChargeRate",
            value: service_charge_rate_pct.to_string(),
        });
    }
    if vat_rate_pct < Decimal::ZERO {
        return Err(AppError::InvalidField { field: "vatRate", value: vat_rate_pct.to_string() });
    }

    // Estouro do Decimal é culpa da base informada
    let overflow = || AppError::InvalidField { field: "baseAmount", value: base_amount.to_string() };

    let service_charge = percent_of(base_amount, service_charge_rate_pct).ok_or_else(overflow)?;
    let subtotal = base_amount.checked_add(service_charge).ok_or_else(overflow)?;
    let vat = percent_of(subtotal, vat_rate_pct).ok_or_else(overflow)?;
    let total = subtotal.checked_add(vat).ok_or_else(overflow)?;

    Ok(TaxBreakdown { base_amount, service_charge, subtotal, vat, total })
}

/// `value * pct / 100`, `None` se estourar.
pub(crate) fn percent_of(value: Decimal, pct: Decimal) -> Option<Decimal> {
    value.checked_mul(pct)?.checked_div(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_breakdown() {
        let b = compute_breakdown(dec!(10000), dec!(10), dec!(7.5)).unwrap();

        assert_eq!(b.service_charge, dec!(1000.00));
        assert_eq!(b.subtotal, dec!(11000.00));
        assert_eq!(b.vat, dec!(825.00));
        assert_eq!(b.total, dec!(11825.00));
    }

    #[test]
    fn test_vat_is_charged_on_subtotal() {
        let b = compute_breakdown(dec!(100), dec!(10), dec!(10)).unwrap();
        // 10% sobre 110, não sobre 100
        assert_eq!(b.vat, dec!(11));
        assert_eq!(b.total, dec!(121));
    }

    #[test]
    fn test_no_float_drift() {
        let b = compute_breakdown(dec!(0.10), dec!(0), dec!(20)).unwrap();
        assert_eq!(b.total, dec!(0.12));
        assert_eq!(b.for_display().total.to_string(), "0.12");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let b = compute_breakdown(dec!(33.33), dec!(10), dec!(7.5)).unwrap();
        // 33.33 * 1.1 = 36.663 ; * 0.075 = 2.749725
        assert_eq!(b.vat, dec!(2.749725));
        let shown = b.for_display();
        assert_eq!(shown.vat.to_string(), "2.75");
        assert_eq!(shown.base_amount.to_string(), "33.33");
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        assert!(matches!(
            compute_breakdown(dec!(-1), dec!(10), dec!(7.5)),
            Err(AppError::InvalidField { field: "baseAmount", .. })
        ));
        assert!(compute_breakdown(dec!(1), dec!(-10), dec!(7.5)).is_err());
        assert!(compute_breakdown(dec!(1), dec!(10), dec!(-7.5)).is_err());
    }

    #[test]
    fn test_overflowing_base_is_an_invalid_field() {
        assert!(matches!(
            compute_breakdown(Decimal::MAX, dec!(100), dec!(7.5)),
            Err(AppError::InvalidField { field: "baseAmount", .. })
        ));
        let untaxed = compute_breakdown(Decimal::MAX, dec!(0), dec!(0)).unwrap();
        assert_eq!(untaxed.total, Decimal::MAX);
    }
}
