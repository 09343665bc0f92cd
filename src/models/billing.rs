// src/models/billing.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Resultado do cálculo de taxa de serviço + VAT.
/// Os valores são exatos; o arredondamento fica para a apresentação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub base_amount: Decimal,
    pub service_charge: Decimal,
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
}

impl TaxBreakdown {
    /// Versão com 2 casas decimais para exibir ao usuário.
    pub fn for_display(&self) -> TaxBreakdown {
        TaxBreakdown {
            base_amount: display_money(self.base_amount),
            service_charge: display_money(self.service_charge),
            subtotal: display_money(self.subtotal),
            vat: display_money(self.vat),
            total: display_money(self.total),
        }
    }
}

pub fn display_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
