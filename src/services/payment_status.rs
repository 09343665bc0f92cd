// src/services/payment_status.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    folio::Folio,
    payments::{PaymentStatus, PaymentStatusSummary},
};

/// Contexto fornecido pelo chamador: o serviço não consulta o relógio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverdueContext {
    pub today: NaiveDate,
    pub overdue_after_days: i64,
}

/// Status da reserva a partir do folio (se existir).
/// Sem folio = nada faturado ainda, diferente de um folio zerado.
pub fn derive_payment_status(
    folio: Option<&Folio>,
    due_date: NaiveDate,
    ctx: &OverdueContext,
) -> PaymentStatusSummary {
    let Some(folio) = folio else {
        return PaymentStatusSummary {
            status: PaymentStatus::Unpaid,
            total_amount: Decimal::ZERO,
            total_payments: Decimal::ZERO,
            balance: Decimal::ZERO,
            is_overdue: false,
        };
    };

    let balance = folio.balance;
    let days_past_due = (ctx.today - due_date).num_days();
    let is_overdue = balance > Decimal::ZERO && days_past_due > ctx.overdue_after_days;

    let status = if is_overdue {
        PaymentStatus::Overdue
    } else if balance > Decimal::ZERO {
        if folio.total_payments > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    } else {
        PaymentStatus::Paid
    };

    PaymentStatusSummary {
        status,
        total_amount: folio.total_charges,
        total_payments: folio.total_payments,
        balance,
        is_overdue,
    }
}
