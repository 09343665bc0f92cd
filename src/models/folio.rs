// src/models/folio.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{common::validation::positive_money, models::payments::PaymentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "folio_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FolioStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "charge_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Active,
    Cancelled,
}

// A "conta corrente" da hospedagem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folio {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub reservation_id: Uuid,
    pub status: FolioStatus,
    pub total_charges: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal, // Redundante: precisa bater com charges - payments
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// Lançamento (diária, frigobar, restaurante...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FolioCharge {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub folio_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub status: ChargeStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FolioField {
    TotalCharges,
    TotalPayments,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolioDiscrepancy {
    pub field: FolioField,
    pub stored: Decimal,
    pub computed: Decimal,
    pub delta: Decimal, // computed - stored
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolioValidation {
    pub folio_id: Uuid,
    pub is_valid: bool,
    pub discrepancies: Vec<FolioDiscrepancy>,
}

/// Totais recalculados a partir dos lançamentos e pagamentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolioTotals {
    pub total_charges: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolioDetail {
    #[serde(flatten)]
    pub header: Folio,
    pub charges: Vec<FolioCharge>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostChargeRequest {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub description: String,
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFixResult {
    pub folio_id: Uuid,
    pub corrected: bool,
}
