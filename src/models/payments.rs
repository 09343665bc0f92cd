// src/models/payments.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{non_negative_money, percentage, positive_money};

// --- Enums (Mapeando o Postgres) ---

/// Forma de pagamento configurada pelo hotel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Cash,
    Pos,
    Digital,
    Transfer,
    Credit, // Faturado / pagar depois
}

impl PaymentMethodType {
    pub const ALL: [PaymentMethodType; 5] = [
        PaymentMethodType::Cash,
        PaymentMethodType::Pos,
        PaymentMethodType::Digital,
        PaymentMethodType::Transfer,
        PaymentMethodType::Credit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Cash => "cash",
            PaymentMethodType::Pos => "pos",
            PaymentMethodType::Digital => "digital",
            PaymentMethodType::Transfer => "transfer",
            PaymentMethodType::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethodType(pub String);

impl FromStr for PaymentMethodType {
    type Err = UnknownPaymentMethodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethodType::Cash),
            "pos" => Ok(PaymentMethodType::Pos),
            "digital" => Ok(PaymentMethodType::Digital),
            "transfer" => Ok(PaymentMethodType::Transfer),
            "credit" => Ok(PaymentMethodType::Credit),
            other => Err(UnknownPaymentMethodType(other.to_string())),
        }
    }
}

/// Estado de um registro de pagamento no banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_record_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
    Failed,
}

/// Status derivado. Nunca é gravado nem aceito do cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
    Pending,
    Overdue,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub name: String,
    pub method_type: PaymentMethodType,
    pub enabled: bool,
    pub fee_percentage: Decimal,
    pub fee_fixed: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub folio_id: Uuid,
    pub payment_method_id: Uuid,
    pub method_type: PaymentMethodType,
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub is_verified: bool,
    pub status: PaymentRecordStatus,
    pub terminal_reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Dados validados para inserir um pagamento.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub folio_id: Uuid,
    pub payment_method_id: Uuid,
    pub method_type: PaymentMethodType,
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub is_verified: bool,
    pub status: PaymentRecordStatus,
    pub terminal_reference: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Resposta do Payment Status Manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusSummary {
    pub status: PaymentStatus,
    pub total_amount: Decimal,
    pub total_payments: Decimal,
    pub balance: Decimal,
    pub is_overdue: bool,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodRequest {
    #[validate(length(min = 1, max = 80, message = "required"))]
    pub name: String,
    pub method_type: PaymentMethodType,
    #[validate(custom(function = "percentage"))]
    #[serde(default)]
    pub fee_percentage: Decimal,
    #[validate(custom(function = "non_negative_money"))]
    #[serde(default)]
    pub fee_fixed: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TogglePaymentMethodRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub payment_method_id: Uuid,
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    // Conciliação imediata (ex: maquininha integrada)
    #[serde(default)]
    pub is_verified: bool,
    #[validate(length(min = 1, max = 64))]
    pub terminal_reference: Option<String>,
    // Reenvio de fila offline: mesma chave devolve o registro original
    #[validate(length(min = 8, max = 128))]
    pub idempotency_key: Option<String>,
}
