// src/models/settings.rs

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{non_negative_money, percentage};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HotelSettings {
    #[serde(skip_serializing)] // O contexto (Header) já define o hotel
    pub tenant_id: Uuid,

    pub hotel_name: Option<String>,

    // Taxa de serviço em % sobre a diária/consumo (ex: 10)
    pub service_charge_rate: Decimal,

    // IVA/VAT em % sobre o subtotal (ex: 7.5)
    pub vat_rate: Decimal,

    // Horário padrão de check-out do hotel
    pub checkout_time: NaiveTime,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 120, message = "required"))]
    pub hotel_name: Option<String>,

    #[validate(custom(function = "percentage"))]
    pub service_charge_rate: Decimal,

    #[validate(custom(function = "percentage"))]
    pub vat_rate: Decimal,

    pub checkout_time: NaiveTime,
}

// Mantido aqui para reaproveitar no cálculo de breakdown
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    #[validate(custom(function = "non_negative_money"))]
    pub base_amount: Decimal,

    #[validate(custom(function = "percentage"))]
    pub service_charge_rate: Option<Decimal>,

    #[validate(custom(function = "percentage"))]
    pub vat_rate: Option<Decimal>,
}
