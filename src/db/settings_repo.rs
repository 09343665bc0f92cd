// src/db/settings_repo.rs

use chrono::NaiveTime;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::BillingPolicy,
    models::settings::{HotelSettings, UpdateSettingsRequest},
};

// Sem estado: cada método recebe o executor (pool, conexão RLS ou transação)
#[derive(Clone, Default)]
pub struct SettingsRepository;

/// Check-out padrão quando o hotel ainda não configurou o seu.
pub fn default_checkout_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Hotel sem linha em `hotel_settings` recebe as taxas padrão da implantação.
    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        defaults: &BillingPolicy,
    ) -> Result<HotelSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, HotelSettings>(
            r#"
            SELECT tenant_id, hotel_name, service_charge_rate, vat_rate, checkout_time, updated_at
            FROM hotel_settings
            WHERE tenant_id = $1
            "#,
        )
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?;

        Ok(settings.unwrap_or_else(|| HotelSettings {
            tenant_id,
            hotel_name: None,
            service_charge_rate: defaults.default_service_charge_rate,
            vat_rate: defaults.default_vat_rate,
            checkout_time: default_checkout_time(),
            updated_at: None,
        }))
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<HotelSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update)
        let settings = sqlx::query_as::<_, HotelSettings>(
            r#"
            INSERT INTO hotel_settings (tenant_id, hotel_name, service_charge_rate, vat_rate, checkout_time)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                hotel_name = EXCLUDED.hotel_name,
                service_charge_rate = EXCLUDED.service_charge_rate,
                vat_rate = EXCLUDED.vat_rate,
                checkout_time = EXCLUDED.checkout_time,
                updated_at = NOW()
            RETURNING tenant_id, hotel_name, service_charge_rate, vat_rate, checkout_time, updated_at
            "#,
        )
            .bind(tenant_id)
            .bind(input.hotel_name.as_deref())
            .bind(input.service_charge_rate)
            .bind(input.vat_rate)
            .bind(input.checkout_time)
            .fetch_one(executor)
            .await?;

        Ok(settings)
    }
}
