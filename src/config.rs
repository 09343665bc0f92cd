// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{FolioRepository, PaymentRepository, ReservationRepository, SettingsRepository},
    services::{
        auth::AuthService,
        events::EventHub,
        folio_service::FolioService,
        overstay::OverstayPolicy,
        payment_service::PaymentService,
        reservation_service::ReservationService,
    },
};

/// Políticas de cobrança que variam por implantação (não ficam no código).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPolicy {
    pub overstay: OverstayPolicy,
    // Dias após a data de check-out até a conta ser considerada vencida
    pub overdue_after_days: i64,
    // Usadas quando o hotel ainda não configurou as próprias taxas
    pub default_service_charge_rate: Decimal,
    pub default_vat_rate: Decimal,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            overstay: OverstayPolicy::default(),
            overdue_after_days: 0,
            default_service_charge_rate: Decimal::ZERO,
            default_vat_rate: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub billing: BillingPolicy,
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} tem um valor inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let defaults = BillingPolicy::default();
        let overstay = OverstayPolicy::new(
            env_or("OVERSTAY_GRACE_HOURS", defaults.overstay.grace_hours)?,
            env_or("OVERSTAY_WARNING_HOURS", defaults.overstay.warning_after_hours)?,
            env_or("OVERSTAY_CRITICAL_HOURS", defaults.overstay.critical_after_hours)?,
        )?;

        let billing = BillingPolicy {
            overstay,
            overdue_after_days: env_or("PAYMENT_OVERDUE_DAYS", defaults.overdue_after_days)?,
            default_service_charge_rate: env_or(
                "DEFAULT_SERVICE_CHARGE_RATE",
                defaults.default_service_charge_rate,
            )?,
            default_vat_rate: env_or("DEFAULT_VAT_RATE", defaults.default_vat_rate)?,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            billing,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub billing_policy: Arc<BillingPolicy>,
    pub events: EventHub,
    pub settings_repo: SettingsRepository,
    pub folio_service: FolioService,
    pub payment_service: PaymentService,
    pub reservation_service: ReservationService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(
            db_pool,
            settings.jwt_secret.clone(),
            settings.billing.clone(),
        ))
    }

    /// Monta o gráfico de dependências a partir de uma pool já criada.
    pub fn from_parts(db_pool: PgPool, jwt_secret: String, billing: BillingPolicy) -> Self {
        let events = EventHub::new(256);

        let folio_repo = FolioRepository::new();
        let payment_repo = PaymentRepository::new();
        let reservation_repo = ReservationRepository::new();
        let settings_repo = SettingsRepository::new();

        let folio_service = FolioService::new(
            folio_repo.clone(),
            payment_repo.clone(),
            reservation_repo.clone(),
            events.clone(),
        );
        let payment_service = PaymentService::new(payment_repo, folio_repo.clone(), events.clone());
        let reservation_service = ReservationService::new(
            reservation_repo,
            folio_repo,
            settings_repo.clone(),
            events.clone(),
        );

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::new()),
            auth_service: AuthService::new(jwt_secret),
            billing_policy: Arc::new(billing),
            events,
            settings_repo,
            folio_service,
            payment_service,
            reservation_service,
        }
    }
}
