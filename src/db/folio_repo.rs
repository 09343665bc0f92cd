// src/db/folio_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::folio::{ChargeStatus, Folio, FolioCharge, FolioTotals},
};

const FOLIO_COLUMNS: &str = r#"
    id, tenant_id, reservation_id, status,
    total_charges, total_payments, balance,
    opened_at, closed_at
"#;

// Sem estado: cada método recebe o executor (pool, conexão RLS ou transação)
#[derive(Clone, Default)]
pub struct FolioRepository;

impl FolioRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  FOLIO (Cabeçalho)
    // =========================================================================

    pub async fn create_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Folio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Todo folio nasce zerado; os totais só mudam via recálculo
        let sql = format!(
            r#"
            INSERT INTO folios (tenant_id, reservation_id)
            VALUES ($1, $2)
            RETURNING {FOLIO_COLUMNS}
            "#
        );

        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(
                            "This reservation already has a folio.".into(),
                        );
                    }
                }
                e.into()
            })?;

        Ok(folio)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<Option<Folio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {FOLIO_COLUMNS} FROM folios WHERE tenant_id = $1 AND id = $2");
        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_optional(executor)
            .await?;

        Ok(folio)
    }

    pub async fn find_by_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Option<Folio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {FOLIO_COLUMNS} FROM folios WHERE tenant_id = $1 AND reservation_id = $2"
        );
        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_optional(executor)
            .await?;

        Ok(folio)
    }

    /// Trava a linha do folio até o fim da transação.
    /// Todo escritor (lançamento, pagamento, correção) passa por aqui.
    pub async fn lock_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<Option<Folio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {FOLIO_COLUMNS} FROM folios WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        );
        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_optional(executor)
            .await?;

        Ok(folio)
    }

    pub async fn write_totals<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
        totals: &FolioTotals,
    ) -> Result<Folio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE folios
            SET total_charges = $1, total_payments = $2, balance = $3, updated_at = NOW()
            WHERE tenant_id = $4 AND id = $5
            RETURNING {FOLIO_COLUMNS}
            "#
        );
        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(totals.total_charges)
            .bind(totals.total_payments)
            .bind(totals.balance)
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_one(executor)
            .await?;

        Ok(folio)
    }

    pub async fn close_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<Folio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE folios
            SET status = 'closed', closed_at = NOW(), updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {FOLIO_COLUMNS}
            "#
        );
        let folio = sqlx::query_as::<_, Folio>(&sql)
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_one(executor)
            .await?;

        Ok(folio)
    }

    // =========================================================================
    //  LANÇAMENTOS (Charges)
    // =========================================================================

    pub async fn insert_charge<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
        description: &str,
        amount: Decimal,
    ) -> Result<FolioCharge, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charge = sqlx::query_as::<_, FolioCharge>(
            r#"
            INSERT INTO folio_charges (tenant_id, folio_id, description, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, folio_id, description, amount, status, created_at
            "#,
        )
            .bind(tenant_id)
            .bind(folio_id)
            .bind(description)
            .bind(amount)
            .fetch_one(executor)
            .await?;

        Ok(charge)
    }

    pub async fn find_charge<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        charge_id: Uuid,
    ) -> Result<Option<FolioCharge>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charge = sqlx::query_as::<_, FolioCharge>(
            r#"
            SELECT id, tenant_id, folio_id, description, amount, status, created_at
            FROM folio_charges
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
            .bind(tenant_id)
            .bind(charge_id)
            .fetch_optional(executor)
            .await?;

        Ok(charge)
    }

    pub async fn set_charge_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        charge_id: Uuid,
        status: ChargeStatus,
    ) -> Result<FolioCharge, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charge = sqlx::query_as::<_, FolioCharge>(
            r#"
            UPDATE folio_charges SET status = $1
            WHERE tenant_id = $2 AND id = $3
            RETURNING id, tenant_id, folio_id, description, amount, status, created_at
            "#,
        )
            .bind(status)
            .bind(tenant_id)
            .bind(charge_id)
            .fetch_one(executor)
            .await?;

        Ok(charge)
    }

    pub async fn list_charges<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<Vec<FolioCharge>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let charges = sqlx::query_as::<_, FolioCharge>(
            r#"
            SELECT id, tenant_id, folio_id, description, amount, status, created_at
            FROM folio_charges
            WHERE tenant_id = $1 AND folio_id = $2
            ORDER BY created_at ASC
            "#,
        )
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_all(executor)
            .await?;

        Ok(charges)
    }
}
