// src/db/payment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::payments::{NewPaymentRecord, PaymentMethod, PaymentMethodType, PaymentRecord, PaymentRecordStatus},
};

const PAYMENT_COLUMNS: &str = r#"
    id, tenant_id, folio_id, payment_method_id, method_type,
    amount, fee_amount, is_verified, status,
    terminal_reference, idempotency_key, created_at, verified_at
"#;

const METHOD_COLUMNS: &str =
    "id, tenant_id, name, method_type, enabled, fee_percentage, fee_fixed, created_at";

// Sem estado: cada método recebe o executor (pool, conexão RLS ou transação)
#[derive(Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  FORMAS DE PAGAMENTO
    // =========================================================================

    pub async fn create_method<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        method_type: PaymentMethodType,
        fee_percentage: Decimal,
        fee_fixed: Decimal,
    ) -> Result<PaymentMethod, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO payment_methods (tenant_id, name, method_type, fee_percentage, fee_fixed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {METHOD_COLUMNS}
            "#
        );
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(tenant_id)
            .bind(name)
            .bind(method_type)
            .bind(fee_percentage)
            .bind(fee_fixed)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "A payment method named '{}' already exists.",
                            name
                        ));
                    }
                }
                e.into()
            })?;

        Ok(method)
    }

    pub async fn list_methods<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<PaymentMethod>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {METHOD_COLUMNS} FROM payment_methods WHERE tenant_id = $1 ORDER BY name ASC"
        );
        let methods = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(methods)
    }

    pub async fn find_method<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        method_id: Uuid,
    ) -> Result<Option<PaymentMethod>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {METHOD_COLUMNS} FROM payment_methods WHERE tenant_id = $1 AND id = $2");
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(tenant_id)
            .bind(method_id)
            .fetch_optional(executor)
            .await?;

        Ok(method)
    }

    pub async fn set_method_enabled<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        method_id: Uuid,
        enabled: bool,
    ) -> Result<Option<PaymentMethod>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE payment_methods SET enabled = $1 WHERE tenant_id = $2 AND id = $3 RETURNING {METHOD_COLUMNS}"
        );
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(enabled)
            .bind(tenant_id)
            .bind(method_id)
            .fetch_optional(executor)
            .await?;

        Ok(method)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    /// Insere o pagamento. Com a mesma chave de idempotência, não insere de novo
    /// e devolve None (o chamador busca o registro original).
    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &NewPaymentRecord,
    ) -> Result<Option<PaymentRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO payments (
                tenant_id, folio_id, payment_method_id, method_type,
                amount, fee_amount, is_verified, status,
                terminal_reference, idempotency_key, verified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, CASE WHEN $7 THEN NOW() END)
            ON CONFLICT (tenant_id, idempotency_key) DO NOTHING
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let payment = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(tenant_id)
            .bind(input.folio_id)
            .bind(input.payment_method_id)
            .bind(input.method_type)
            .bind(input.amount)
            .bind(input.fee_amount)
            .bind(input.is_verified)
            .bind(input.status)
            .bind(input.terminal_reference.as_deref())
            .bind(input.idempotency_key.as_deref())
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    pub async fn find_by_idempotency_key<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<PaymentRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND idempotency_key = $2"
        );
        let payment = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(tenant_id)
            .bind(idempotency_key)
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    pub async fn find_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<PaymentRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND id = $2");
        let payment = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(tenant_id)
            .bind(payment_id)
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    /// Marca como verificado e atualiza o status. Só o flag de verificação muda
    /// em registros já concluídos.
    pub async fn mark_verified<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
        status: PaymentRecordStatus,
    ) -> Result<PaymentRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE payments
            SET is_verified = TRUE,
                verified_at = COALESCE(verified_at, NOW()),
                status = CASE WHEN status = 'completed' THEN status ELSE $1 END
            WHERE tenant_id = $2 AND id = $3
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let payment = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(status)
            .bind(tenant_id)
            .bind(payment_id)
            .fetch_one(executor)
            .await?;

        Ok(payment)
    }

    pub async fn list_for_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND folio_id = $2 ORDER BY created_at ASC"
        );
        let payments = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(tenant_id)
            .bind(folio_id)
            .fetch_all(executor)
            .await?;

        Ok(payments)
    }
}
