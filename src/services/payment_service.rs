// src/services/payment_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FolioRepository, PaymentRepository},
    models::{
        folio::{ChargeStatus, Folio, FolioCharge, FolioStatus, PostChargeRequest},
        payments::{
            CreatePaymentMethodRequest, NewPaymentRecord, PaymentMethod, PaymentRecord,
            PaymentRecordStatus, RecordPaymentRequest,
        },
    },
    services::{
        events::{BillingEventKind, EventHub},
        folio_service::recompute_totals,
        payment_rules,
    },
};

/// Resultado do registro: `replayed` indica reenvio com a mesma chave.
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: PaymentRecord,
    pub replayed: bool,
}

#[derive(Clone)]
pub struct PaymentService {
    payment_repo: PaymentRepository,
    folio_repo: FolioRepository,
    events: EventHub,
}

fn ensure_open(folio: &Folio) -> Result<(), AppError> {
    if folio.status == FolioStatus::Closed {
        return Err(AppError::FolioClosed);
    }
    Ok(())
}

/// Reenvio só devolve o original quando a chave é do mesmo folio.
fn replay_for_folio(existing: PaymentRecord, folio_id: Uuid) -> Result<RecordedPayment, AppError> {
    if existing.folio_id != folio_id {
        return Err(AppError::InvalidField {
            field: "idempotencyKey",
            value: existing.idempotency_key.unwrap_or_default(),
        });
    }
    Ok(RecordedPayment { payment: existing, replayed: true })
}

// Recusado pelo processador: confirmar seria inventar dinheiro
fn ensure_not_failed(payment: &PaymentRecord) -> Result<(), AppError> {
    if payment.status == PaymentRecordStatus::Failed {
        return Err(AppError::PaymentFailed);
    }
    Ok(())
}

impl PaymentService {
    pub fn new(payment_repo: PaymentRepository, folio_repo: FolioRepository, events: EventHub) -> Self {
        Self { payment_repo, folio_repo, events }
    }

    // =========================================================================
    //  FORMAS DE PAGAMENTO
    // =========================================================================

    pub async fn create_method<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &CreatePaymentMethodRequest,
    ) -> Result<PaymentMethod, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.payment_repo
            .create_method(
                executor,
                tenant_id,
                input.name.trim(),
                input.method_type,
                input.fee_percentage,
                input.fee_fixed,
            )
            .await
    }

    pub async fn list_methods<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<PaymentMethod>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.payment_repo.list_methods(executor, tenant_id).await
    }

    pub async fn set_method_enabled<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        method_id: Uuid,
        enabled: bool,
    ) -> Result<PaymentMethod, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.payment_repo
            .set_method_enabled(executor, tenant_id, method_id, enabled)
            .await?
            .ok_or(AppError::PaymentMethodNotFound(method_id))
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    /// Registra um pagamento no folio. Toda validação acontece antes de qualquer escrita.
    pub async fn record_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
        input: &RecordPaymentRequest,
    ) -> Result<RecordedPayment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Reenvio de fila offline: devolve o original sem tocar no folio
        if let Some(key) = input.idempotency_key.as_deref() {
            if let Some(existing) = self.payment_repo.find_by_idempotency_key(&mut *tx, tenant_id, key).await? {
                let recorded = replay_for_folio(existing, folio_id)?;
                tx.commit().await?;
                tracing::info!(tenant_id = %tenant_id, payment_id = %recorded.payment.id, "Pagamento reenviado, devolvendo o original");
                return Ok(recorded);
            }
        }

        // 2. Forma de pagamento
        let method = self.payment_repo
            .find_method(&mut *tx, tenant_id, input.payment_method_id)
            .await?
            .ok_or(AppError::PaymentMethodNotFound(input.payment_method_id))?;

        if !method.enabled {
            return Err(AppError::PaymentMethodDisabled(method.name));
        }

        let terminal_reference = input
            .terminal_reference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if payment_rules::requires_terminal(method.method_type) && terminal_reference.is_none() {
            return Err(AppError::TerminalReferenceRequired);
        }

        // 3. Folio (trava até o commit)
        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        ensure_open(&folio)?;

        // Verificação só faz sentido para formas que passam por conciliação
        let is_verified = input.is_verified && payment_rules::requires_verification(method.method_type);

        let new_payment = NewPaymentRecord {
            folio_id,
            payment_method_id: method.id,
            method_type: method.method_type,
            amount: input.amount,
            fee_amount: payment_rules::compute_fee(&method, input.amount)?,
            is_verified,
            status: payment_rules::record_status_on_creation(method.method_type, is_verified),
            terminal_reference,
            idempotency_key: input.idempotency_key.clone(),
        };

        // 4. Inserção. Sem linha = outra requisição gravou a mesma chave antes
        let inserted = self.payment_repo.insert_payment(&mut *tx, tenant_id, &new_payment).await?;
        let RecordedPayment { payment, replayed } = match inserted {
            Some(payment) => RecordedPayment { payment, replayed: false },
            None => {
                let key = new_payment.idempotency_key.as_deref().unwrap_or_default();
                let existing = self.payment_repo
                    .find_by_idempotency_key(&mut *tx, tenant_id, key)
                    .await?
                    .ok_or(AppError::PaymentNotFound)?;
                replay_for_folio(existing, folio_id)?
            }
        };

        // 5. Agregados recalculados na mesma transação
        if !replayed {
            recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;
        }

        tx.commit().await?;

        if !replayed {
            tracing::info!(
                tenant_id = %tenant_id,
                folio_id = %folio_id,
                payment_id = %payment.id,
                method = %payment.method_type,
                status = ?payment.status,
                "Pagamento registrado"
            );
            self.events.publish(
                tenant_id,
                Some(folio_id),
                BillingEventKind::PaymentRecorded { payment_id: payment.id, amount: payment.amount },
            );
        }

        Ok(RecordedPayment { payment, replayed })
    }

    /// Confirmação do processador (POS, digital, transferência).
    pub async fn verify_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let payment = self.payment_repo
            .find_payment(&mut *tx, tenant_id, payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)?;

        if !payment_rules::requires_verification(payment.method_type) {
            return Err(AppError::VerificationNotApplicable(payment.method_type));
        }
        ensure_not_failed(&payment)?;

        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, payment.folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        ensure_open(&folio)?;

        let status = payment_rules::record_status_on_creation(payment.method_type, true);
        let verified = self.payment_repo.mark_verified(&mut *tx, tenant_id, payment_id, status).await?;
        recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, payment_id = %payment_id, "Pagamento verificado");
        self.events.publish(tenant_id, Some(folio.id), BillingEventKind::PaymentVerified { payment_id });

        Ok(verified)
    }

    /// Baixa manual feita pela gerência. Crédito (faturado) nunca vira pago.
    pub async fn mark_as_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentRecord, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let payment = self.payment_repo
            .find_payment(&mut *tx, tenant_id, payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)?;

        if !payment_rules::can_mark_as_paid(payment.method_type) {
            return Err(AppError::CreditCannotBeMarkedPaid);
        }
        ensure_not_failed(&payment)?;

        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, payment.folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        ensure_open(&folio)?;

        let updated = self.payment_repo
            .mark_verified(&mut *tx, tenant_id, payment_id, PaymentRecordStatus::Completed)
            .await?;
        recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, payment_id = %payment_id, "Pagamento baixado manualmente");
        self.events.publish(tenant_id, Some(folio.id), BillingEventKind::PaymentMarkedPaid { payment_id });

        Ok(updated)
    }

    // =========================================================================
    //  LANÇAMENTOS
    // =========================================================================

    pub async fn post_charge<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
        input: &PostChargeRequest,
    ) -> Result<FolioCharge, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        ensure_open(&folio)?;

        let charge = self.folio_repo
            .insert_charge(&mut *tx, tenant_id, folio_id, input.description.trim(), input.amount)
            .await?;
        recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;

        tx.commit().await?;

        self.events.publish(
            tenant_id,
            Some(folio_id),
            BillingEventKind::ChargePosted { charge_id: charge.id, amount: charge.amount },
        );

        Ok(charge)
    }

    /// Estorna um lançamento. Estornar duas vezes não muda nada.
    pub async fn cancel_charge<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        charge_id: Uuid,
    ) -> Result<FolioCharge, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let charge = self.folio_repo
            .find_charge(&mut *tx, tenant_id, charge_id)
            .await?
            .ok_or(AppError::ChargeNotFound)?;

        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, charge.folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        ensure_open(&folio)?;

        if charge.status == ChargeStatus::Cancelled {
            tx.commit().await?;
            return Ok(charge);
        }

        let cancelled = self.folio_repo
            .set_charge_status(&mut *tx, tenant_id, charge_id, ChargeStatus::Cancelled)
            .await?;
        recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;

        tx.commit().await?;

        self.events.publish(tenant_id, Some(folio.id), BillingEventKind::ChargeCancelled { charge_id });

        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::payments::PaymentMethodType,
        services::folio_validator::fixtures::{folio, payment},
    };
    use rust_decimal_macros::dec;

    #[test]
    fn test_closed_folio_rejects_writes() {
        let mut closed = folio(dec!(100), dec!(100), dec!(0));
        closed.status = FolioStatus::Closed;
        assert!(matches!(ensure_open(&closed), Err(AppError::FolioClosed)));

        let open = folio(dec!(100), dec!(0), dec!(100));
        assert!(ensure_open(&open).is_ok());
    }

    #[test]
    fn test_replay_returns_original_for_same_folio() {
        let target = folio(dec!(100), dec!(0), dec!(100));
        let mut original = payment(&target, PaymentMethodType::Cash, dec!(40), PaymentRecordStatus::Completed);
        original.idempotency_key = Some("offline-0001".into());

        let recorded = replay_for_folio(original.clone(), target.id).unwrap();
        assert!(recorded.replayed);
        assert_eq!(recorded.payment.id, original.id);
    }

    #[test]
    fn test_replay_key_from_another_folio_is_rejected() {
        let first = folio(dec!(100), dec!(0), dec!(100));
        let other = folio(dec!(80), dec!(0), dec!(80));
        let mut original = payment(&first, PaymentMethodType::Cash, dec!(40), PaymentRecordStatus::Completed);
        original.idempotency_key = Some("offline-0001".into());

        match replay_for_folio(original, other.id) {
            Err(AppError::InvalidField { field, value }) => {
                assert_eq!(field, "idempotencyKey");
                assert_eq!(value, "offline-0001");
            }
            unexpected => panic!("esperava InvalidField, veio {:?}", unexpected.map(|r| r.payment.id)),
        }
    }

    #[test]
    fn test_failed_payment_cannot_be_confirmed() {
        let f = folio(dec!(100), dec!(0), dec!(100));
        let failed = payment(&f, PaymentMethodType::Pos, dec!(100), PaymentRecordStatus::Failed);
        assert!(matches!(ensure_not_failed(&failed), Err(AppError::PaymentFailed)));

        let pending = payment(&f, PaymentMethodType::Pos, dec!(100), PaymentRecordStatus::Pending);
        assert!(ensure_not_failed(&pending).is_ok());
    }
}
