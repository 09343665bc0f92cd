// src/services/folio_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FolioRepository, PaymentRepository, ReservationRepository},
    models::{
        folio::{Folio, FolioDetail, FolioValidation},
        payments::PaymentStatusSummary,
    },
    services::{
        events::{BillingEventKind, EventHub},
        folio_validator,
        payment_status::{self, OverdueContext},
    },
};

/// Relê lançamentos e pagamentos, recalcula e grava os totais se divergirem.
/// Deve rodar dentro da transação que já travou o folio.
pub(crate) async fn recompute_totals(
    conn: &mut PgConnection,
    folio_repo: &FolioRepository,
    payment_repo: &PaymentRepository,
    folio: &Folio,
) -> Result<(Folio, FolioValidation), AppError> {
    let charges = folio_repo.list_charges(&mut *conn, folio.tenant_id, folio.id).await?;
    let payments = payment_repo.list_for_folio(&mut *conn, folio.tenant_id, folio.id).await?;

    let totals = folio_validator::compute_totals(&charges, &payments);
    let validation = folio_validator::reconcile(folio, &totals);

    if validation.is_valid {
        return Ok((folio.clone(), validation));
    }

    let updated = folio_repo.write_totals(&mut *conn, folio.tenant_id, folio.id, &totals).await?;
    Ok((updated, validation))
}

#[derive(Clone)]
pub struct FolioService {
    folio_repo: FolioRepository,
    payment_repo: PaymentRepository,
    reservation_repo: ReservationRepository,
    events: EventHub,
}

impl FolioService {
    pub fn new(
        folio_repo: FolioRepository,
        payment_repo: PaymentRepository,
        reservation_repo: ReservationRepository,
        events: EventHub,
    ) -> Self {
        Self { folio_repo, payment_repo, reservation_repo, events }
    }

    /// Compara os totais gravados com o recálculo. Somente leitura.
    pub async fn validate_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<FolioValidation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Transação só para ler um retrato consistente das três tabelas
        let mut tx = executor.begin().await?;

        let folio = self.folio_repo
            .find_by_id(&mut *tx, tenant_id, folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;

        let charges = self.folio_repo.list_charges(&mut *tx, tenant_id, folio_id).await?;
        let payments = self.payment_repo.list_for_folio(&mut *tx, tenant_id, folio_id).await?;
        tx.commit().await?;

        let totals = folio_validator::compute_totals(&charges, &payments);
        Ok(folio_validator::reconcile(&folio, &totals))
    }

    /// Corrige os agregados a partir da fonte. Retorna false se já estava íntegro.
    pub async fn auto_fix_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let folio = self.folio_repo
            .lock_for_update(&mut *tx, tenant_id, folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;

        let (_, validation) =
            recompute_totals(&mut *tx, &self.folio_repo, &self.payment_repo, &folio).await?;

        tx.commit().await?;

        if validation.is_valid {
            return Ok(false);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            folio_id = %folio_id,
            discrepancies = validation.discrepancies.len(),
            "Folio corrigido a partir dos lançamentos"
        );
        self.events.publish(
            tenant_id,
            Some(folio_id),
            BillingEventKind::FolioCorrected { discrepancies: validation.discrepancies.len() },
        );

        Ok(true)
    }

    pub async fn get_folio_detail<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio_id: Uuid,
    ) -> Result<FolioDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let header = self.folio_repo
            .find_by_id(&mut *tx, tenant_id, folio_id)
            .await?
            .ok_or(AppError::FolioNotFound)?;
        let charges = self.folio_repo.list_charges(&mut *tx, tenant_id, folio_id).await?;
        let payments = self.payment_repo.list_for_folio(&mut *tx, tenant_id, folio_id).await?;

        tx.commit().await?;

        Ok(FolioDetail { header, charges, payments })
    }

    /// Status de pagamento da reserva. O vencimento é a data de check-out.
    pub async fn get_payment_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
        ctx: &OverdueContext,
    ) -> Result<PaymentStatusSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let reservation = self.reservation_repo
            .find_reservation(&mut *tx, tenant_id, reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;

        let folio = self.folio_repo
            .find_by_reservation(&mut *tx, tenant_id, reservation_id)
            .await?;

        tx.commit().await?;

        Ok(payment_status::derive_payment_status(
            folio.as_ref(),
            reservation.check_out_date,
            ctx,
        ))
    }
}
