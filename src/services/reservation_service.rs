// src/services/reservation_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::BillingPolicy,
    db::{FolioRepository, ReservationRepository, SettingsRepository},
    models::{
        folio::Folio,
        reservations::{
            ConflictCheck, CreateReservationRequest, Overstay, Reservation, ReservationStatus, Room,
        },
    },
    services::{
        events::{BillingEventKind, EventHub},
        overstay::{self, OverstayPolicy},
        reservation_conflict,
    },
};

/// Transições permitidas: confirmed -> checked_in -> checked_out.
pub fn ensure_transition(from: ReservationStatus, to: ReservationStatus) -> Result<(), AppError> {
    let allowed = matches!(
        (from, to),
        (ReservationStatus::Confirmed, ReservationStatus::CheckedIn)
            | (ReservationStatus::CheckedIn, ReservationStatus::CheckedOut)
    );
    if !allowed {
        return Err(AppError::InvalidStatusTransition { from, to });
    }
    Ok(())
}

/// Saldo devedor bloqueia a saída; crédito a favor do hóspede não.
pub fn ensure_settled(folio: &Folio) -> Result<(), AppError> {
    if folio.balance > Decimal::ZERO {
        return Err(AppError::OutstandingBalance { balance: folio.balance });
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReservationService {
    reservation_repo: ReservationRepository,
    folio_repo: FolioRepository,
    settings_repo: SettingsRepository,
    events: EventHub,
}

impl ReservationService {
    pub fn new(
        reservation_repo: ReservationRepository,
        folio_repo: FolioRepository,
        settings_repo: SettingsRepository,
        events: EventHub,
    ) -> Self {
        Self { reservation_repo, folio_repo, settings_repo, events }
    }

    // --- QUARTOS ---

    pub async fn create_room<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        number: &str,
        room_type: Option<&str>,
    ) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.reservation_repo.create_room(executor, tenant_id, number.trim(), room_type).await
    }

    pub async fn list_rooms<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.reservation_repo.list_rooms(executor, tenant_id).await
    }

    // --- CONFLITOS ---

    /// Consulta pura: não trava nada, serve para a tela de disponibilidade.
    pub async fn check_conflict<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        room_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_reservation_id: Option<Uuid>,
    ) -> Result<ConflictCheck, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        reservation_conflict::validate_stay(check_in, check_out)?;

        let existing = self.reservation_repo
            .list_active_for_room(executor, tenant_id, room_id, check_in, check_out)
            .await?;

        Ok(reservation_conflict::find_conflict(
            &existing,
            room_id,
            check_in,
            check_out,
            exclude_reservation_id,
        ))
    }

    // --- RESERVAS ---

    pub async fn create_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &CreateReservationRequest,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        reservation_conflict::validate_stay(input.check_in_date, input.check_out_date)?;

        let mut tx = executor.begin().await?;

        // Trava o quarto: duas reservas simultâneas não passam pelo mesmo teste
        self.reservation_repo
            .lock_room(&mut *tx, tenant_id, input.room_id)
            .await?
            .ok_or(AppError::RoomNotFound)?;

        let existing = self.reservation_repo
            .list_active_for_room(&mut *tx, tenant_id, input.room_id, input.check_in_date, input.check_out_date)
            .await?;
        let conflict = reservation_conflict::find_conflict(
            &existing,
            input.room_id,
            input.check_in_date,
            input.check_out_date,
            None,
        );
        if let Some(conflicting) = conflict.conflicting_reservation_id {
            return Err(AppError::ReservationConflict(conflicting));
        }

        let reservation = self.reservation_repo
            .create_reservation(
                &mut *tx,
                tenant_id,
                input.room_id,
                input.guest_name.trim(),
                input.check_in_date,
                input.check_out_date,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, reservation_id = %reservation.id, "Reserva criada");
        Ok(reservation)
    }

    pub async fn reschedule_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        reservation_conflict::validate_stay(check_in, check_out)?;

        let mut tx = executor.begin().await?;

        let current = self.reservation_repo
            .lock_reservation(&mut *tx, tenant_id, reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;

        if current.status == ReservationStatus::CheckedOut {
            return Err(AppError::InvalidStatusTransition {
                from: current.status,
                to: current.status,
            });
        }

        self.reservation_repo
            .lock_room(&mut *tx, tenant_id, current.room_id)
            .await?
            .ok_or(AppError::RoomNotFound)?;

        let existing = self.reservation_repo
            .list_active_for_room(&mut *tx, tenant_id, current.room_id, check_in, check_out)
            .await?;
        let conflict = reservation_conflict::find_conflict(
            &existing,
            current.room_id,
            check_in,
            check_out,
            Some(reservation_id),
        );
        if let Some(conflicting) = conflict.conflicting_reservation_id {
            return Err(AppError::ReservationConflict(conflicting));
        }

        let updated = self.reservation_repo
            .update_dates(&mut *tx, tenant_id, reservation_id, check_in, check_out)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Check-in abre o folio da hospedagem.
    pub async fn check_in<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.reservation_repo
            .lock_reservation(&mut *tx, tenant_id, reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;
        ensure_transition(current.status, ReservationStatus::CheckedIn)?;

        let updated = self.reservation_repo
            .update_status(&mut *tx, tenant_id, reservation_id, ReservationStatus::CheckedIn)
            .await?;

        // Reserva pode já ter folio (ex: depósito antecipado)
        let folio = match self.folio_repo.find_by_reservation(&mut *tx, tenant_id, reservation_id).await? {
            Some(folio) => folio,
            None => self.folio_repo.create_folio(&mut *tx, tenant_id, reservation_id).await?,
        };

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, reservation_id = %reservation_id, folio_id = %folio.id, "Check-in realizado");
        self.events.publish(tenant_id, Some(folio.id), BillingEventKind::GuestCheckedIn { reservation_id });

        Ok(updated)
    }

    /// Check-out só com a conta quitada; o folio é fechado junto.
    pub async fn check_out<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.reservation_repo
            .lock_reservation(&mut *tx, tenant_id, reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;
        ensure_transition(current.status, ReservationStatus::CheckedOut)?;

        let folio = match self.folio_repo.find_by_reservation(&mut *tx, tenant_id, reservation_id).await? {
            Some(found) => self.folio_repo.lock_for_update(&mut *tx, tenant_id, found.id).await?,
            None => None,
        };

        if let Some(folio) = &folio {
            ensure_settled(folio)?;
            self.folio_repo.close_folio(&mut *tx, tenant_id, folio.id).await?;
        }

        let updated = self.reservation_repo
            .update_status(&mut *tx, tenant_id, reservation_id, ReservationStatus::CheckedOut)
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, reservation_id = %reservation_id, "Check-out realizado");
        let folio_id = folio.map(|f| f.id);
        self.events.publish(tenant_id, folio_id, BillingEventKind::GuestCheckedOut { reservation_id });
        if folio_id.is_some() {
            self.events.publish(tenant_id, folio_id, BillingEventKind::FolioClosed);
        }

        Ok(updated)
    }

    // --- OVERSTAY ---

    /// Hóspedes que passaram do check-out. O horário vem da configuração do hotel.
    pub async fn detect_overstays<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        now: DateTime<Utc>,
        policy: &OverstayPolicy,
        billing: &BillingPolicy,
    ) -> Result<Vec<Overstay>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let settings = self.settings_repo.get_settings(&mut *tx, tenant_id, billing).await?;
        let checked_in = self.reservation_repo.list_checked_in(&mut *tx, tenant_id).await?;

        tx.commit().await?;

        Ok(overstay::detect_overstays(&checked_in, now, settings.checkout_time, policy))
    }
}
