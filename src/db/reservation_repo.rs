// src/db/reservation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reservations::{Reservation, ReservationStatus, Room},
};

const RESERVATION_COLUMNS: &str = r#"
    id, tenant_id, room_id, guest_name,
    check_in_date, check_out_date, status,
    created_at, updated_at
"#;

// Sem estado: cada método recebe o executor (pool, conexão RLS ou transação)
#[derive(Clone, Default)]
pub struct ReservationRepository;

impl ReservationRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  QUARTOS
    // =========================================================================

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
        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (tenant_id, number, room_type)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, number, room_type, created_at
            "#,
        )
            .bind(tenant_id)
            .bind(number)
            .bind(room_type)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "Room '{}' already exists.",
                            number
                        ));
                    }
                }
                e.into()
            })?;

        Ok(room)
    }

    pub async fn list_rooms<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT id, tenant_id, number, room_type, created_at FROM rooms WHERE tenant_id = $1 ORDER BY number ASC",
        )
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(rooms)
    }

    /// Trava o quarto: reservas concorrentes do mesmo quarto passam em fila.
    pub async fn lock_room<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        room_id: Uuid,
    ) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, tenant_id, number, room_type, created_at
            FROM rooms
            WHERE tenant_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
            .bind(tenant_id)
            .bind(room_id)
            .fetch_optional(executor)
            .await?;

        Ok(room)
    }

    // =========================================================================
    //  RESERVAS
    // =========================================================================

    pub async fn create_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        room_id: Uuid,
        guest_name: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO reservations (tenant_id, room_id, guest_name, check_in_date, check_out_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(tenant_id)
            .bind(room_id)
            .bind(guest_name)
            .bind(check_in)
            .bind(check_out)
            .fetch_one(executor)
            .await?;

        Ok(reservation)
    }

    pub async fn find_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE tenant_id = $1 AND id = $2"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_optional(executor)
            .await?;

        Ok(reservation)
    }

    pub async fn lock_reservation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_optional(executor)
            .await?;

        Ok(reservation)
    }

    /// Reservas do quarto que ainda ocupam o calendário e cruzam a janela pedida.
    /// O filtro de intervalo no SQL só reduz o volume; a regra fica no detector.
    pub async fn list_active_for_room<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        room_id: Uuid,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE tenant_id = $1
              AND room_id = $2
              AND status IN ('confirmed', 'checked_in')
              AND check_in_date < $4
              AND check_out_date > $3
            ORDER BY check_in_date ASC
            "#
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(tenant_id)
            .bind(room_id)
            .bind(window_start)
            .bind(window_end)
            .fetch_all(executor)
            .await?;

        Ok(reservations)
    }

    pub async fn list_checked_in<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE tenant_id = $1 AND status = 'checked_in'"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&sql)
            .bind(tenant_id)
            .fetch_all(executor)
            .await?;

        Ok(reservations)
    }

    pub async fn update_dates<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE reservations
            SET check_in_date = $1, check_out_date = $2, updated_at = NOW()
            WHERE tenant_id = $3 AND id = $4
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(check_in)
            .bind(check_out)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_one(executor)
            .await?;

        Ok(reservation)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reservation_id: Uuid,
        status: ReservationStatus,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE reservations
            SET status = $1, updated_at = NOW()
            WHERE tenant_id = $2 AND id = $3
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        let reservation = sqlx::query_as::<_, Reservation>(&sql)
            .bind(status)
            .bind(tenant_id)
            .bind(reservation_id)
            .fetch_one(executor)
            .await?;

        Ok(reservation)
    }
}
