// src/services/reservation_conflict.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reservations::{ConflictCheck, Reservation},
};

pub fn validate_stay(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), AppError> {
    if check_out <= check_in {
        return Err(AppError::InvalidStayDates);
    }
    Ok(())
}

/// Intervalos semiabertos [entrada, saída): sair no dia N e entrar no dia N não conflita.
pub fn stays_overlap(a_in: NaiveDate, a_out: NaiveDate, b_in: NaiveDate, b_out: NaiveDate) -> bool {
    a_in < b_out && b_in < a_out
}

/// Procura, entre as reservas do quarto, a primeira que ocupa as mesmas noites.
pub fn find_conflict(
    room_reservations: &[Reservation],
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude_reservation_id: Option<Uuid>,
) -> ConflictCheck {
    let conflicting = room_reservations
        .iter()
        .filter(|r| r.room_id == room_id)
        .filter(|r| r.status.occupies_room())
        .filter(|r| Some(r.id) != exclude_reservation_id)
        .find(|r| stays_overlap(r.check_in_date, r.check_out_date, check_in, check_out));

    match conflicting {
        Some(r) => ConflictCheck {
            has_conflict: true,
            conflicting_reservation_id: Some(r.id),
            details: Some(format!(
                "{} already holds this room from {} to {}",
                r.guest_name, r.check_in_date, r.check_out_date
            )),
        },
        None => ConflictCheck {
            has_conflict: false,
            conflicting_reservation_id: None,
            details: None,
        },
    }
}
