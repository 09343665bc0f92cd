//! Fluxo de cobrança contra um Postgres real (requer TEST_DATABASE_URL).

mod common;

use chrono::NaiveDate;
use common::{db_state, tenant_connection, test_db};
use pms_backend::{
    common::error::AppError,
    db::FolioRepository,
    models::{
        folio::{Folio, FolioStatus, PostChargeRequest},
        payments::{CreatePaymentMethodRequest, PaymentMethod, PaymentMethodType, RecordPaymentRequest},
        reservations::CreateReservationRequest,
    },
    AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgConnection;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Quarto + reserva + check-in. Devolve o folio aberto.
async fn checked_in_folio(state: &AppState, conn: &mut PgConnection, tenant_id: Uuid, room_number: &str) -> Folio {
    let room = state.reservation_service
        .create_room(&mut *conn, tenant_id, room_number, Some("standard"))
        .await
        .unwrap();

    let reservation = state.reservation_service
        .create_reservation(
            &mut *conn,
            tenant_id,
            &CreateReservationRequest {
                room_id: room.id,
                guest_name: "Ana Lima".into(),
                check_in_date: date(2025, 3, 8),
                check_out_date: date(2025, 3, 10),
            },
        )
        .await
        .unwrap();

    state.reservation_service.check_in(&mut *conn, tenant_id, reservation.id).await.unwrap();

    FolioRepository::new()
        .find_by_reservation(&mut *conn, tenant_id, reservation.id)
        .await
        .unwrap()
        .expect("check-in abre o folio")
}

async fn cash_method(state: &AppState, conn: &mut PgConnection, tenant_id: Uuid) -> PaymentMethod {
    state.payment_service
        .create_method(
            &mut *conn,
            tenant_id,
            &CreatePaymentMethodRequest {
                name: "Dinheiro".into(),
                method_type: PaymentMethodType::Cash,
                fee_percentage: Decimal::ZERO,
                fee_fixed: Decimal::ZERO,
            },
        )
        .await
        .unwrap()
}

fn cash_payment(method: &PaymentMethod, amount: Decimal, key: Option<&str>) -> RecordPaymentRequest {
    RecordPaymentRequest {
        payment_method_id: method.id,
        amount,
        is_verified: false,
        terminal_reference: None,
        idempotency_key: key.map(str::to_string),
    }
}

fn charge(description: &str, amount: Decimal) -> PostChargeRequest {
    PostChargeRequest { description: description.into(), amount }
}

async fn reload(conn: &mut PgConnection, folio: &Folio) -> Folio {
    FolioRepository::new()
        .find_by_id(&mut *conn, folio.tenant_id, folio.id)
        .await
        .unwrap()
        .unwrap()
}

fn assert_balanced(folio: &Folio) {
    assert_eq!(folio.balance, folio.total_charges - folio.total_payments);
}

#[tokio::test]
async fn test_every_write_keeps_balance_equal_to_charges_minus_payments() {
    let Some(pool) = test_db().await else { return };
    let state = db_state(pool.clone());
    let tenant_id = Uuid::new_v4();
    let mut conn = tenant_connection(&pool, tenant_id).await;

    let folio = checked_in_folio(&state, &mut conn, tenant_id, "101").await;
    let method = cash_method(&state, &mut conn, tenant_id).await;

    state.payment_service
        .post_charge(&mut *conn, tenant_id, folio.id, &charge("Diária", dec!(250.00)))
        .await
        .unwrap();
    let minibar = state.payment_service
        .post_charge(&mut *conn, tenant_id, folio.id, &charge("Frigobar", dec!(50.00)))
        .await
        .unwrap();

    let current = reload(&mut conn, &folio).await;
    assert_eq!(current.total_charges, dec!(300));
    assert_balanced(&current);

    state.payment_service
        .record_payment(&mut *conn, tenant_id, folio.id, &cash_payment(&method, dec!(120.00), None))
        .await
        .unwrap();

    let current = reload(&mut conn, &folio).await;
    assert_eq!(current.total_payments, dec!(120));
    assert_eq!(current.balance, dec!(180));
    assert_balanced(&current);

    state.payment_service.cancel_charge(&mut *conn, tenant_id, minibar.id).await.unwrap();

    let current = reload(&mut conn, &folio).await;
    assert_eq!(current.balance, dec!(130));
    assert_balanced(&current);

    let validation = state.folio_service.validate_folio(&mut *conn, tenant_id, folio.id).await.unwrap();
    assert!(validation.is_valid);
}

#[tokio::test]
async fn test_auto_fix_rewrites_drifted_totals() {
    let Some(pool) = test_db().await else { return };
    let state = db_state(pool.clone());
    let tenant_id = Uuid::new_v4();
    let mut conn = tenant_connection(&pool, tenant_id).await;

    let folio = checked_in_folio(&state, &mut conn, tenant_id, "102").await;
    state.payment_service
        .post_charge(&mut *conn, tenant_id, folio.id, &charge("Diária", dec!(200.00)))
        .await
        .unwrap();

    // Agregado corrompido por fora do serviço
    sqlx::query("UPDATE folios SET total_charges = 999, balance = 999 WHERE id = $1")
        .bind(folio.id)
        .execute(&mut *conn)
        .await
        .unwrap();

    let before = state.folio_service.validate_folio(&mut *conn, tenant_id, folio.id).await.unwrap();
    assert!(!before.is_valid);

    assert!(state.folio_service.auto_fix_folio(&mut *conn, tenant_id, folio.id).await.unwrap());
    assert!(!state.folio_service.auto_fix_folio(&mut *conn, tenant_id, folio.id).await.unwrap());

    let fixed = reload(&mut conn, &folio).await;
    assert_eq!(fixed.total_charges, dec!(200));
    assert_eq!(fixed.balance, dec!(200));
    assert_balanced(&fixed);
}

#[tokio::test]
async fn test_offline_replay_returns_the_original_payment() {
    let Some(pool) = test_db().await else { return };
    let state = db_state(pool.clone());
    let tenant_id = Uuid::new_v4();
    let mut conn = tenant_connection(&pool, tenant_id).await;

    let folio = checked_in_folio(&state, &mut conn, tenant_id, "201").await;
    let other_folio = checked_in_folio(&state, &mut conn, tenant_id, "202").await;
    let method = cash_method(&state, &mut conn, tenant_id).await;
    state.payment_service
        .post_charge(&mut *conn, tenant_id, folio.id, &charge("Diária", dec!(300.00)))
        .await
        .unwrap();

    let request = cash_payment(&method, dec!(100.00), Some("offline-queue-0001"));

    let first = state.payment_service
        .record_payment(&mut *conn, tenant_id, folio.id, &request)
        .await
        .unwrap();
    let again = state.payment_service
        .record_payment(&mut *conn, tenant_id, folio.id, &request)
        .await
        .unwrap();

    assert!(!first.replayed);
    assert!(again.replayed);
    assert_eq!(again.payment.id, first.payment.id);

    let detail = state.folio_service.get_folio_detail(&mut *conn, tenant_id, folio.id).await.unwrap();
    assert_eq!(detail.payments.len(), 1);
    assert_eq!(detail.header.total_payments, dec!(100));
    assert_eq!(detail.header.balance, dec!(200));

    // Mesma chave apontando para outro folio não devolve o pagamento alheio
    let misrouted = state.payment_service
        .record_payment(&mut *conn, tenant_id, other_folio.id, &request)
        .await;
    assert!(matches!(misrouted, Err(AppError::InvalidField { field: "idempotencyKey", .. })));

    let untouched = reload(&mut conn, &other_folio).await;
    assert_eq!(untouched.total_payments, Decimal::ZERO);
}

#[tokio::test]
async fn test_checkout_is_refused_until_the_folio_is_settled() {
    let Some(pool) = test_db().await else { return };
    let state = db_state(pool.clone());
    let tenant_id = Uuid::new_v4();
    let mut conn = tenant_connection(&pool, tenant_id).await;

    let folio = checked_in_folio(&state, &mut conn, tenant_id, "301").await;
    let method = cash_method(&state, &mut conn, tenant_id).await;
    state.payment_service
        .post_charge(&mut *conn, tenant_id, folio.id, &charge("Diária", dec!(150.00)))
        .await
        .unwrap();

    let refused = state.reservation_service
        .check_out(&mut *conn, tenant_id, folio.reservation_id)
        .await;
    match refused {
        Err(AppError::OutstandingBalance { balance }) => assert_eq!(balance, dec!(150)),
        other => panic!("esperava OutstandingBalance, veio {:?}", other.map(|r| r.id)),
    }
    assert_eq!(reload(&mut conn, &folio).await.status, FolioStatus::Open);

    state.payment_service
        .record_payment(&mut *conn, tenant_id, folio.id, &cash_payment(&method, dec!(150.00), None))
        .await
        .unwrap();

    state.reservation_service
        .check_out(&mut *conn, tenant_id, folio.reservation_id)
        .await
        .unwrap();

    let closed = reload(&mut conn, &folio).await;
    assert_eq!(closed.status, FolioStatus::Closed);
    assert_eq!(closed.balance, Decimal::ZERO);
}
