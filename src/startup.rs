// src/startup.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::{
    config::AppState,
    handlers,
    middleware::auth::tenant_guard,
};

/// Monta todas as rotas da API. Separado do `main` para os testes de rota.
pub fn build_router(app_state: AppState) -> Router {
    // Cobrança: folios, lançamentos e pagamentos
    let billing_routes = Router::new()
        .route("/billing/breakdown", post(handlers::billing::compute_breakdown))
        .route(
            "/payment-methods",
            get(handlers::payments::list_payment_methods)
                .post(handlers::payments::create_payment_method),
        )
        .route("/payment-methods/{id}", patch(handlers::payments::toggle_payment_method))
        .route("/folios/{id}", get(handlers::folios::get_folio))
        .route("/folios/{id}/validation", get(handlers::folios::validate_folio))
        .route("/folios/{id}/auto-fix", post(handlers::folios::auto_fix_folio))
        .route("/folios/{id}/charges", post(handlers::folios::post_charge))
        .route("/folios/charges/{id}", delete(handlers::folios::cancel_charge))
        .route("/folios/{id}/payments", post(handlers::payments::record_payment))
        .route("/payments/{id}/verify", post(handlers::payments::verify_payment))
        .route("/payments/{id}/mark-paid", post(handlers::payments::mark_as_paid));

    // Hotel: quartos, reservas e operação
    let hotel_routes = Router::new()
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/rooms",
            get(handlers::reservations::list_rooms).post(handlers::reservations::create_room),
        )
        .route("/reservations", post(handlers::reservations::create_reservation))
        .route("/reservations/conflicts", get(handlers::reservations::check_conflict))
        .route("/reservations/overstays", get(handlers::reservations::list_overstays))
        .route("/reservations/{id}/dates", patch(handlers::reservations::reschedule_reservation))
        .route("/reservations/{id}/check-in", post(handlers::reservations::check_in))
        .route("/reservations/{id}/check-out", post(handlers::reservations::check_out))
        .route(
            "/reservations/{id}/payment-status",
            get(handlers::reservations::get_payment_status),
        )
        .route("/events", get(handlers::events::stream_events));

    // Tudo abaixo exige token + X-Tenant-ID de um hotel do funcionário
    let tenant_routes = billing_routes
        .merge(hotel_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", tenant_routes)
        .with_state(app_state)
}
