// src/handlers/events.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt};

use crate::{config::AppState, middleware::tenancy::TenantContext};

// GET /api/events
// Um evento SSE por mudança de folio/pagamento do hotel
pub async fn stream_events(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(tenant_id = %tenant.0, "Nova assinatura de eventos");

    let stream = app_state.events.subscribe(tenant.0).map(|event| {
        let sse = match Event::default().event(event.kind.name()).json_data(&event) {
            Ok(sse) => sse,
            Err(e) => {
                tracing::error!("Falha ao serializar evento: {}", e);
                Event::default().comment("serialization error")
            }
        };
        Ok(sse)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
