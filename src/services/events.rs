// src/services/events.rs
//
// Notificações em tempo real por hotel. Cada assinatura é uma task que termina
// quando o cliente desconecta ou quando o servidor sinaliza o desligamento.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingEventKind {
    ChargePosted { charge_id: Uuid, amount: Decimal },
    ChargeCancelled { charge_id: Uuid },
    PaymentRecorded { payment_id: Uuid, amount: Decimal },
    PaymentVerified { payment_id: Uuid },
    PaymentMarkedPaid { payment_id: Uuid },
    FolioCorrected { discrepancies: usize },
    FolioClosed,
    GuestCheckedIn { reservation_id: Uuid },
    GuestCheckedOut { reservation_id: Uuid },
}

impl BillingEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            BillingEventKind::ChargePosted { .. } => "charge_posted",
            BillingEventKind::ChargeCancelled { .. } => "charge_cancelled",
            BillingEventKind::PaymentRecorded { .. } => "payment_recorded",
            BillingEventKind::PaymentVerified { .. } => "payment_verified",
            BillingEventKind::PaymentMarkedPaid { .. } => "payment_marked_paid",
            BillingEventKind::FolioCorrected { .. } => "folio_corrected",
            BillingEventKind::FolioClosed => "folio_closed",
            BillingEventKind::GuestCheckedIn { .. } => "guest_checked_in",
            BillingEventKind::GuestCheckedOut { .. } => "guest_checked_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEvent {
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub folio_id: Option<Uuid>,
    #[serde(flatten)]
    pub kind: BillingEventKind,
}

#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<BillingEvent>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (shutdown, _) = watch::channel(false);
        Self { sender, shutdown: Arc::new(shutdown) }
    }

    /// Publicar sem assinantes não é erro.
    pub fn publish(&self, tenant_id: Uuid, folio_id: Option<Uuid>, kind: BillingEventKind) {
        let event = BillingEvent { tenant_id, folio_id, kind };
        if self.sender.send(event).is_err() {
            tracing::trace!("Nenhum assinante para o evento");
        }
    }

    /// Encerra todas as assinaturas abertas.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Stream com os eventos de um único hotel.
    pub fn subscribe(&self, tenant_id: Uuid) -> ReceiverStream<BillingEvent> {
        let mut events = self.sender.subscribe();
        let mut shutdown = self.shutdown.subscribe();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            if *shutdown.borrow() {
                return;
            }
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    received = events.recv() => match received {
                        Ok(event) if event.tenant_id == tenant_id => {
                            // Cliente desconectou
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(tenant_id = %tenant_id, skipped, "Assinante atrasado, eventos descartados");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!(tenant_id = %tenant_id, "Assinatura de eventos encerrada");
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_subscribers_only_see_their_tenant() {
        let hub = EventHub::new(16);
        let (hotel_a, hotel_b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut stream = hub.subscribe(hotel_a);
        tokio::task::yield_now().await;

        let payment_id = Uuid::new_v4();
        hub.publish(hotel_b, None, BillingEventKind::FolioClosed);
        hub.publish(hotel_a, None, BillingEventKind::PaymentRecorded { payment_id, amount: dec!(10) });

        let event = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.tenant_id, hotel_a);
        assert_eq!(event.kind.name(), "payment_recorded");
    }

    #[tokio::test]
    async fn test_shutdown_ends_subscription() {
        let hub = EventHub::new(16);
        let mut stream = hub.subscribe(Uuid::new_v4());

        hub.shutdown();

        let next = tokio::time::timeout(Duration::from_secs(1), stream.next()).await.unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn test_event_serialization() {
        let event = BillingEvent {
            tenant_id: Uuid::new_v4(),
            folio_id: None,
            kind: BillingEventKind::FolioCorrected { discrepancies: 2 },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "folio_corrected");
        assert_eq!(json["discrepancies"], 2);
        assert!(json.get("tenantId").is_none());
    }
}
