use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    client::WarehouseBackend,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{InboundOrder, InboundOrderStatus},
};

/// Inbound order status transitions.
///
/// Statuses move strictly forward (`ordered -> in_transit -> arrived ->
/// received`). The one non-user-driven transition is the automatic
/// `arrived -> received` completion once every line item is fully received.
#[derive(Clone)]
pub struct OrderStatusService {
    backend: Arc<dyn WarehouseBackend>,
    event_sender: EventSender,
}

impl OrderStatusService {
    pub fn new(backend: Arc<dyn WarehouseBackend>, event_sender: EventSender) -> Self {
        Self {
            backend,
            event_sender,
        }
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<InboundOrder, ServiceError> {
        Ok(self.backend.get_inbound_order(order_id).await?)
    }

    /// Moves an order one step forward. Rejects anything that is not the
    /// next status in sequence.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn advance_status(
        &self,
        order_id: Uuid,
        new_status: InboundOrderStatus,
    ) -> Result<InboundOrder, ServiceError> {
        let order = self.backend.get_inbound_order(order_id).await?;
        let old_status = order.status;

        if !old_status.can_transition_to(new_status) {
            error!(
                "Invalid status transition from {} to {}",
                old_status, new_status
            );
            return Err(ServiceError::InvalidStatus(format!(
                "cannot transition from '{}' to '{}'",
                old_status, new_status
            )));
        }

        let updated = self
            .backend
            .update_inbound_order_status(order_id, new_status)
            .await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        info!(
            "Inbound order {} status updated from '{}' to '{}'",
            order_id, old_status, new_status
        );

        Ok(updated)
    }

    /// Operator escape hatch: `arrived -> received` without item-level
    /// verification.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_complete(&self, order_id: Uuid) -> Result<InboundOrder, ServiceError> {
        let order = self.backend.get_inbound_order(order_id).await?;

        if order.status != InboundOrderStatus::Arrived {
            return Err(ServiceError::InvalidStatus(format!(
                "mark complete requires status 'arrived', order is '{}'",
                order.status
            )));
        }

        let updated = self
            .backend
            .update_inbound_order_status(order_id, InboundOrderStatus::Received)
            .await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: InboundOrderStatus::Arrived.to_string(),
                new_status: InboundOrderStatus::Received.to_string(),
            })
            .await;

        info!("Inbound order {} marked complete", order_id);

        Ok(updated)
    }

    /// Fires the automatic `arrived -> received` transition when every line
    /// item satisfies `qty_received >= qty_expected`. Returns the updated
    /// order when the transition fired.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn auto_complete_if_fully_received(
        &self,
        order: &InboundOrder,
    ) -> Result<Option<InboundOrder>, ServiceError> {
        if order.status != InboundOrderStatus::Arrived || !order.fully_received() {
            return Ok(None);
        }

        let updated = self
            .backend
            .update_inbound_order_status(order.id, InboundOrderStatus::Received)
            .await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: order.id,
                old_status: InboundOrderStatus::Arrived.to_string(),
                new_status: InboundOrderStatus::Received.to_string(),
            })
            .await;
        self.event_sender
            .send_or_log(Event::OrderAutoCompleted { order_id: order.id })
            .await;

        info!("Inbound order {} auto-completed", order.id);

        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryWarehouse;
    use crate::test_fixtures::{order_with_items, test_event_sender};

    fn service(backend: Arc<InMemoryWarehouse>) -> OrderStatusService {
        OrderStatusService::new(backend, test_event_sender())
    }

    #[tokio::test]
    async fn advances_one_step_forward() {
        let backend = Arc::new(InMemoryWarehouse::new());
        let order = order_with_items(InboundOrderStatus::Ordered, &[(10, 0, 0, 0)]);
        let order_id = order.id;
        backend.seed_order(order);

        let svc = service(backend);
        let updated = svc
            .advance_status(order_id, InboundOrderStatus::InTransit)
            .await
            .unwrap();
        assert_eq!(updated.status, InboundOrderStatus::InTransit);
    }

    #[tokio::test]
    async fn rejects_skipping_and_backward_transitions() {
        let backend = Arc::new(InMemoryWarehouse::new());
        let order = order_with_items(InboundOrderStatus::Ordered, &[(10, 0, 0, 0)]);
        let order_id = order.id;
        backend.seed_order(order.clone());

        let svc = service(backend.clone());
        assert!(svc
            .advance_status(order_id, InboundOrderStatus::Arrived)
            .await
            .is_err());
        assert!(svc
            .advance_status(order_id, InboundOrderStatus::Ordered)
            .await
            .is_err());

        // Untouched after failed attempts.
        let current = backend.get_inbound_order(order_id).await.unwrap();
        assert_eq!(current.status, InboundOrderStatus::Ordered);
    }

    #[tokio::test]
    async fn mark_complete_requires_arrived() {
        let backend = Arc::new(InMemoryWarehouse::new());
        let order = order_with_items(InboundOrderStatus::InTransit, &[(10, 0, 0, 0)]);
        let order_id = order.id;
        backend.seed_order(order);

        let svc = service(backend.clone());
        assert!(svc.mark_complete(order_id).await.is_err());

        backend
            .update_inbound_order_status(order_id, InboundOrderStatus::Arrived)
            .await
            .unwrap();
        let updated = svc.mark_complete(order_id).await.unwrap();
        assert_eq!(updated.status, InboundOrderStatus::Received);
        assert!(updated.received_date.is_some());
    }

    #[tokio::test]
    async fn auto_complete_fires_only_when_fully_received() {
        let backend = Arc::new(InMemoryWarehouse::new());
        let svc = service(backend.clone());

        let partial = order_with_items(InboundOrderStatus::Arrived, &[(10, 4, 0, 0)]);
        assert!(svc
            .auto_complete_if_fully_received(&partial)
            .await
            .unwrap()
            .is_none());

        let full = order_with_items(InboundOrderStatus::Arrived, &[(10, 10, 0, 0), (5, 6, 0, 0)]);
        backend.seed_order(full.clone());
        let updated = svc
            .auto_complete_if_fully_received(&full)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, InboundOrderStatus::Received);
    }

    #[tokio::test]
    async fn auto_complete_skips_non_arrived_orders() {
        let backend = Arc::new(InMemoryWarehouse::new());
        let svc = service(backend);

        let full_but_in_transit =
            order_with_items(InboundOrderStatus::InTransit, &[(10, 10, 0, 0)]);
        assert!(svc
            .auto_complete_if_fully_received(&full_but_in_transit)
            .await
            .unwrap()
            .is_none());
    }
}
