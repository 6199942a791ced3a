use std::sync::Arc;

use dashmap::DashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    client::WarehouseBackend,
    errors::ServiceError,
    models::ChecklistItem,
    services::support::apply_optimistic,
};

/// Arrival checklist for an order (seal intact, paperwork present, ...).
///
/// The cached copy updates optimistically on toggle and rolls back if the
/// backend call fails; this is the one place optimistic concurrency is used.
pub struct ChecklistService {
    backend: Arc<dyn WarehouseBackend>,
    cache: DashMap<Uuid, Vec<ChecklistItem>>,
}

impl ChecklistService {
    pub fn new(backend: Arc<dyn WarehouseBackend>) -> Self {
        Self {
            backend,
            cache: DashMap::new(),
        }
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: Uuid) -> Result<Vec<ChecklistItem>, ServiceError> {
        let items = self.backend.get_arrival_checklist(order_id).await?;
        self.cache.insert(order_id, items.clone());
        Ok(items)
    }

    /// Toggles one checklist item. The cached state flips immediately and is
    /// restored from the prior snapshot if the backend call fails.
    #[instrument(skip(self), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn toggle(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        done: bool,
    ) -> Result<Vec<ChecklistItem>, ServiceError> {
        if !self.cache.contains_key(&order_id) {
            self.get(order_id).await?;
        }

        let read = || {
            self.cache.get(&order_id).and_then(|items| {
                items.iter().find(|i| i.id == item_id).map(|i| i.done)
            })
        };
        let write = |value: bool| {
            if let Some(mut items) = self.cache.get_mut(&order_id) {
                if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
                    item.done = value;
                }
            }
        };

        apply_optimistic(read, write, done, || async {
            self.backend
                .set_checklist_item(order_id, item_id, done)
                .await
                .map_err(ServiceError::from)
        })
        .await?;

        Ok(self
            .cache
            .get(&order_id)
            .map(|items| items.clone())
            .unwrap_or_default())
    }

    /// Cached copy without a refetch; used after a failed toggle to show the
    /// rolled-back state.
    pub fn cached(&self, order_id: Uuid) -> Option<Vec<ChecklistItem>> {
        self.cache.get(&order_id).map(|items| items.clone())
    }

    pub fn forget(&self, order_id: Uuid) {
        self.cache.remove(&order_id);
    }
}
