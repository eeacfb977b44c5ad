use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::debug;

/// Latest result of a screen fetch, owned by whoever displays it.
pub struct ViewSlot<T> {
    inner: Arc<RwLock<Option<T>>>,
}

/// Weak handle given to an in-flight fetch. Publishing after the slot has
/// been dropped does nothing.
pub struct SlotHandle<T> {
    inner: Weak<RwLock<Option<T>>>,
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl<T> Clone for SlotHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> ViewSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> SlotHandle<T> {
        SlotHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub async fn snapshot(&self) -> Option<T> {
        self.inner.read().await.clone()
    }

    /// Mutate the current value in place; a no-op when nothing was published.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.write().await.as_mut().map(f)
    }
}

impl<T> SlotHandle<T> {
    /// Returns false when the owning view is gone.
    pub async fn publish(&self, value: T) -> bool {
        match self.inner.upgrade() {
            Some(slot) => {
                *slot.write().await = Some(value);
                true
            }
            None => {
                debug!("View was dropped before its fetch completed; discarding result");
                false
            }
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_into_live_slot() {
        let slot: ViewSlot<Vec<u32>> = ViewSlot::new();
        let handle = slot.handle();
        assert!(handle.publish(vec![1, 2]).await);
        assert_eq!(slot.snapshot().await, Some(vec![1, 2]));

        let removed = slot.update(|items| items.retain(|i| *i != 1)).await;
        assert_eq!(removed, Some(()));
        assert_eq!(slot.snapshot().await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_publish_into_dropped_slot_is_noop() {
        let slot: ViewSlot<String> = ViewSlot::new();
        let handle = slot.handle();
        drop(slot);

        assert!(!handle.is_live());
        assert!(!handle.publish("late".to_string()).await);
    }

    #[tokio::test]
    async fn test_update_without_value() {
        let slot: ViewSlot<u8> = ViewSlot::new();
        assert_eq!(slot.update(|v| *v += 1).await, None);
    }
}
