//! # Per-Order Locks
//!
//! Every read-mutate-persist sequence on one order runs under that order's
//! mutex. The locks only serialize the calls: whichever runs second loads
//! the state the first one persisted, and the order's own lifecycle rules
//! decide whether it may proceed (a second payment sees `AlreadyPaid`, a
//! line edit after payment is rejected the same way).
//!
//! ```text
//! terminal A: lock(ord-1) ── load ── settle ── persist ── unlock
//! terminal B: lock(ord-1) ·········· waiting ··········· ── load ── AlreadyPaid
//! terminal C: lock(ord-2) ── load ── add_line ── persist ── unlock   (no wait)
//! ```
//!
//! Slots are held weakly: once the last guard for an order is dropped its
//! entry is pruned on the next acquisition.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

pub type OrderGuard = OwnedMutexGuard<()>;

#[derive(Debug, Clone, Default)]
pub struct OrderLocks {
    slots: Arc<Mutex<HashMap<String, Weak<Mutex<()>>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to one order.
    pub async fn acquire(&self, order_id: &str) -> OrderGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.retain(|_, weak| weak.strong_count() > 0);

            match slots.get(order_id).and_then(Weak::upgrade) {
                Some(slot) => slot,
                None => {
                    let slot = Arc::new(Mutex::new(()));
                    slots.insert(order_id.to_string(), Arc::downgrade(&slot));
                    slot
                }
            }
        };
        slot.lock_owned().await
    }

    /// Orders currently locked or awaited.
    pub async fn held(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_order_is_exclusive() {
        let locks = OrderLocks::new();
        let guard = locks.acquire("ord-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("ord-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_orders_do_not_wait() {
        let locks = OrderLocks::new();
        let _a = locks.acquire("ord-1").await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("ord-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_slots_are_pruned() {
        let locks = OrderLocks::new();
        {
            let _a = locks.acquire("ord-1").await;
            let _b = locks.acquire("ord-2").await;
            assert_eq!(locks.held().await, 2);
        }
        assert_eq!(locks.held().await, 0);

        let _c = locks.acquire("ord-3").await;
        assert_eq!(locks.slots.lock().await.len(), 1);
    }
}
