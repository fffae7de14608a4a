use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per key. Used to serialize work on a single cart, order
/// or courier while leaving unrelated keys fully concurrent. A key's slot is
/// dropped once nobody holds or waits on it.
#[derive(Default)]
pub struct KeyedLocks {
    slots: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub async fn lock(&self, key: Uuid) -> KeyedGuard<'_> {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        KeyedGuard {
            locks: self,
            key,
            guard: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

pub struct KeyedGuard<'a> {
    locks: &'a KeyedLocks,
    key: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters and lockers in flight hold their own clone of the slot.
        self.locks
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::KeyedLocks;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::default());
        let trace = Arc::new(Mutex::new(Vec::new()));
        let key = Uuid::from_u128(1);

        let first = {
            let locks = locks.clone();
            let trace = trace.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
                trace.lock().await.push("first-start");
                tokio::time::sleep(Duration::from_millis(50)).await;
                trace.lock().await.push("first-end");
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = {
            let locks = locks.clone();
            let trace = trace.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
                trace.lock().await.push("second");
            })
        };

        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(
            *trace.lock().await,
            vec!["first-start", "first-end", "second"]
        );
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::default();
        let _a = locks.lock(Uuid::from_u128(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(Uuid::from_u128(2))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = Arc::new(KeyedLocks::default());
        let key = Uuid::from_u128(1);

        let held = locks.lock(key).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(held);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);

        for n in 0..100 {
            let _guard = locks.lock(Uuid::from_u128(n)).await;
        }
        assert_eq!(locks.len(), 0);
    }
}
