use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per requester. Waiters are served in arrival order, so
/// turns from the same requester apply in the order they were received while
/// different requesters never wait on each other.
#[derive(Clone, Default)]
pub struct RequesterLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl RequesterLocks {
    pub async fn acquire(&self, requester_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(locks) => locks,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(locks.entry(requester_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forgets locks nobody holds or waits on; returns how many were dropped.
    pub fn prune(&self) -> usize {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub fn len(&self) -> usize {
        match self.locks.lock() {
            Ok(locks) => locks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use super::RequesterLocks;

    #[tokio::test]
    async fn same_requester_turns_run_in_arrival_order() {
        let locks = RequesterLocks::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_guard = locks.acquire("U1").await;
        let mut handles = Vec::new();
        for turn in 0..5 {
            let locks = locks.clone();
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("U1").await;
                log.lock().await.push(turn);
            }));
            // let each waiter enqueue before the next one is spawned
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(first_guard);

        for handle in handles {
            assert!(handle.await.is_ok());
        }
        assert_eq!(*log.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn different_requesters_do_not_contend() {
        let locks = RequesterLocks::default();
        let _held = locks.acquire("U1").await;

        let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire("U2")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = RequesterLocks::default();
        let held = locks.acquire("U1").await;
        drop(locks.acquire("U2").await);

        assert_eq!(locks.prune(), 1);
        assert_eq!(locks.len(), 1);
        drop(held);
        assert_eq!(locks.prune(), 1);
        assert!(locks.is_empty());
    }
}
