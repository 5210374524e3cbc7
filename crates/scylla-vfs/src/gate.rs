//! Bounded-concurrency gate for physical filesystem access.
//!
//! Caps the number of simultaneous OS filesystem calls so a burst of
//! documentation requests cannot exhaust file descriptors or OS threads.
//! One gate is shared by every physical root in a deployment; the
//! in-memory asset store never touches it.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting-semaphore gate guarding all physical I/O.
///
/// `enter()` suspends the calling task until a token frees up; this is
/// the sole backpressure mechanism against I/O overload. No timeout is
/// applied here, and no fairness beyond the semaphore's is guaranteed,
/// only boundedness. Callers that need deadlines wrap the call.
#[derive(Debug, Clone)]
pub struct AccessGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AccessGate {
    /// Default token capacity.
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Create a gate with the given capacity, fixed for its lifetime.
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a token. The returned pass gives it back when dropped,
    /// which covers every exit path including I/O errors.
    pub async fn enter(&self) -> GatePass {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");
        GatePass { _permit: permit }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// RAII token held for the duration of one physical operation.
#[derive(Debug)]
pub struct GatePass {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_default_capacity() {
        let gate = AccessGate::default();
        assert_eq!(gate.capacity(), 20);
        assert_eq!(gate.available(), 20);
    }

    #[tokio::test]
    async fn test_pass_released_on_drop() {
        let gate = AccessGate::new(1);

        let pass = gate.enter().await;
        assert_eq!(gate.available(), 0);
        drop(pass);
        assert_eq!(gate.available(), 1);

        // A second acquisition must not deadlock.
        let _pass = gate.enter().await;
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_capacity() {
        let gate = AccessGate::new(20);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let tasks = (0..50).map(|_| {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let high_water = high_water.clone();
            tokio::spawn(async move {
                let _pass = gate.enter().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
        });

        for task in tasks.collect::<Vec<_>>() {
            task.await.unwrap();
        }

        assert!(high_water.load(Ordering::SeqCst) <= 20);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(gate.available(), 20);
    }
}
