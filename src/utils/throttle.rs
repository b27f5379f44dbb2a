use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limits the number of Azure DevOps requests in flight at once.
///
/// A limit of zero disables throttling.
#[derive(Clone, Debug)]
pub struct Throttler {
    semaphore: Option<Arc<Semaphore>>,
    limit: usize,
}

impl Throttler {
    pub fn new(max_concurrent: usize) -> Self {
        let semaphore = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            semaphore,
            limit: max_concurrent,
        }
    }

    /// Unbounded throttler.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Wait for a slot. The slot is released when the returned permit drops.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.semaphore {
            // The semaphore is never closed, so acquisition only fails on shutdown
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Execute an operation while holding a slot.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let _permit = self.acquire().await;
        operation().await
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Available slots, or `usize::MAX` when unthrottled.
    pub fn available_permits(&self) -> usize {
        self.semaphore
            .as_ref()
            .map_or(usize::MAX, |s| s.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_throttling_limits_concurrency() {
        let throttler = Throttler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let max_concurrent = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..6 {
            let throttler = throttler.clone();
            let counter = counter.clone();
            let max_concurrent = max_concurrent.clone();

            tasks.push(tokio::spawn(async move {
                throttler
                    .execute(|| async {
                        let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        max_concurrent.fetch_max(current, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        counter.fetch_sub(1, Ordering::SeqCst);
                        Ok::<(), String>(())
                    })
                    .await
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(max_concurrent.load(Ordering::SeqCst) <= 2);
        assert_eq!(throttler.available_permits(), 2);
    }

    /// # Unlimited Throttler
    ///
    /// Tests that a zero limit disables throttling.
    ///
    /// ## Test Scenario
    /// - Creates a throttler with limit 0 and acquires a slot
    ///
    /// ## Expected Outcome
    /// - No permit is handed out and no capacity is reported as consumed
    #[tokio::test]
    async fn test_unlimited_throttler() {
        let throttler = Throttler::unlimited();
        assert!(throttler.acquire().await.is_none());
        assert_eq!(throttler.available_permits(), usize::MAX);
        assert_eq!(throttler.limit(), 0);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let throttler = Throttler::new(1);
        let permit = throttler.acquire().await;
        assert!(permit.is_some());
        assert_eq!(throttler.available_permits(), 0);
        drop(permit);
        assert_eq!(throttler.available_permits(), 1);
    }
}
