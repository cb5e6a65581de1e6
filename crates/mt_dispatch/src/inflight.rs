use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// URLs currently being dispatched.
///
/// Membership test and insert happen under one lock acquisition with no
/// await in between, so two tasks can never both claim the same URL. A claim
/// lives exactly as long as its guard; the per-stage timeouts bound how long
/// a dispatch can hold it.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic elsewhere cannot leave the set half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims `url`, or returns `None` if another dispatch holds it.
    /// The claim is released when the returned guard is dropped.
    pub fn try_acquire(&self, url: &str) -> Option<InFlightGuard> {
        if !self.lock().insert(url.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: self.clone(),
            url: url.to_string(),
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ownership of one in-flight URL.
#[derive(Debug)]
pub struct InFlightGuard {
    set: InFlightSet,
    url: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let set = InFlightSet::new();
        let url = "https://mihaaru.com/news/1";

        let guard = set.try_acquire(url).unwrap();
        assert!(set.contains(url));
        assert!(set.try_acquire(url).is_none());
        assert!(set.try_acquire("https://mihaaru.com/news/2").is_some());

        drop(guard);
        assert!(!set.contains(url));
        assert!(set.try_acquire(url).is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let set = InFlightSet::new();
        let other = set.clone();
        let _guard = set.try_acquire("https://mihaaru.com/news/1").unwrap();
        assert!(other.try_acquire("https://mihaaru.com/news/1").is_none());
        assert_eq!(other.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_running_claim_is_not_taken_over() {
        let set = InFlightSet::new();
        let url = "https://mihaaru.com/news/1";

        let held = set.try_acquire(url).unwrap();
        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert!(set.contains(url));
        assert!(set.try_acquire(url).is_none());

        drop(held);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_aborted_task_releases_claim() {
        let set = InFlightSet::new();
        let url = "https://mihaaru.com/news/1";

        let task_set = set.clone();
        let task = tokio::spawn(async move {
            let _guard = task_set.try_acquire(url).unwrap();
            std::future::pending::<()>().await;
        });
        while !set.contains(url) {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(set.is_empty());
    }
}
