use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

/// Mutual-exclusion token that agents negotiate for, e.g. right of way at an intersection.
pub trait PriorityArbiter {
    /// Grant priority if it is free or already held by `claimant`.
    fn request(&self, claimant: &str) -> bool;

    /// Give up priority. Only the current holder can release it.
    fn release(&self, claimant: &str) -> bool;

    /// Whether `claimant` currently holds priority.
    fn has(&self, claimant: &str) -> bool;

    /// Whether anyone currently holds priority.
    fn is_claimed(&self) -> bool;
}

/// A [`PriorityArbiter`] safe to share between threads.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::{PriorityArbiter, PriorityManager};
///
/// let priority = PriorityManager::new();
///
/// assert!(priority.request("ego"));
/// assert!(!priority.request("car1"));
/// assert!(!priority.release("car1"));
/// assert!(priority.release("ego"));
/// assert!(priority.request("car1"));
/// ```
#[derive(Debug, Default)]
pub struct PriorityManager {
    owner: Mutex<Option<String>>,
}

impl PriorityManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current holder, if any.
    pub fn owner(&self) -> Option<String> {
        self.lock().clone()
    }
}

impl PriorityArbiter for PriorityManager {
    fn request(&self, claimant: &str) -> bool {
        let mut owner = self.lock();

        match owner.as_deref() {
            Some(current) => current == claimant,
            None => {
                debug!("priority granted to {}", claimant);
                *owner = Some(claimant.to_string());
                true
            }
        }
    }

    fn release(&self, claimant: &str) -> bool {
        let mut owner = self.lock();

        if owner.as_deref() == Some(claimant) {
            debug!("priority released by {}", claimant);
            *owner = None;
            true
        } else {
            false
        }
    }

    fn has(&self, claimant: &str) -> bool {
        self.lock().as_deref() == Some(claimant)
    }

    fn is_claimed(&self) -> bool {
        self.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::{PriorityArbiter, PriorityManager};

    #[test]
    fn holder_keeps_priority_until_release() {
        let priority = PriorityManager::new();

        assert!(!priority.is_claimed());
        assert!(priority.request("ego"));
        assert!(priority.request("ego"));
        assert!(priority.has("ego"));
        assert!(!priority.has("car1"));
        assert!(!priority.request("car1"));
        assert!(!priority.release("car1"));
        assert_eq!(priority.owner(), Some("ego".to_string()));

        assert!(priority.release("ego"));
        assert!(!priority.is_claimed());
        assert!(!priority.release("ego"));
    }

    #[test]
    fn exactly_one_concurrent_claimant_wins() {
        let priority = PriorityManager::new();
        let claimants = (0..8).map(|index| format!("car{}", index)).collect::<Vec<_>>();

        let shared = &priority;

        let granted = thread::scope(|scope| {
            let handles = claimants
                .iter()
                .map(|claimant| scope.spawn(move || shared.request(claimant)))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(false))
                .filter(|granted| *granted)
                .count()
        });

        assert_eq!(granted, 1);
        assert!(priority.is_claimed());
    }
}
