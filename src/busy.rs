use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "operation in progress" indicator.
///
/// The flag is only ever raised through a [`BusyGuard`], and the guard
/// lowers it when dropped, so no exit path can leave it set.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag, or `None` if it is already up.
    pub fn try_raise(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_lowers_flag_on_drop() {
        let flag = BusyFlag::new();
        assert!(!flag.is_set());
        {
            let _guard = flag.try_raise().unwrap();
            assert!(flag.is_set());
            assert!(flag.try_raise().is_none());
        }
        assert!(!flag.is_set());
        assert!(flag.try_raise().is_some());
    }

    #[test]
    fn clones_observe_the_same_flag() {
        let flag = BusyFlag::new();
        let observer = flag.clone();
        let guard = flag.try_raise().unwrap();
        assert!(observer.is_set());
        drop(guard);
        assert!(!observer.is_set());
    }
}
