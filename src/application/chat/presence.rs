//! Presence registry - which users currently hold a session.
//!
//! Owned explicitly and shared through an `Arc`; there is no global state.
//! Registration is an atomic insert-if-absent so two connections racing
//! for the same id can never both be admitted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::UserId;

/// Set of user ids with an active session.
///
/// # Thread Safety
///
/// A plain `Mutex` guards the set. Every operation is a single short
/// critical section with no await inside, and `unregister` must be callable
/// from `Drop`.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    active: Mutex<HashSet<UserId>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the set half-updated, so
    // a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<UserId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `user_id` if absent.
    ///
    /// Returns `false` if the id is already active; the caller must then
    /// reject the new connection.
    pub fn try_register(&self, user_id: &UserId) -> bool {
        self.lock().insert(user_id.clone())
    }

    /// Remove `user_id`. Removing an absent id is a no-op.
    ///
    /// Returns whether the id was present.
    pub fn unregister(&self, user_id: &UserId) -> bool {
        self.lock().remove(user_id)
    }

    /// Snapshot membership check.
    ///
    /// Only good for routing decisions: the answer may be stale by the time
    /// the caller acts on it.
    pub fn is_active(&self, user_id: &UserId) -> bool {
        self.lock().contains(user_id)
    }

    /// Number of users currently active.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Register `user_id` and tie the registration to a guard.
    ///
    /// Returns `None` if the id is already active. Dropping the guard
    /// unregisters the id, so the release happens exactly once however the
    /// session ends, including task abort and panic.
    pub fn admit(self: &Arc<Self>, user_id: &UserId) -> Option<PresenceGuard> {
        if !self.try_register(user_id) {
            return None;
        }
        Some(PresenceGuard {
            registry: Arc::clone(self),
            user_id: user_id.clone(),
        })
    }
}

/// Proof of an active registration. Unregisters on drop.
#[derive(Debug)]
pub struct PresenceGuard {
    registry: Arc<PresenceRegistry>,
    user_id: UserId,
}

impl PresenceGuard {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        if !self.registry.unregister(&self.user_id) {
            tracing::error!(
                user_id = %self.user_id,
                "Presence entry vanished before its session closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn try_register_inserts_absent_user() {
        let registry = PresenceRegistry::new();

        assert!(registry.try_register(&user("alice")));
        assert!(registry.is_active(&user("alice")));
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn try_register_rejects_present_user() {
        let registry = PresenceRegistry::new();

        assert!(registry.try_register(&user("alice")));
        assert!(!registry.try_register(&user("alice")));
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = PresenceRegistry::new();
        registry.try_register(&user("alice"));

        assert!(registry.unregister(&user("alice")));
        assert!(!registry.unregister(&user("alice")));
        assert!(!registry.is_active(&user("alice")));
    }

    #[test]
    fn unregistered_user_can_register_again() {
        let registry = PresenceRegistry::new();
        registry.try_register(&user("alice"));
        registry.unregister(&user("alice"));

        assert!(registry.try_register(&user("alice")));
    }

    #[test]
    fn users_are_tracked_independently() {
        let registry = PresenceRegistry::new();
        registry.try_register(&user("alice"));

        assert!(registry.try_register(&user("bob")));
        registry.unregister(&user("alice"));
        assert!(registry.is_active(&user("bob")));
    }

    #[test]
    fn concurrent_registration_of_same_user_admits_exactly_one() {
        let registry = Arc::new(PresenceRegistry::new());
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let admitted = Arc::clone(&admitted);
                thread::spawn(move || {
                    if registry.try_register(&user("contested")) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn admit_returns_guard_that_unregisters_on_drop() {
        let registry = Arc::new(PresenceRegistry::new());

        let guard = registry.admit(&user("alice")).unwrap();
        assert_eq!(guard.user_id().as_str(), "alice");
        assert!(registry.is_active(&user("alice")));

        drop(guard);
        assert!(!registry.is_active(&user("alice")));
    }

    #[test]
    fn admit_refuses_active_user() {
        let registry = Arc::new(PresenceRegistry::new());
        let _guard = registry.admit(&user("alice")).unwrap();

        assert!(registry.admit(&user("alice")).is_none());
        assert!(registry.is_active(&user("alice")));
    }

    #[test]
    fn refused_admission_leaves_existing_registration_intact() {
        let registry = Arc::new(PresenceRegistry::new());
        let first = registry.admit(&user("alice")).unwrap();

        let second = registry.admit(&user("alice"));
        drop(second);

        assert!(registry.is_active(&user("alice")));
        drop(first);
        assert!(!registry.is_active(&user("alice")));
    }
}
