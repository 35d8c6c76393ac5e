//! # Shared Registry Handle
//!
//! The registry itself does no locking: it relies on `&mut self` for
//! exclusive writes. Hosts that serve calls from several threads wrap it in
//! a `SharedRegistry`, which turns every call into one critical section.
//!
//! The lock is `parking_lot::RwLock`: non-poisoning, and never held across
//! an `.await` because registry calls are synchronous.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::registry::Registry;

/// Cloneable, thread-safe handle to one registry instance.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wrap a registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Run a read-only call. Concurrent readers proceed in parallel; each
    /// sees the registry between whole mutating calls, never inside one.
    pub fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutating call exclusively.
    pub fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Clone out the current state.
    pub fn snapshot(&self) -> Registry {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::registry::CallContext;
    use idreg_core::{Address, BlockHeight, Email, ExternalId};
    use idreg_state::NewStudent;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn concurrent_issuance_keeps_indexes_consistent() {
        let reg = Registry::new(RegistryConfig::default(), [addr("g1admin")]).unwrap();
        let shared = SharedRegistry::new(reg);

        let writers: Vec<_> = (0..4u64)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..25u64 {
                        let n = t * 100 + i;
                        let student = NewStudent {
                            full_name: format!("Student {n}"),
                            date_of_birth: "2003-01-01".to_string(),
                            email: Email::new(format!("s{n}@raf.rs")).unwrap(),
                            external_id: ExternalId::new(format!("2023/{n:04}")).unwrap(),
                            department: "Physics".to_string(),
                            year: 1,
                            enrolled_at: "2023-10-01".to_string(),
                        };
                        let ctx = CallContext::new(addr("g1admin"), BlockHeight::new(n + 1));
                        shared
                            .write(|r| r.issue(&ctx, &addr("g1holder"), student))
                            .unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    shared.read(|r| {
                        assert_eq!(r.ownership().len(), r.len());
                        assert_eq!(r.email_index().len(), r.len());
                        assert_eq!(r.external_id_index().len(), r.len());
                    });
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        let snap = shared.snapshot();
        assert_eq!(snap.len(), 100);
        assert_eq!(snap.balance_of(&addr("g1holder")), 100);
        assert!(snap.check_integrity().is_ok());
    }
}
