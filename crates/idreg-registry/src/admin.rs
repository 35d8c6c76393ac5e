//! # Admin Set
//!
//! The addresses allowed to mutate the registry.
//!
//! ## Invariant
//!
//! The set is never empty. It is seeded non-empty at construction, and
//! removal refuses to take out the last member. Addition only rejects
//! duplicates.

use serde::{Deserialize, Serialize};

use idreg_core::{Address, BlockHeight};

use crate::error::RegistryError;
use crate::store::OrderedStore;

/// Provenance of an admin entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGrant {
    /// Admin that added this entry; `None` for the initial seed.
    pub granted_by: Option<Address>,
    /// Height of the call that added it.
    pub granted_at: BlockHeight,
}

/// Non-empty set of admin addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminSet {
    admins: OrderedStore<Address, AdminGrant>,
}

impl AdminSet {
    /// Seed the set. Duplicates collapse into one entry.
    ///
    /// # Errors
    ///
    /// `EmptyAdminSet` if `initial` yields no address.
    pub fn seeded(initial: impl IntoIterator<Item = Address>) -> Result<Self, RegistryError> {
        let mut admins = OrderedStore::new();
        for addr in initial {
            admins.insert(
                addr,
                AdminGrant {
                    granted_by: None,
                    granted_at: BlockHeight::GENESIS,
                },
            );
        }
        if admins.is_empty() {
            return Err(RegistryError::EmptyAdminSet);
        }
        Ok(Self { admins })
    }

    /// Whether `addr` is an admin.
    pub fn is_admin(&self, addr: &Address) -> bool {
        self.admins.contains(addr)
    }

    /// Fail with `Unauthorized` unless `caller` is an admin.
    pub fn authorize(&self, caller: &Address) -> Result<(), RegistryError> {
        if !self.is_admin(caller) {
            return Err(RegistryError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Number of admins. Always ≥ 1.
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Always `false`; present for API symmetry with the other collections.
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Admin addresses in order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.admins.keys()
    }

    /// Provenance of an admin entry.
    pub fn grant(&self, addr: &Address) -> Option<&AdminGrant> {
        self.admins.get(addr)
    }

    /// Add `new_admin` on behalf of `caller`.
    pub(crate) fn add(
        &mut self,
        caller: &Address,
        new_admin: &Address,
        height: BlockHeight,
    ) -> Result<(), RegistryError> {
        self.authorize(caller)?;
        if self.is_admin(new_admin) {
            return Err(RegistryError::AdminExists(new_admin.clone()));
        }
        self.admins.insert(
            new_admin.clone(),
            AdminGrant {
                granted_by: Some(caller.clone()),
                granted_at: height,
            },
        );
        Ok(())
    }

    /// Remove `target` on behalf of `caller`.
    ///
    /// Checks run in order: authorization, membership, last-admin
    /// protection, self-removal. The last-admin guard runs before the
    /// self-removal guard so that a sole admin trying to remove itself is
    /// told why the set cannot shrink.
    pub(crate) fn remove(&mut self, caller: &Address, target: &Address) -> Result<(), RegistryError> {
        self.authorize(caller)?;
        if !self.is_admin(target) {
            return Err(RegistryError::AdminNotFound(target.clone()));
        }
        if self.admins.len() <= 1 {
            return Err(RegistryError::LastAdminProtected(target.clone()));
        }
        if caller == target {
            return Err(RegistryError::SelfRemoval(target.clone()));
        }
        self.admins.remove(target);
        Ok(())
    }
}
