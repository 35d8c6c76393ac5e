//! # Ownership Index
//!
//! `TokenId → Address`. One entry per issued token, written at issuance and
//! never removed or reassigned: tokens are non-transferable and graduation
//! leaves ownership alone.
//!
//! `balance_of` and `tokens_of` scan the whole index, O(n) in issued
//! tokens. That is an accepted cost at registry scale; a reverse index would
//! be a second collection to keep consistent.

use serde::{Deserialize, Serialize};

use idreg_core::{Address, TokenId};

use crate::store::OrderedStore;

/// Token holder index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipIndex {
    owners: OrderedStore<TokenId, Address>,
}

impl OwnershipIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder of `token`, if issued.
    pub fn owner_of(&self, token: &TokenId) -> Option<&Address> {
        self.owners.get(token)
    }

    /// Number of tokens held by `holder`. Linear scan.
    pub fn balance_of(&self, holder: &Address) -> usize {
        self.owners.iter().filter(|(_, owner)| *owner == holder).count()
    }

    /// Tokens held by `holder`, in token order. Linear scan.
    pub fn tokens_of(&self, holder: &Address) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == holder)
            .map(|(token, _)| token.clone())
            .collect()
    }

    /// Whether `token` has been issued.
    pub fn contains(&self, token: &TokenId) -> bool {
        self.owners.contains(token)
    }

    /// Total issued tokens.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no token has been issued.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// All `(token, holder)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, &Address)> {
        self.owners.iter()
    }

    /// Record the holder of a newly issued token.
    pub(crate) fn assign(&mut self, token: TokenId, holder: Address) {
        self.owners.insert(token, holder);
    }
}
