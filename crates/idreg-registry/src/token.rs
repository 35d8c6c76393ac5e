//! # Token View
//!
//! The registry exposes each record as a token under the usual
//! non-fungible-token read interface: name, symbol, supply, balances,
//! owners, URIs.
//!
//! The mutation half of that interface exists only to satisfy the contract.
//! Records are non-transferable, so `transfer_from`, `safe_transfer_from`,
//! `approve`, and `set_approval_for_all` fail unconditionally with
//! [`RegistryError::NonTransferable`], whatever the caller or token, and
//! never touch a store.

use idreg_core::{Address, TokenId};

use crate::error::RegistryError;
use crate::registry::{CallContext, Registry};

impl Registry {
    /// Collection name.
    pub fn name(&self) -> &str {
        &self.config().token_name
    }

    /// Collection symbol.
    pub fn symbol(&self) -> &str {
        &self.config().token_symbol
    }

    /// Number of issued tokens.
    pub fn total_supply(&self) -> usize {
        self.ownership().len()
    }

    /// Tokens held by `holder`. O(n) scan of the ownership index.
    pub fn balance_of(&self, holder: &Address) -> usize {
        self.ownership().balance_of(holder)
    }

    /// Holder of `token`.
    pub fn owner_of(&self, token: &TokenId) -> Result<Address, RegistryError> {
        self.ownership()
            .owner_of(token)
            .cloned()
            .ok_or_else(|| RegistryError::InvalidToken(token.clone()))
    }

    /// Metadata URI of `token`.
    pub fn token_uri(&self, token: &TokenId) -> Result<String, RegistryError> {
        self.token_uris()
            .get(token)
            .cloned()
            .ok_or_else(|| RegistryError::InvalidToken(token.clone()))
    }

    /// Approved operator of `token`. Always `None` for an issued token.
    pub fn get_approved(&self, token: &TokenId) -> Result<Option<Address>, RegistryError> {
        if !self.ownership().contains(token) {
            return Err(RegistryError::InvalidToken(token.clone()));
        }
        Ok(None)
    }

    /// Always `false`: no operator is ever approved.
    pub fn is_approved_for_all(&self, _owner: &Address, _operator: &Address) -> bool {
        false
    }

    /// Always fails: tokens are non-transferable.
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        _from: &Address,
        _to: &Address,
        token: &TokenId,
    ) -> Result<(), RegistryError> {
        disabled("transfer_from", ctx, token)
    }

    /// Always fails: tokens are non-transferable.
    pub fn safe_transfer_from(
        &mut self,
        ctx: &CallContext,
        _from: &Address,
        _to: &Address,
        token: &TokenId,
    ) -> Result<(), RegistryError> {
        disabled("safe_transfer_from", ctx, token)
    }

    /// Always fails: approvals do not exist.
    pub fn approve(
        &mut self,
        ctx: &CallContext,
        _approved: &Address,
        token: &TokenId,
    ) -> Result<(), RegistryError> {
        disabled("approve", ctx, token)
    }

    /// Always fails: operators do not exist.
    pub fn set_approval_for_all(
        &mut self,
        ctx: &CallContext,
        operator: &Address,
        _approved: bool,
    ) -> Result<(), RegistryError> {
        tracing::debug!(caller = %ctx.caller, %operator, "set_approval_for_all refused");
        Err(RegistryError::NonTransferable {
            operation: "set_approval_for_all",
        })
    }
}

fn disabled(operation: &'static str, ctx: &CallContext, token: &TokenId) -> Result<(), RegistryError> {
    tracing::debug!(operation, caller = %ctx.caller, %token, "token mutation refused");
    Err(RegistryError::NonTransferable { operation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::error::ErrorKind;
    use idreg_core::{BlockHeight, Email, ExternalId};
    use idreg_state::NewStudent;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn setup() -> (Registry, CallContext, TokenId) {
        let mut reg = Registry::new(RegistryConfig::default(), [addr("g1admin")]).unwrap();
        let ctx = CallContext::new(addr("g1admin"), BlockHeight::new(1));
        let token = reg
            .issue(
                &ctx,
                &addr("g1john"),
                NewStudent {
                    full_name: "John Doe".to_string(),
                    date_of_birth: "2002-03-14".to_string(),
                    email: Email::new("john@raf.rs").unwrap(),
                    external_id: ExternalId::new("2021/0001").unwrap(),
                    department: "Computer Science".to_string(),
                    year: 1,
                    enrolled_at: "2021-10-01".to_string(),
                },
            )
            .unwrap();
        (reg, ctx, token)
    }

    #[test]
    fn metadata_and_queries() {
        let (reg, _, token) = setup();
        assert_eq!(reg.name(), "Student Identity");
        assert_eq!(reg.symbol(), "SID");
        assert_eq!(reg.total_supply(), 1);
        assert_eq!(reg.balance_of(&addr("g1john")), 1);
        assert_eq!(reg.owner_of(&token).unwrap(), addr("g1john"));
        assert_eq!(reg.token_uri(&token).unwrap(), reg.config().default_image_url);
        assert_eq!(reg.get_approved(&token).unwrap(), None);
        assert!(!reg.is_approved_for_all(&addr("g1john"), &addr("g1admin")));
    }

    #[test]
    fn unknown_token_is_invalid() {
        let (reg, _, _) = setup();
        let ghost: TokenId = "2099/0001".parse().unwrap();
        assert_eq!(reg.owner_of(&ghost), Err(RegistryError::InvalidToken(ghost.clone())));
        assert!(reg.token_uri(&ghost).is_err());
        assert!(reg.get_approved(&ghost).is_err());
    }

    #[test]
    fn mutation_surface_is_disabled() {
        let (mut reg, ctx, token) = setup();
        let snapshot = reg.clone();
        let ghost: TokenId = "2099/0001".parse().unwrap();

        let results = [
            reg.transfer_from(&ctx, &addr("g1john"), &addr("g1eve"), &token),
            reg.safe_transfer_from(&ctx, &addr("g1john"), &addr("g1eve"), &ghost),
            reg.approve(&ctx, &addr("g1eve"), &token),
            reg.set_approval_for_all(&ctx, &addr("g1eve"), true),
        ];
        for r in results {
            assert_eq!(r.unwrap_err().kind(), ErrorKind::Unsupported);
        }
        assert_eq!(reg, snapshot);
    }
}
