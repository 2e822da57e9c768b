//! In-memory host ledger.
//!
//! A reference [`AssetTransfer`] + [`Transactional`] implementation holding
//! native balances, fungible balances, non-fungible ownership,
//! semi-fungible balances and operator approvals. The marketplace acts as
//! the single operator; its own native balance is the escrow for value
//! supplied with a call.
//!
//! ## Supply conservation
//!
//! Native value only enters through [`InMemoryLedger::mint_native`].
//! Settlement moves value between accounts, so
//! `∑ balances == ∑ minted` must hold after every call
//! ([`InMemoryLedger::verify_native_supply`]).

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use tradeport_types::{TradeportError, TransferError};

use crate::host::{AssetTransfer, Transactional};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    native: HashMap<Address, U256>,
    /// `(token, owner) → balance`
    fungible: HashMap<(Address, Address), U256>,
    /// `(collection, token_id) → owner`
    non_fungible: HashMap<(Address, U256), Address>,
    /// `(token, token_id, owner) → balance`
    semi_fungible: HashMap<(Address, U256, Address), U256>,
    /// `(token, owner)` pairs that approved the operator.
    approvals: HashSet<(Address, Address)>,
    native_minted: U256,
}

/// Balances and ownership with snapshot-based transactions.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    operator: Address,
    state: LedgerState,
    snapshot: Option<LedgerState>,
}

impl InMemoryLedger {
    /// `operator` is the marketplace identity (its verifying contract).
    #[must_use]
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            state: LedgerState::default(),
            snapshot: None,
        }
    }

    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    // -----------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------

    pub fn mint_native(&mut self, account: Address, amount: U256) {
        *self.state.native.entry(account).or_default() += amount;
        self.state.native_minted += amount;
    }

    pub fn mint_fungible(&mut self, token: Address, owner: Address, amount: U256) {
        *self.state.fungible.entry((token, owner)).or_default() += amount;
    }

    pub fn mint_non_fungible(&mut self, collection: Address, token_id: U256, owner: Address) {
        self.state.non_fungible.insert((collection, token_id), owner);
    }

    pub fn mint_semi_fungible(
        &mut self,
        token: Address,
        token_id: U256,
        owner: Address,
        amount: U256,
    ) {
        *self
            .state
            .semi_fungible
            .entry((token, token_id, owner))
            .or_default() += amount;
    }

    /// Grant or revoke the operator's right to move `owner`'s `token` assets.
    pub fn set_approval(&mut self, token: Address, owner: Address, approved: bool) {
        if approved {
            self.state.approvals.insert((token, owner));
        } else {
            self.state.approvals.remove(&(token, owner));
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn native_balance(&self, account: Address) -> U256 {
        self.state.native.get(&account).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn fungible_balance(&self, token: Address, owner: Address) -> U256 {
        self.state
            .fungible
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn owner_of(&self, collection: Address, token_id: U256) -> Option<Address> {
        self.state.non_fungible.get(&(collection, token_id)).copied()
    }

    #[must_use]
    pub fn semi_fungible_balance(&self, token: Address, token_id: U256, owner: Address) -> U256 {
        self.state
            .semi_fungible
            .get(&(token, token_id, owner))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_approved(&self, token: Address, owner: Address) -> bool {
        self.state.approvals.contains(&(token, owner))
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Check `∑ native balances == ∑ minted`.
    pub fn verify_native_supply(&self) -> tradeport_types::Result<()> {
        let actual = self
            .state
            .native
            .values()
            .try_fold(U256::ZERO, |acc, v| acc.checked_add(*v))
            .ok_or(TradeportError::ArithmeticOverflow)?;
        if actual != self.state.native_minted {
            return Err(TradeportError::Internal(format!(
                "native supply violated: minted {}, held {actual}",
                self.state.native_minted
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn require_approval(&self, token: Address, owner: Address) -> Result<(), TransferError> {
        if self.is_approved(token, owner) {
            Ok(())
        } else {
            Err(TransferError::NotApproved {
                token,
                owner,
                operator: self.operator,
            })
        }
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TransferError> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        self.state.native.insert(from, available - amount);
        *self.state.native.entry(to).or_default() += amount;
        Ok(())
    }
}

impl AssetTransfer for InMemoryLedger {
    fn receive_value(&mut self, from: Address, amount: U256) -> Result<(), TransferError> {
        self.move_native(from, self.operator, amount)
    }

    fn send_value(&mut self, to: Address, amount: U256) -> Result<(), TransferError> {
        self.move_native(self.operator, to, amount)
    }

    fn transfer_fungible(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.require_approval(token, from)?;
        let available = self.fungible_balance(token, from);
        if available < amount {
            return Err(TransferError::InsufficientTokenBalance {
                token,
                account: from,
                needed: amount,
                available,
            });
        }
        self.state.fungible.insert((token, from), available - amount);
        *self.state.fungible.entry((token, to)).or_default() += amount;
        Ok(())
    }

    fn transfer_non_fungible(
        &mut self,
        collection: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), TransferError> {
        if self.owner_of(collection, token_id) != Some(from) {
            return Err(TransferError::NotOwner {
                collection,
                token_id,
                from,
            });
        }
        self.require_approval(collection, from)?;
        self.state.non_fungible.insert((collection, token_id), to);
        Ok(())
    }

    fn transfer_semi_fungible(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.require_approval(token, from)?;
        let available = self.semi_fungible_balance(token, token_id, from);
        if available < amount {
            return Err(TransferError::InsufficientTokenBalance {
                token,
                account: from,
                needed: amount,
                available,
            });
        }
        self.state
            .semi_fungible
            .insert((token, token_id, from), available - amount);
        *self
            .state
            .semi_fungible
            .entry((token, token_id, to))
            .or_default() += amount;
        Ok(())
    }
}

impl Transactional for InMemoryLedger {
    fn begin(&mut self) {
        debug_assert!(self.snapshot.is_none(), "nested ledger transaction");
        self.snapshot = Some(self.state.clone());
    }

    fn commit(&mut self) {
        self.snapshot = None;
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
    }
}
