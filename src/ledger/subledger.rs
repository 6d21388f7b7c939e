use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("claimed locked amount {locked_so_far} is below already-minted {minted_so_far}")]
    UnderflowViolation {
        locked_so_far: u64,
        minted_so_far: u64,
    },

    #[error("nothing new to mint: claimed locked amount equals the minted amount")]
    ZeroMintRejected,
}

/// A completed counter transition: old value, new value, and the balance
/// credit they imply. Produced by [`SubLedger::prepare_mint`] and applied
/// separately, so the same logic runs in the proof-verification path and in
/// a plain harness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintTransition {
    owner: PublicKey,
    previous_minted: u64,
    new_minted: u64,
    credit: u64,
}

impl MintTransition {
    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn previous_minted(&self) -> u64 {
        self.previous_minted
    }

    pub fn new_minted(&self) -> u64 {
        self.new_minted
    }

    /// The balance credit, always `new_minted - previous_minted`
    pub fn credit(&self) -> u64 {
        self.credit
    }
}

/// Per-account mint accounting
///
/// `minted_so_far` is the cumulative amount ever credited for this owner.
/// It only moves forward: a claimed locked amount below it is an underflow
/// violation, equal to it is a zero mint. On success the counter jumps to
/// the claimed amount and the difference is the credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLedger {
    owner: PublicKey,
    minted_so_far: u64,
}

impl SubLedger {
    /// Fresh sub-ledger with a zero counter
    pub fn new(owner: PublicKey) -> Self {
        Self {
            owner,
            minted_so_far: 0,
        }
    }

    /// Sub-ledger at a recorded counter value
    pub fn with_minted(owner: PublicKey, minted_so_far: u64) -> Self {
        Self {
            owner,
            minted_so_far,
        }
    }

    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn minted_so_far(&self) -> u64 {
        self.minted_so_far
    }

    /// Validate a claimed locked amount against the counter without
    /// touching state. Fails before any mutation would happen.
    pub fn prepare_mint(&self, locked_so_far: u64) -> Result<MintTransition, MintError> {
        let minted_so_far = self.minted_so_far;
        let credit = locked_so_far
            .checked_sub(minted_so_far)
            .ok_or(MintError::UnderflowViolation {
                locked_so_far,
                minted_so_far,
            })?;
        if credit == 0 {
            return Err(MintError::ZeroMintRejected);
        }
        Ok(MintTransition {
            owner: self.owner.clone(),
            previous_minted: minted_so_far,
            new_minted: locked_so_far,
            credit,
        })
    }

    /// Advance the counter to a prepared transition's new value
    pub fn apply(&mut self, transition: &MintTransition) {
        debug_assert_eq!(transition.previous_minted, self.minted_so_far);
        self.minted_so_far = transition.new_minted;
    }

    /// Prepare and apply in one step, returning the credited amount
    pub fn increase_minted_amount(&mut self, locked_so_far: u64) -> Result<u64, MintError> {
        let transition = self.prepare_mint(locked_so_far)?;
        self.apply(&transition);
        debug!(
            owner = %self.owner,
            minted_so_far = self.minted_so_far,
            credit = transition.credit,
            "sub-ledger counter advanced"
        );
        Ok(transition.credit)
    }
}
