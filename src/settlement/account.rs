use crate::identity::PublicKey;
use crate::ledger::TokenId;
use crate::permissions::PermissionSet;
use crate::program::ProgramHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account is addressed by its owner key within one token namespace.
/// The same public key owns independent accounts in the base namespace and
/// in each derived namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId {
    pub public_key: PublicKey,
    pub token_id: TokenId,
}

impl AccountId {
    /// Address in the base currency namespace
    pub fn base(public_key: PublicKey) -> Self {
        Self {
            public_key,
            token_id: TokenId::BASE,
        }
    }

    /// Address in a derived token namespace
    pub fn in_namespace(public_key: PublicKey, token_id: TokenId) -> Self {
        Self {
            public_key,
            token_id,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.public_key, self.token_id)
    }
}

/// Application state recorded on an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountState {
    /// No application state; plain balance holder
    Plain,
    /// The controller singleton with its committed program hash
    Controller { storage_program_hash: ProgramHash },
    /// A provisioned sub-ledger with its monotonic counter
    SubLedger { minted_so_far: u64 },
}

impl AccountState {
    /// The sub-ledger counter, if this account is one
    pub fn minted_so_far(&self) -> Option<u64> {
        match self {
            AccountState::SubLedger { minted_so_far } => Some(*minted_so_far),
            _ => None,
        }
    }

    /// The committed program hash, if this account is the controller
    pub fn storage_program_hash(&self) -> Option<ProgramHash> {
        match self {
            AccountState::Controller {
                storage_program_hash,
            } => Some(*storage_program_hash),
            _ => None,
        }
    }
}

/// One settled account record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: u64,
    pub state: AccountState,
    /// Hash of the verification program bound to this account, if any
    pub program: Option<ProgramHash>,
    pub permissions: PermissionSet,
}

impl Account {
    /// A plain balance-holding account with the default permission template
    pub fn new_plain(id: AccountId, balance: u64) -> Self {
        Self {
            id,
            balance,
            state: AccountState::Plain,
            program: None,
            permissions: PermissionSet::user(),
        }
    }
}
