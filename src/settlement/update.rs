use crate::identity::{Keypair, Signature};
use crate::permissions::{AuthorizationKind, Permission, PermissionSet};
use crate::program::ProgramHash;
use crate::settlement::{AccountId, AccountState};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain prefix for account update digests
const UPDATE_DIGEST_PREFIX: &[u8] = b"lockmint:update:";

// ===== Preconditions =====

/// Assertions about an account's pre-state. Every populated field must hold
/// at application time or the whole transaction is rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preconditions {
    /// The account must not exist yet
    pub is_new: Option<bool>,
    /// Minimum balance the account must hold
    pub balance_at_least: Option<u64>,
    /// Exact sub-ledger counter the account must record
    pub minted_so_far: Option<u64>,
    /// Exact program hash the controller account must have committed
    pub storage_program_hash: Option<ProgramHash>,
}

impl Preconditions {
    pub fn none() -> Self {
        Self::default()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        encode_opt_bool(self.is_new, out);
        encode_opt_u64(self.balance_at_least, out);
        encode_opt_u64(self.minted_so_far, out);
        encode_opt_hash(self.storage_program_hash, out);
    }
}

// ===== Effects =====

/// State changes an update applies once every check has passed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    /// Overwrite the account's application state
    pub set_state: Option<AccountState>,
    /// Bind a verification program to the account
    pub set_program: Option<ProgramHash>,
    /// Install a permission set on the account
    pub set_permissions: Option<PermissionSet>,
    /// Credit the account's balance
    pub balance_credit: Option<u64>,
    /// Debit the account's balance
    pub balance_debit: Option<u64>,
}

impl Effects {
    pub fn none() -> Self {
        Self::default()
    }

    /// True when the update touches the account without changing it
    pub fn is_empty(&self) -> bool {
        self.set_state.is_none()
            && self.set_program.is_none()
            && self.set_permissions.is_none()
            && self.balance_credit.is_none()
            && self.balance_debit.is_none()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match &self.set_state {
            None => out.push(0),
            Some(state) => {
                out.push(1);
                encode_state(state, out);
            }
        }
        encode_opt_hash(self.set_program, out);
        match &self.set_permissions {
            None => out.push(0),
            Some(set) => {
                out.push(1);
                encode_permission_set(set, out);
            }
        }
        encode_opt_u64(self.balance_credit, out);
        encode_opt_u64(self.balance_debit, out);
    }
}

// ===== Authorization =====

/// How an account update is authenticated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    /// No authentication attached
    None,
    /// Owner signature over the update's signing bytes
    Signature(Signature),
    /// Claimed execution of the named verification program; the settlement
    /// layer re-verifies the update against the registered program
    Proof { program_hash: ProgramHash },
    /// Proof that additionally carries the owner's signature as a public
    /// witness, binding the update to the account holder
    SignedProof {
        program_hash: ProgramHash,
        signature: Signature,
    },
}

impl Authorization {
    pub fn kind(&self) -> AuthorizationKind {
        match self {
            Authorization::None => AuthorizationKind::None,
            Authorization::Signature(_) => AuthorizationKind::Signature,
            Authorization::Proof { .. } | Authorization::SignedProof { .. } => {
                AuthorizationKind::Proof
            }
        }
    }

    /// The program hash named by a proof authorization, if any
    pub fn program_hash(&self) -> Option<ProgramHash> {
        match self {
            Authorization::Proof { program_hash }
            | Authorization::SignedProof { program_hash, .. } => Some(*program_hash),
            _ => None,
        }
    }
}

// ===== Account update =====

/// A declarative precondition/effect pair against one account, plus the
/// child updates it approves. Transactions are forests of these; nothing
/// happens outside one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub account: AccountId,
    pub preconditions: Preconditions,
    pub effects: Effects,
    pub authorization: Authorization,
    pub children: Vec<AccountUpdate>,
}

impl AccountUpdate {
    /// Deterministic serialization of everything a signer commits to:
    /// account, preconditions, effects, and child digests. Authorizations
    /// are excluded at every level, so attaching one never invalidates a
    /// signature already made.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(self.account.public_key.as_bytes());
        bytes.extend_from_slice(self.account.token_id.as_bytes());

        self.preconditions.encode_into(&mut bytes);
        self.effects.encode_into(&mut bytes);

        bytes.extend_from_slice(&(self.children.len() as u32).to_le_bytes());
        for child in &self.children {
            bytes.extend_from_slice(&child.digest());
        }

        bytes
    }

    /// Content digest of this update (authorization excluded)
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(UPDATE_DIGEST_PREFIX);
        hasher.update(self.signing_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    /// Attach the owner's signature. Call after all children are in place;
    /// the signature covers their digests.
    pub fn authorize_signature(mut self, keypair: &Keypair) -> Self {
        let signature = keypair.sign(&self.signing_bytes());
        self.authorization = Authorization::Signature(signature);
        self
    }

    /// Attach a bare proof claim for the named program
    pub fn authorize_proof(mut self, program_hash: ProgramHash) -> Self {
        self.authorization = Authorization::Proof { program_hash };
        self
    }

    /// Attach a proof claim carrying the owner's co-signature witness
    pub fn authorize_signed_proof(mut self, program_hash: ProgramHash, keypair: &Keypair) -> Self {
        let signature = keypair.sign(&self.signing_bytes());
        self.authorization = Authorization::SignedProof {
            program_hash,
            signature,
        };
        self
    }
}

/// Builder for account updates
pub struct AccountUpdateBuilder {
    update: AccountUpdate,
}

impl AccountUpdateBuilder {
    pub fn new(account: AccountId) -> Self {
        Self {
            update: AccountUpdate {
                account,
                preconditions: Preconditions::none(),
                effects: Effects::none(),
                authorization: Authorization::None,
                children: Vec::new(),
            },
        }
    }

    /// Require that the account does not exist yet
    pub fn require_new(mut self) -> Self {
        self.update.preconditions.is_new = Some(true);
        self
    }

    pub fn require_balance_at_least(mut self, amount: u64) -> Self {
        self.update.preconditions.balance_at_least = Some(amount);
        self
    }

    pub fn require_minted_so_far(mut self, value: u64) -> Self {
        self.update.preconditions.minted_so_far = Some(value);
        self
    }

    pub fn require_storage_program_hash(mut self, hash: ProgramHash) -> Self {
        self.update.preconditions.storage_program_hash = Some(hash);
        self
    }

    pub fn set_state(mut self, state: AccountState) -> Self {
        self.update.effects.set_state = Some(state);
        self
    }

    pub fn install_program(mut self, hash: ProgramHash) -> Self {
        self.update.effects.set_program = Some(hash);
        self
    }

    pub fn install_permissions(mut self, set: PermissionSet) -> Self {
        self.update.effects.set_permissions = Some(set);
        self
    }

    pub fn credit(mut self, amount: u64) -> Self {
        self.update.effects.balance_credit = Some(amount);
        self
    }

    pub fn debit(mut self, amount: u64) -> Self {
        self.update.effects.balance_debit = Some(amount);
        self
    }

    /// Attach an approved child update
    pub fn child(mut self, child: AccountUpdate) -> Self {
        self.update.children.push(child);
        self
    }

    /// Finish with no authorization attached
    pub fn build(self) -> AccountUpdate {
        self.update
    }
}

// ===== Transaction =====

/// An atomic forest of account updates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    updates: Vec<AccountUpdate>,
}

impl Transaction {
    pub fn new(updates: Vec<AccountUpdate>) -> Self {
        Self { updates }
    }

    pub fn single(update: AccountUpdate) -> Self {
        Self {
            updates: vec![update],
        }
    }

    pub fn updates(&self) -> &[AccountUpdate] {
        &self.updates
    }

    /// Total update count including children
    pub fn update_count(&self) -> usize {
        fn count(updates: &[AccountUpdate]) -> usize {
            updates.iter().map(|u| 1 + count(&u.children)).sum()
        }
        count(&self.updates)
    }
}

// ===== Encoding helpers =====

fn encode_opt_bool(value: Option<bool>, out: &mut Vec<u8>) {
    match value {
        None => out.push(0),
        Some(b) => {
            out.push(1);
            out.push(b as u8);
        }
    }
}

fn encode_opt_u64(value: Option<u64>, out: &mut Vec<u8>) {
    match value {
        None => out.push(0),
        Some(v) => {
            out.push(1);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

fn encode_opt_hash(value: Option<ProgramHash>, out: &mut Vec<u8>) {
    match value {
        None => out.push(0),
        Some(h) => {
            out.push(1);
            out.extend_from_slice(h.as_bytes());
        }
    }
}

fn encode_state(state: &AccountState, out: &mut Vec<u8>) {
    match state {
        AccountState::Plain => out.push(0),
        AccountState::Controller {
            storage_program_hash,
        } => {
            out.push(1);
            out.extend_from_slice(storage_program_hash.as_bytes());
        }
        AccountState::SubLedger { minted_so_far } => {
            out.push(2);
            out.extend_from_slice(&minted_so_far.to_le_bytes());
        }
    }
}

fn encode_permission(permission: Permission, out: &mut Vec<u8>) {
    out.push(match permission {
        Permission::None => 0,
        Permission::Signature => 1,
        Permission::Proof => 2,
        Permission::Impossible => 3,
    });
}

fn encode_permission_set(set: &PermissionSet, out: &mut Vec<u8>) {
    encode_permission(set.edit_state, out);
    encode_permission(set.send, out);
    encode_permission(set.set_program, out);
    encode_permission(set.set_permissions, out);
    encode_permission(set.access, out);
}
