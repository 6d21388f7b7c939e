use crate::controller::{ControllerConfig, ControllerProgram};
use crate::identity::{Keypair, PublicKey};
use crate::ledger::{MintError, SubLedger, TokenId};
use crate::permissions::{Permission, PermissionSet};
use crate::program::{ProgramHash, VerificationProgram};
use crate::settlement::{
    AccountId, AccountState, AccountUpdateBuilder, LocalChain, SettlementError, Transaction,
    TransitionProgram,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("proposed program {proposed} does not match the committed hash {committed}")]
    ProgramMismatch {
        committed: ProgramHash,
        proposed: ProgramHash,
    },

    #[error("bulk approval of caller-supplied update forests is not supported")]
    UnsupportedBulkApproval,

    #[error("no sub-ledger provisioned for {0}")]
    StorageNotProvisioned(String),

    #[error("unsupported access policy: {0}")]
    UnsupportedAccessPolicy(Permission),

    #[error("mint rejected: {0}")]
    Mint(#[from] MintError),

    #[error("settlement rejected: {0}")]
    Settlement(#[from] SettlementError),
}

/// Persisted deployment record, enough to rebuild a [`Controller`] handle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerRecord {
    pub address: PublicKey,
    pub storage_program_hash: ProgramHash,
    pub access: Permission,
}

/// Handle to the deployed controller singleton
///
/// The controller owns a token namespace and is the only party that can
/// approve updates inside it. It commits to one verification program hash
/// at deploy time; provisioning installs exactly that program on each
/// sub-ledger, and minting relays counter transitions proved under it.
pub struct Controller {
    address: PublicKey,
    token_id: TokenId,
    storage_program_hash: ProgramHash,
    program_hash: ProgramHash,
    access: Permission,
}

impl Controller {
    /// Deploy the controller account and register its verification program.
    /// One-time per address; a second deploy meets the existing account.
    pub fn deploy(
        chain: &mut LocalChain,
        keypair: &Keypair,
        config: ControllerConfig,
    ) -> Result<Self, ControllerError> {
        config.validate()?;

        let program = ControllerProgram::new();
        let program_hash = program.hash();
        let address = keypair.public_key();
        let token_id = TokenId::derive(&address);

        let update = AccountUpdateBuilder::new(AccountId::base(address.clone()))
            .require_new()
            .set_state(AccountState::Controller {
                storage_program_hash: config.storage_program_hash,
            })
            .install_program(program_hash)
            .install_permissions(PermissionSet::controller(config.access))
            .build()
            .authorize_signature(keypair);

        chain.apply(&Transaction::single(update))?;
        chain.register_program(Arc::new(program));

        info!(
            controller = %address,
            committed = %config.storage_program_hash,
            access = %config.access,
            "controller deployed"
        );

        Ok(Self {
            address,
            token_id,
            storage_program_hash: config.storage_program_hash,
            program_hash,
            access: config.access,
        })
    }

    /// Provision a sub-ledger for the given owner
    ///
    /// The proposed program must hash to the committed value; the check
    /// runs here before any transaction is built and is pinned again as an
    /// on-chain precondition. The owner co-signs the creation of their own
    /// sub-ledger account.
    pub fn set_up_storage(
        &self,
        chain: &mut LocalChain,
        owner: &Keypair,
        proposed_program: &VerificationProgram,
    ) -> Result<(), ControllerError> {
        let proposed = proposed_program.hash();
        if proposed != self.storage_program_hash {
            warn!(
                committed = %self.storage_program_hash,
                proposed = %proposed,
                "provisioning refused: program mismatch"
            );
            return Err(ControllerError::ProgramMismatch {
                committed: self.storage_program_hash,
                proposed,
            });
        }

        let storage_update =
            AccountUpdateBuilder::new(AccountId::in_namespace(owner.public_key(), self.token_id))
                .require_new()
                .set_state(AccountState::SubLedger { minted_so_far: 0 })
                .install_program(proposed)
                .install_permissions(PermissionSet::sub_ledger())
                .build()
                .authorize_signature(owner);

        let controller_update = AccountUpdateBuilder::new(AccountId::base(self.address.clone()))
            .require_storage_program_hash(self.storage_program_hash)
            .child(storage_update)
            .build()
            .authorize_proof(self.program_hash);

        chain.apply(&Transaction::single(controller_update))?;

        info!(owner = %owner.public_key(), "sub-ledger provisioned");
        Ok(())
    }

    /// Relay a mint against the caller's sub-ledger
    ///
    /// `amount_to_mint` is the claimed cumulative locked amount. The caller
    /// must hold the account key: their signature rides inside the mint
    /// proof as a public witness. Returns the freshly credited difference.
    pub fn mint(
        &self,
        chain: &mut LocalChain,
        caller: &Keypair,
        amount_to_mint: u64,
    ) -> Result<u64, ControllerError> {
        let caller_key = caller.public_key();
        let storage_id = AccountId::in_namespace(caller_key.clone(), self.token_id);

        let recorded = chain
            .account(&storage_id)
            .and_then(|account| account.state.minted_so_far())
            .ok_or_else(|| ControllerError::StorageNotProvisioned(caller_key.to_string()))?;

        // The counter transition is validated here and re-verified by the
        // settlement layer when it checks the proof.
        let ledger = SubLedger::with_minted(caller_key.clone(), recorded);
        let transition = ledger.prepare_mint(amount_to_mint)?;

        let storage_update = AccountUpdateBuilder::new(storage_id)
            .require_minted_so_far(transition.previous_minted())
            .set_state(AccountState::SubLedger {
                minted_so_far: transition.new_minted(),
            })
            .credit(transition.credit())
            .build()
            .authorize_signed_proof(self.storage_program_hash, caller);

        let controller_update = AccountUpdateBuilder::new(AccountId::base(self.address.clone()))
            .require_storage_program_hash(self.storage_program_hash)
            .child(storage_update)
            .build()
            .authorize_proof(self.program_hash);

        chain.apply(&Transaction::single(controller_update))?;

        info!(
            caller = %caller_key,
            credited = transition.credit(),
            minted_so_far = transition.new_minted(),
            "mint relayed"
        );
        Ok(transition.credit())
    }

    /// Bulk approval of a caller-supplied update forest. Unconditionally
    /// refused: the controller approves only the two shapes its own
    /// methods build.
    pub fn approve_base(&self, _bundle: &Transaction) -> Result<(), ControllerError> {
        warn!("bulk approval requested and refused");
        Err(ControllerError::UnsupportedBulkApproval)
    }

    /// Current counter of the caller's sub-ledger, if provisioned
    pub fn minted_so_far(&self, chain: &LocalChain, owner: &PublicKey) -> Option<u64> {
        let id = AccountId::in_namespace(owner.clone(), self.token_id);
        chain.account(&id).and_then(|a| a.state.minted_so_far())
    }

    /// Wrapped-token balance of an owner inside the controller's namespace
    pub fn wrapped_balance(&self, chain: &LocalChain, owner: &PublicKey) -> u64 {
        chain.balance(&AccountId::in_namespace(owner.clone(), self.token_id))
    }

    pub fn address(&self) -> &PublicKey {
        &self.address
    }

    /// The token namespace this controller owns
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    pub fn storage_program_hash(&self) -> ProgramHash {
        self.storage_program_hash
    }

    pub fn access(&self) -> Permission {
        self.access
    }

    /// Deployment record for persistence
    pub fn record(&self) -> ControllerRecord {
        ControllerRecord {
            address: self.address.clone(),
            storage_program_hash: self.storage_program_hash,
            access: self.access,
        }
    }

    /// Rebuild a handle from a persisted record. The chain must have the
    /// controller account already; programs are re-registered separately.
    pub fn from_record(record: ControllerRecord) -> Self {
        let token_id = TokenId::derive(&record.address);
        Self {
            address: record.address,
            token_id,
            storage_program_hash: record.storage_program_hash,
            program_hash: ControllerProgram::new().hash(),
            access: record.access,
        }
    }
}
