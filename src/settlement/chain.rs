use crate::identity::PublicKey;
use crate::ledger::TokenId;
use crate::permissions::{AuthorizationKind, Permission};
use crate::program::ProgramHash;
use crate::settlement::{Account, AccountId, AccountUpdate, Authorization, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("account {0} is already provisioned")]
    AlreadyProvisioned(String),

    #[error("precondition failed on {account}: {reason}")]
    PreconditionFailed { account: String, reason: String },

    #[error("authorization rejected on {account}: {reason}")]
    AuthorizationRejected { account: String, reason: String },

    #[error("permission denied on {account}: {aspect} requires {required}")]
    PermissionDenied {
        account: String,
        aspect: &'static str,
        required: Permission,
    },

    #[error("no verification program registered under {0}")]
    UnknownProgram(String),

    #[error("proof rejected on {account}: {reason}")]
    ProofRejected { account: String, reason: String },

    #[error("update in namespace {namespace} lacks approval of the namespace owner")]
    MissingNamespaceApproval { namespace: String },

    #[error("balance overflow on {0}")]
    BalanceOverflow(String),

    #[error("insufficient balance on {account}: have {available}, need {required}")]
    InsufficientBalance {
        account: String,
        available: u64,
        required: u64,
    },
}

/// Read-only view of chain state handed to verification programs
pub struct ChainView<'a> {
    accounts: &'a HashMap<AccountId, Account>,
}

impl<'a> ChainView<'a> {
    pub(crate) fn new(accounts: &'a HashMap<AccountId, Account>) -> Self {
        Self { accounts }
    }

    pub fn account(&self, id: &AccountId) -> Option<&'a Account> {
        self.accounts.get(id)
    }
}

/// A verification program the settlement layer re-runs against any account
/// update that claims to be its proof. Compilation and key distribution are
/// external; here a registered program is executable verification logic
/// keyed by its content hash.
pub trait TransitionProgram: Send + Sync {
    /// Identity this program is registered under
    fn hash(&self) -> ProgramHash;

    /// Re-verify the update shape under this program, against the state the
    /// update will be applied to. Any error message fails the transaction.
    fn verify_update(&self, update: &AccountUpdate, view: &ChainView) -> Result<(), String>;
}

/// Serializable chain state. Programs are code, not data; they are
/// re-registered after a restore.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub accounts: Vec<Account>,
    pub height: u64,
}

/// Deterministic in-process settlement layer
///
/// Transactions apply strictly one at a time, whole or not at all. Every
/// update is validated against the staged state in depth-first order, so a
/// parent's effects are visible to its children and a rejected update
/// discards everything.
pub struct LocalChain {
    accounts: HashMap<AccountId, Account>,
    programs: HashMap<ProgramHash, Arc<dyn TransitionProgram>>,
    height: u64,
}

impl LocalChain {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            programs: HashMap::new(),
            height: 0,
        }
    }

    /// Register a verification program under its content hash
    pub fn register_program(&mut self, program: Arc<dyn TransitionProgram>) {
        let hash = program.hash();
        debug!(program = %hash, "registered verification program");
        self.programs.insert(hash, program);
    }

    pub fn has_program(&self, hash: &ProgramHash) -> bool {
        self.programs.contains_key(hash)
    }

    /// Genesis faucet: credit a base-namespace account directly, creating
    /// it if needed. Test and bootstrap convenience outside the
    /// transaction path.
    pub fn fund(&mut self, public_key: &PublicKey, amount: u64) {
        let id = AccountId::base(public_key.clone());
        let account = self
            .accounts
            .entry(id.clone())
            .or_insert_with(|| Account::new_plain(id, 0));
        account.balance = account.balance.saturating_add(amount);
        info!(account = %account.id, amount, "funded account");
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Balance of an account, zero if it does not exist
    pub fn balance(&self, id: &AccountId) -> u64 {
        self.accounts.get(id).map(|a| a.balance).unwrap_or(0)
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Apply a transaction atomically: validate and stage every update in
    /// depth-first order, then commit all or nothing.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<(), SettlementError> {
        let mut staged = self.accounts.clone();

        for update in transaction.updates() {
            if let Err(e) = Self::apply_update(&mut staged, &self.programs, update, &[]) {
                warn!(error = %e, "transaction rejected");
                return Err(e);
            }
        }

        self.accounts = staged;
        self.height += 1;
        info!(
            height = self.height,
            updates = transaction.update_count(),
            "transaction committed"
        );
        Ok(())
    }

    /// Ordered snapshot of all accounts plus the height
    pub fn snapshot(&self) -> ChainSnapshot {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| {
            a.id.public_key
                .as_bytes()
                .cmp(b.id.public_key.as_bytes())
                .then(a.id.token_id.as_bytes().cmp(b.id.token_id.as_bytes()))
        });
        ChainSnapshot {
            accounts,
            height: self.height,
        }
    }

    /// Rebuild a chain from a snapshot. The program registry starts empty;
    /// callers re-register their programs before applying transactions.
    pub fn restore(snapshot: ChainSnapshot) -> Self {
        let accounts = snapshot
            .accounts
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        Self {
            accounts,
            programs: HashMap::new(),
            height: snapshot.height,
        }
    }

    fn apply_update(
        staged: &mut HashMap<AccountId, Account>,
        programs: &HashMap<ProgramHash, Arc<dyn TransitionProgram>>,
        update: &AccountUpdate,
        ancestors: &[(PublicKey, AuthorizationKind)],
    ) -> Result<(), SettlementError> {
        Self::validate_update(staged, programs, update, ancestors)?;
        Self::commit_effects(staged, update)?;

        let mut lineage = ancestors.to_vec();
        lineage.push((
            update.account.public_key.clone(),
            update.authorization.kind(),
        ));
        for child in &update.children {
            Self::apply_update(staged, programs, child, &lineage)?;
        }
        Ok(())
    }

    fn validate_update(
        staged: &HashMap<AccountId, Account>,
        programs: &HashMap<ProgramHash, Arc<dyn TransitionProgram>>,
        update: &AccountUpdate,
        ancestors: &[(PublicKey, AuthorizationKind)],
    ) -> Result<(), SettlementError> {
        let id = &update.account;
        debug!(account = %id, kind = ?update.authorization.kind(), "validating update");

        // An update in a derived namespace is only valid underneath an
        // update of the account that owns the namespace, and that approving
        // update must itself be authenticated. An unauthorized touch of the
        // owner account approves nothing.
        if !id.token_id.is_base() {
            let approved = ancestors.iter().any(|(pk, kind)| {
                TokenId::derive(pk) == id.token_id && *kind != AuthorizationKind::None
            });
            if !approved {
                return Err(SettlementError::MissingNamespaceApproval {
                    namespace: id.token_id.to_string(),
                });
            }
        }

        let existing = staged.get(id);

        match update.preconditions.is_new {
            Some(true) if existing.is_some() => {
                return Err(SettlementError::AlreadyProvisioned(id.to_string()));
            }
            Some(false) if existing.is_none() => {
                return Err(SettlementError::PreconditionFailed {
                    account: id.to_string(),
                    reason: "account does not exist".into(),
                });
            }
            _ => {}
        }

        match &update.authorization {
            Authorization::None => {}
            Authorization::Signature(signature) => {
                if !id.public_key.verify(&update.signing_bytes(), signature) {
                    return Err(SettlementError::AuthorizationRejected {
                        account: id.to_string(),
                        reason: "signature does not verify".into(),
                    });
                }
            }
            Authorization::Proof { program_hash } => {
                Self::verify_proof(staged, programs, update, *program_hash)?;
            }
            Authorization::SignedProof {
                program_hash,
                signature,
            } => {
                if !id.public_key.verify(&update.signing_bytes(), signature) {
                    return Err(SettlementError::AuthorizationRejected {
                        account: id.to_string(),
                        reason: "witness signature does not verify".into(),
                    });
                }
                Self::verify_proof(staged, programs, update, *program_hash)?;
            }
        }

        match existing {
            Some(account) => Self::validate_against_existing(account, update),
            None => Self::validate_creation(update),
        }
    }

    /// Checks for an update touching an account that already exists:
    /// the access gate, per-aspect permissions, value preconditions, and
    /// balance arithmetic.
    fn validate_against_existing(
        account: &Account,
        update: &AccountUpdate,
    ) -> Result<(), SettlementError> {
        let id = &update.account;
        let kind = update.authorization.kind();

        // Access gates every touch of the account, effects or not.
        Self::require_permission(account, account.permissions.access, kind, "access")?;

        let effects = &update.effects;
        if effects.set_state.is_some() {
            Self::require_permission(account, account.permissions.edit_state, kind, "edit_state")?;
        }
        if effects.set_program.is_some() {
            Self::require_permission(account, account.permissions.set_program, kind, "set_program")?;
        }
        if effects.set_permissions.is_some() {
            Self::require_permission(
                account,
                account.permissions.set_permissions,
                kind,
                "set_permissions",
            )?;
        }
        if effects.balance_debit.is_some() {
            Self::require_permission(account, account.permissions.send, kind, "send")?;
        }

        if let Some(min) = update.preconditions.balance_at_least {
            if account.balance < min {
                return Err(SettlementError::PreconditionFailed {
                    account: id.to_string(),
                    reason: format!("balance {} below required {}", account.balance, min),
                });
            }
        }
        if let Some(expected) = update.preconditions.minted_so_far {
            match account.state.minted_so_far() {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(SettlementError::PreconditionFailed {
                        account: id.to_string(),
                        reason: format!("minted_so_far is {}, expected {}", actual, expected),
                    });
                }
                None => {
                    return Err(SettlementError::PreconditionFailed {
                        account: id.to_string(),
                        reason: "account is not a sub-ledger".into(),
                    });
                }
            }
        }
        if let Some(expected) = update.preconditions.storage_program_hash {
            match account.state.storage_program_hash() {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(SettlementError::PreconditionFailed {
                        account: id.to_string(),
                        reason: format!(
                            "committed program hash is {}, expected {}",
                            actual, expected
                        ),
                    });
                }
                None => {
                    return Err(SettlementError::PreconditionFailed {
                        account: id.to_string(),
                        reason: "account holds no committed program hash".into(),
                    });
                }
            }
        }

        let credited = account
            .balance
            .checked_add(effects.balance_credit.unwrap_or(0))
            .ok_or_else(|| SettlementError::BalanceOverflow(id.to_string()))?;
        if let Some(debit) = effects.balance_debit {
            if credited < debit {
                return Err(SettlementError::InsufficientBalance {
                    account: id.to_string(),
                    available: account.balance,
                    required: debit,
                });
            }
        }

        Ok(())
    }

    /// Checks for an update that creates its account. Creation must be
    /// authenticated by the owner; a bare proof or nothing is not enough.
    fn validate_creation(update: &AccountUpdate) -> Result<(), SettlementError> {
        let id = &update.account;

        let authenticated = matches!(
            update.authorization,
            Authorization::Signature(_) | Authorization::SignedProof { .. }
        );
        if !authenticated {
            return Err(SettlementError::AuthorizationRejected {
                account: id.to_string(),
                reason: "account creation requires the owner's signature".into(),
            });
        }

        if update.preconditions.balance_at_least.is_some()
            || update.preconditions.minted_so_far.is_some()
            || update.preconditions.storage_program_hash.is_some()
        {
            return Err(SettlementError::PreconditionFailed {
                account: id.to_string(),
                reason: "value precondition on a nonexistent account".into(),
            });
        }

        if let Some(debit) = update.effects.balance_debit {
            return Err(SettlementError::InsufficientBalance {
                account: id.to_string(),
                available: 0,
                required: debit,
            });
        }

        Ok(())
    }

    fn verify_proof(
        staged: &HashMap<AccountId, Account>,
        programs: &HashMap<ProgramHash, Arc<dyn TransitionProgram>>,
        update: &AccountUpdate,
        program_hash: ProgramHash,
    ) -> Result<(), SettlementError> {
        let program = programs
            .get(&program_hash)
            .ok_or_else(|| SettlementError::UnknownProgram(program_hash.to_string()))?;

        // A proof only stands for the program actually bound to the account.
        if let Some(account) = staged.get(&update.account) {
            if let Some(bound) = account.program {
                if bound != program_hash {
                    return Err(SettlementError::ProofRejected {
                        account: update.account.to_string(),
                        reason: format!(
                            "proof names program {}, account is bound to {}",
                            program_hash, bound
                        ),
                    });
                }
            }
        }

        let view = ChainView::new(staged);
        program
            .verify_update(update, &view)
            .map_err(|reason| SettlementError::ProofRejected {
                account: update.account.to_string(),
                reason,
            })
    }

    fn require_permission(
        account: &Account,
        required: Permission,
        offered: AuthorizationKind,
        aspect: &'static str,
    ) -> Result<(), SettlementError> {
        if required.admits(offered) {
            Ok(())
        } else {
            Err(SettlementError::PermissionDenied {
                account: account.id.to_string(),
                aspect,
                required,
            })
        }
    }

    fn commit_effects(
        staged: &mut HashMap<AccountId, Account>,
        update: &AccountUpdate,
    ) -> Result<(), SettlementError> {
        let account = staged
            .entry(update.account.clone())
            .or_insert_with(|| Account::new_plain(update.account.clone(), 0));

        let effects = &update.effects;
        if let Some(state) = &effects.set_state {
            account.state = state.clone();
        }
        if let Some(program) = effects.set_program {
            account.program = Some(program);
        }
        if let Some(permissions) = &effects.set_permissions {
            account.permissions = permissions.clone();
        }
        if let Some(credit) = effects.balance_credit {
            account.balance = account
                .balance
                .checked_add(credit)
                .ok_or_else(|| SettlementError::BalanceOverflow(update.account.to_string()))?;
        }
        if let Some(debit) = effects.balance_debit {
            account.balance = account.balance.checked_sub(debit).ok_or_else(|| {
                SettlementError::InsufficientBalance {
                    account: update.account.to_string(),
                    available: account.balance,
                    required: debit,
                }
            })?;
        }
        Ok(())
    }
}

impl Default for LocalChain {
    fn default() -> Self {
        Self::new()
    }
}
