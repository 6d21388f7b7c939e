use crate::ledger::TokenId;
use crate::permissions::PermissionSet;
use crate::program::{ProgramHash, VerificationProgram};
use crate::settlement::{AccountState, AccountUpdate, Authorization, ChainView, TransitionProgram};

const CONTROLLER_PROGRAM_NAME: &str = "lockmint-controller";
const CONTROLLER_PROGRAM_VERSION: u32 = 1;
const CONTROLLER_PROGRAM_ARTIFACT: &[u8] = b"lockmint/controller/v1";

/// Verification program bound to the controller account
///
/// A controller update verifies only if it pins the committed program hash
/// recorded on the account, changes nothing on the controller itself, and
/// approves exactly one sub-ledger update in the controller's namespace of
/// one of two shapes: a provisioning (fresh account, committed program,
/// locked-down permission template, zero counter, owner co-signed) or a
/// mint (a signed proof of the committed program, verified on its own).
pub struct ControllerProgram {
    program: VerificationProgram,
}

impl ControllerProgram {
    pub fn new() -> Self {
        Self {
            program: VerificationProgram::new(
                CONTROLLER_PROGRAM_NAME,
                CONTROLLER_PROGRAM_VERSION,
                CONTROLLER_PROGRAM_ARTIFACT.to_vec(),
            ),
        }
    }

    pub fn verification_program(&self) -> &VerificationProgram {
        &self.program
    }

    fn verify_provisioning_child(
        child: &AccountUpdate,
        committed: ProgramHash,
    ) -> Result<(), String> {
        if child.preconditions.is_new != Some(true) {
            return Err("provisioning requires a fresh account".into());
        }
        if child.effects.set_program != Some(committed) {
            return Err("provisioned program must be the committed one".into());
        }
        match &child.effects.set_permissions {
            Some(set) if *set == PermissionSet::sub_ledger() => {}
            _ => return Err("provisioning must install the sub-ledger permission template".into()),
        }
        if child.effects.set_state != Some(AccountState::SubLedger { minted_so_far: 0 }) {
            return Err("sub-ledger counter must start at zero".into());
        }
        if child.effects.balance_credit.is_some() || child.effects.balance_debit.is_some() {
            return Err("provisioning moves no balance".into());
        }
        // The child inherits the controller's namespace approval, so any
        // grandchild it carried would ride in under the same proof.
        if !child.children.is_empty() {
            return Err("provisioning updates approve no children".into());
        }
        Ok(())
    }
}

impl Default for ControllerProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionProgram for ControllerProgram {
    fn hash(&self) -> ProgramHash {
        self.program.hash()
    }

    fn verify_update(&self, update: &AccountUpdate, view: &ChainView) -> Result<(), String> {
        if !update.account.token_id.is_base() {
            return Err("controller account lives in the base namespace".into());
        }

        let account = view
            .account(&update.account)
            .ok_or_else(|| String::from("controller account does not exist"))?;
        let committed = account
            .state
            .storage_program_hash()
            .ok_or_else(|| String::from("account carries no committed program hash"))?;

        // The committed hash is read from the account and pinned again as
        // an explicit precondition, so the transaction is invalid if the
        // commitment ever differed.
        if update.preconditions.storage_program_hash != Some(committed) {
            return Err("update does not pin the committed program hash".into());
        }

        if !update.effects.is_empty() {
            return Err("controller methods leave the controller account unchanged".into());
        }

        if update.children.len() != 1 {
            return Err("controller approves exactly one sub-ledger update".into());
        }
        let child = &update.children[0];

        let namespace = TokenId::derive(&update.account.public_key);
        if child.account.token_id != namespace {
            return Err("approved update is outside the controller's namespace".into());
        }

        match &child.authorization {
            Authorization::Signature(_) => Self::verify_provisioning_child(child, committed),
            Authorization::SignedProof { program_hash, .. } => {
                if *program_hash != committed {
                    return Err("mint proof must name the committed program".into());
                }
                Ok(())
            }
            _ => Err("unrecognized sub-ledger update authorization".into()),
        }
    }
}
