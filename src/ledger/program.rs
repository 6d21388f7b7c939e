use crate::ledger::SubLedger;
use crate::program::{ProgramHash, VerificationProgram};
use crate::settlement::{AccountState, AccountUpdate, Authorization, ChainView, TransitionProgram};

const MINT_PROGRAM_NAME: &str = "sub-ledger-mint";
const MINT_PROGRAM_VERSION: u32 = 1;
const MINT_PROGRAM_ARTIFACT: &[u8] = b"lockmint/sub-ledger-mint/v1";

/// Verification program bound to every provisioned sub-ledger
///
/// A sub-ledger update verifies under this program only if it is the
/// counter transition itself: the recorded `minted_so_far` as precondition,
/// a strictly larger value written back, and a balance credit equal to the
/// difference. The owner's co-signature rides inside the proof as a public
/// witness, so nobody mints against an account but its holder.
pub struct MintProgram {
    program: VerificationProgram,
}

impl MintProgram {
    pub fn new() -> Self {
        Self {
            program: VerificationProgram::new(
                MINT_PROGRAM_NAME,
                MINT_PROGRAM_VERSION,
                MINT_PROGRAM_ARTIFACT.to_vec(),
            ),
        }
    }

    pub fn verification_program(&self) -> &VerificationProgram {
        &self.program
    }
}

impl Default for MintProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionProgram for MintProgram {
    fn hash(&self) -> ProgramHash {
        self.program.hash()
    }

    fn verify_update(&self, update: &AccountUpdate, _view: &ChainView) -> Result<(), String> {
        if !matches!(update.authorization, Authorization::SignedProof { .. }) {
            return Err("mint proof requires the owner's co-signature witness".into());
        }
        if update.account.token_id.is_base() {
            return Err("sub-ledger accounts live in a derived token namespace".into());
        }

        let previous = update
            .preconditions
            .minted_so_far
            .ok_or_else(|| String::from("mint must pin the recorded minted_so_far"))?;
        let new = match update.effects.set_state {
            Some(AccountState::SubLedger { minted_so_far }) => minted_so_far,
            _ => return Err("mint must write back the sub-ledger counter".into()),
        };
        let credit = update
            .effects
            .balance_credit
            .ok_or_else(|| String::from("mint must credit the owner's balance"))?;

        if update.effects.set_program.is_some()
            || update.effects.set_permissions.is_some()
            || update.effects.balance_debit.is_some()
        {
            return Err("mint changes nothing besides counter and balance".into());
        }
        if !update.children.is_empty() {
            return Err("mint updates approve no children".into());
        }

        // Re-run the transition: monotonic, nonzero, credit equals delta.
        let ledger = SubLedger::with_minted(update.account.public_key.clone(), previous);
        let transition = ledger.prepare_mint(new).map_err(|e| e.to_string())?;
        if transition.credit() != credit {
            return Err(format!(
                "credit {} does not equal counter delta {}",
                credit,
                transition.credit()
            ));
        }

        Ok(())
    }
}
