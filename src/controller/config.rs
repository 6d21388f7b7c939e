use crate::controller::ControllerError;
use crate::permissions::Permission;
use crate::program::ProgramHash;
use serde::{Deserialize, Serialize};

/// Deploy-time configuration for the controller
///
/// The committed program hash is fixed for the controller's lifetime. The
/// access policy is the one configurable axis of the controller account's
/// permission template.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Hash of the verification program every sub-ledger must run
    pub storage_program_hash: ProgramHash,
    /// Access policy installed on the controller account
    pub access: Permission,
}

impl ControllerConfig {
    pub fn new(storage_program_hash: ProgramHash) -> Self {
        Self {
            storage_program_hash,
            access: Permission::None,
        }
    }

    /// Set the access policy
    pub fn with_access(mut self, access: Permission) -> Self {
        self.access = access;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ControllerError> {
        // Impossible would freeze the controller's own methods out too.
        if self.access == Permission::Impossible {
            return Err(ControllerError::UnsupportedAccessPolicy(self.access));
        }
        Ok(())
    }
}
