use crate::program::ProgramHash;
use serde::{Deserialize, Serialize};

/// A compiled verification program artifact
///
/// The bytes are opaque to the settlement layer; only the derived
/// [`ProgramHash`] matters for binding and pinning. Name and version are
/// folded into the hash so recompiling under a new version yields a new
/// identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationProgram {
    name: String,
    version: u32,
    artifact: Vec<u8>,
}

impl VerificationProgram {
    pub fn new(name: impl Into<String>, version: u32, artifact: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            version,
            artifact,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn artifact(&self) -> &[u8] {
        &self.artifact
    }

    /// Identity of this program, stable across calls
    pub fn hash(&self) -> ProgramHash {
        ProgramHash::digest(&self.name, self.version, &self.artifact)
    }
}
