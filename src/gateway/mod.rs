// Gateway module - external attestation intake
// Fetches locked-amount attestations and relays them to the controller as mints

mod attestation;
mod codec;
mod relayer;

pub use attestation::*;
pub use codec::*;
pub use relayer::*;
