// Identity module - Ed25519 account identities and signatures

mod keypair;
mod signature;

pub use keypair::*;
pub use signature::*;
