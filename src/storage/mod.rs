// Storage module - sled-backed persistence for chain, controller, identities

mod store;

pub use store::*;
