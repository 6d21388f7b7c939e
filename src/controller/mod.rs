// Controller module - the singleton that commits to the sub-ledger
// verification program, provisions sub-ledgers, and relays mints

mod config;
mod controller;
mod program;

pub use config::*;
pub use controller::*;
pub use program::*;
