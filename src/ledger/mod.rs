// Ledger module - per-account mint accounting and token namespaces

mod program;
mod subledger;
mod token;

pub use program::*;
pub use subledger::*;
pub use token::*;
