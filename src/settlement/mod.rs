// Settlement module - accounts, account updates, and the local chain that
// applies them atomically

mod account;
mod chain;
mod update;

pub use account::*;
pub use chain::*;
pub use update::*;
