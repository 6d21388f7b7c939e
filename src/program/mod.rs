// Program module - verification program artifacts and their content hashes

mod artifact;
mod hash;

pub use artifact::*;
pub use hash::*;
