// lockmint - proof-gated wrapped-token accounting
//
// A singleton controller commits to the verification program every
// per-account sub-ledger must run. Sub-ledgers track a monotonic
// minted-so-far counter against externally attested locked amounts, so
// total wrapped supply never exceeds what is locked.

pub mod controller;
pub mod gateway;
pub mod identity;
pub mod ledger;
pub mod permissions;
pub mod program;
pub mod settlement;
pub mod storage;
