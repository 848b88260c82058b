//! Database models, schema and the vote ledger

pub mod init;
pub mod models;
pub mod votes;

pub use init::*;
pub use models::*;
pub use votes::VoteLedger;
