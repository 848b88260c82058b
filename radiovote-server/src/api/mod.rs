//! HTTP API handlers for radiovote-server

pub mod buildinfo;
pub mod health;
pub mod votes;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use votes::{get_tally, get_vote_status, submit_vote, vote_routes};
