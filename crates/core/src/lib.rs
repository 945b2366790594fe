//! Pure domain logic for banter's authorization and abuse-prevention core.
//!
//! Everything in this crate is side-effect-free: no database access, no I/O,
//! no clocks (callers pass `now` explicitly). `banter-db` persists the state
//! these modules reason about and `banter-guard` wires both together into the
//! request-facing operations.

pub mod abuse;
pub mod authz;
pub mod error;
pub mod moderation;
pub mod ratelimit;
pub mod reports;
pub mod roles;
pub mod tokens;
pub mod types;
pub mod visibility;
