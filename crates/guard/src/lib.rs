//! Banter authorization and abuse-prevention orchestration.
//!
//! This crate wires the pure policy logic in `banter-core` to the storage
//! layer in `banter-db` and exposes the guarded operations an API surface
//! would call:
//!
//! - [`IdentityResolver`] — provider-verified sign-in, identity-to-account
//!   resolution, and display-name reconciliation.
//! - [`SessionManager`] — opaque bearer token issuance, validation, and
//!   revocation.
//! - [`CommentService`], [`VoteService`], [`ReportService`] — content
//!   operations with authorization, rate limiting, and abuse scoring
//!   applied in order.
//! - [`ModerationEngine`] — staff actions against users and comments, every
//!   one audit-logged.
//! - [`background`] — periodic sweeps for expired sessions and retired
//!   rate-limit counters.
//!
//! Every fallible operation returns [`GuardError`], which wraps the domain
//! taxonomy from `banter-core` plus classified storage errors.

pub mod abuse;
pub mod background;
pub mod comments;
pub mod config;
pub mod error;
pub mod identity;
pub mod moderation;
pub mod ratelimit;
pub mod reports;
pub mod session;
pub mod verifier;
pub mod votes;

pub use abuse::AbuseMonitor;
pub use comments::{CommentService, NewComment, ScoredComment};
pub use config::GuardConfig;
pub use error::{GuardError, GuardResult};
pub use identity::{IdentityResolver, SignIn};
pub use moderation::ModerationEngine;
pub use ratelimit::{RateDecision, RateLimiter};
pub use reports::{ReportAction, ReportService};
pub use session::{IssuedSession, SessionContext, SessionManager};
pub use verifier::{CanonicalIdentity, HttpProviderClient, ProviderClient, VerificationFailure};
pub use votes::{ScoredVote, VoteService};
