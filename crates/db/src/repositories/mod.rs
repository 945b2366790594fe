//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod identity_repo;
pub mod moderation_log_repo;
pub mod rate_window_repo;
pub mod report_repo;
pub mod session_repo;
pub mod user_repo;
pub mod vote_repo;

pub use comment_repo::CommentRepo;
pub use identity_repo::IdentityRepo;
pub use moderation_log_repo::ModerationLogRepo;
pub use rate_window_repo::RateWindowRepo;
pub use report_repo::ReportRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use vote_repo::VoteRepo;
