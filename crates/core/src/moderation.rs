//! Moderation state machine rules: role promotion ladders, ban and
//! shadow-ban toggles, timed mutes, and comment flag transitions.
//!
//! Everything here validates a single transition and returns the new state;
//! persisting the state and writing the audit entry happen in the layer
//! above, inside one atomic statement per transition.

use chrono::Duration;

use crate::authz::CommentModAction;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Mute durations
// ---------------------------------------------------------------------------

/// Mute applied when the actor gives no duration.
pub const DEFAULT_MUTE_HOURS: i64 = 24;
/// Shortest accepted mute.
pub const MIN_MUTE_HOURS: i64 = 1;
/// Longest accepted mute (one week).
pub const MAX_MUTE_HOURS: i64 = 168;

/// Compute the `muted_until` value for a mute action.
///
/// `None` duration applies the default. Zero clears an existing mute
/// (explicit unmute). Anything else must fall within
/// [`MIN_MUTE_HOURS`]..=[`MAX_MUTE_HOURS`]. There is no unmute sweep: the
/// mute lapses by timestamp comparison alone.
pub fn mute_expiry(
    now: Timestamp,
    duration_hours: Option<i64>,
) -> Result<Option<Timestamp>, CoreError> {
    match duration_hours {
        None => Ok(Some(now + Duration::hours(DEFAULT_MUTE_HOURS))),
        Some(0) => Ok(None),
        Some(hours) if (MIN_MUTE_HOURS..=MAX_MUTE_HOURS).contains(&hours) => {
            Ok(Some(now + Duration::hours(hours)))
        }
        Some(hours) => Err(CoreError::Validation(format!(
            "Mute duration must be 0 (unmute) or between {MIN_MUTE_HOURS} and {MAX_MUTE_HOURS} hours, got {hours}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Role ladder
// ---------------------------------------------------------------------------

/// Role after a `promote`, one rung up the `user -> moderator -> admin`
/// ladder.
///
/// `super_admin` is never a promotion result; it is granted directly by an
/// operator.
pub fn promote_target(current: Role) -> Result<Role, CoreError> {
    match current {
        Role::User => Ok(Role::Moderator),
        Role::Moderator => Ok(Role::Admin),
        Role::Admin => Err(CoreError::Validation(
            "Cannot promote an admin; super_admin is granted directly, never by promote".into(),
        )),
        Role::SuperAdmin => Err(CoreError::Validation(
            "super_admin cannot be promoted".into(),
        )),
    }
}

/// Role after a `demote`, one rung down the ladder.
pub fn demote_target(current: Role) -> Result<Role, CoreError> {
    match current {
        Role::Admin => Ok(Role::Moderator),
        Role::Moderator => Ok(Role::User),
        Role::User => Err(CoreError::Validation(
            "Cannot demote a user below the lowest role".into(),
        )),
        Role::SuperAdmin => Err(CoreError::Validation(
            "super_admin cannot be demoted".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Ban axes
// ---------------------------------------------------------------------------

/// Validate a ban or unban against the current flag; the two ban axes
/// (banned, shadow-banned) are independent toggles.
///
/// Returns the new flag value. Re-applying the current state is a conflict
/// so a double ban surfaces instead of silently auditing twice.
pub fn toggle_ban_flag(
    axis: &'static str,
    currently_set: bool,
    set: bool,
) -> Result<bool, CoreError> {
    if currently_set == set {
        let state = if set { "already" } else { "not" };
        return Err(CoreError::Conflict(format!("User is {state} {axis}")));
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Comment flags
// ---------------------------------------------------------------------------

/// The three independent moderation flags on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentFlags {
    pub deleted: bool,
    pub locked: bool,
    pub pinned: bool,
}

/// Apply a flag-changing moderation action to a comment's current flags.
///
/// Each arm is a two-state toggle; applying a state the comment is already
/// in is a conflict. Tag actions do not change flags and are routed through
/// [`apply_tag`] instead.
pub fn comment_transition(
    flags: CommentFlags,
    action: CommentModAction,
) -> Result<CommentFlags, CoreError> {
    let mut next = flags;
    match action {
        CommentModAction::Pin => {
            if flags.pinned {
                return Err(CoreError::Conflict("Comment is already pinned".into()));
            }
            next.pinned = true;
        }
        CommentModAction::Unpin => {
            if !flags.pinned {
                return Err(CoreError::Conflict("Comment is not pinned".into()));
            }
            next.pinned = false;
        }
        CommentModAction::Lock => {
            if flags.locked {
                return Err(CoreError::Conflict("Comment is already locked".into()));
            }
            next.locked = true;
        }
        CommentModAction::Unlock => {
            if !flags.locked {
                return Err(CoreError::Conflict("Comment is not locked".into()));
            }
            next.locked = false;
        }
        CommentModAction::Delete => {
            if flags.deleted {
                return Err(CoreError::Conflict("Comment is already deleted".into()));
            }
            next.deleted = true;
        }
        CommentModAction::Restore => {
            if !flags.deleted {
                return Err(CoreError::Conflict("Comment is not deleted".into()));
            }
            next.deleted = false;
        }
        CommentModAction::AddTag | CommentModAction::RemoveTag => {
            return Err(CoreError::Validation(
                "Tag changes carry a tag argument and do not alter comment flags".into(),
            ));
        }
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const TAG_SPOILER: &str = "spoiler";
pub const TAG_NSFW: &str = "nsfw";
pub const TAG_WARNING: &str = "warning";
pub const TAG_OFFENSIVE: &str = "offensive";
pub const TAG_SPAM: &str = "spam";

/// The closed tag vocabulary. Tags are not mutually exclusive.
pub const VALID_TAGS: &[&str] = &[TAG_SPOILER, TAG_NSFW, TAG_WARNING, TAG_OFFENSIVE, TAG_SPAM];

/// Validate that `tag` is in the vocabulary.
pub fn validate_tag(tag: &str) -> Result<(), CoreError> {
    if VALID_TAGS.contains(&tag) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid tag '{tag}'. Must be one of: {}",
            VALID_TAGS.join(", ")
        )))
    }
}

/// Compute a comment's tag set after adding or removing `tag`.
pub fn apply_tag(current: &[String], tag: &str, add: bool) -> Result<Vec<String>, CoreError> {
    validate_tag(tag)?;
    let present = current.iter().any(|t| t == tag);
    if add {
        if present {
            return Err(CoreError::Conflict(format!("Comment already tagged '{tag}'")));
        }
        let mut next = current.to_vec();
        next.push(tag.to_string());
        Ok(next)
    } else {
        if !present {
            return Err(CoreError::Conflict(format!("Comment is not tagged '{tag}'")));
        }
        Ok(current.iter().filter(|t| *t != tag).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Audit action constants
// ---------------------------------------------------------------------------

/// Audit actions with no corresponding authz enum variant. Enum-backed
/// actions log their `as_str()` form directly.
pub const ACTION_UNMUTE: &str = "unmute";
pub const ACTION_AUTO_REVIEW: &str = "auto_review";
pub const ACTION_AUTO_FLAG: &str = "auto_flag";
pub const ACTION_AUTO_DELETE: &str = "auto_delete";
pub const ACTION_VOTE_FLAG: &str = "vote_flag";
pub const ACTION_REPORT_RESOLVE: &str = "report_resolve";
pub const ACTION_REPORT_DISMISS: &str = "report_dismiss";
pub const ACTION_REPORT_ESCALATE: &str = "report_escalate";

/// Target kinds for the moderation log, matching the table CHECK constraint.
pub mod target_kinds {
    pub const USER: &str = "user";
    pub const COMMENT: &str = "comment";
    pub const REPORT: &str = "report";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
