//! Derived visibility state: mutes that lapse by clock comparison and the
//! shadow-ban viewing rules.

use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Whether a mute is currently in effect.
///
/// Mute is derived state: there is no stored boolean and no background job to
/// clear one, so a stale flag can never outlive its own timestamp. The mute
/// lapses exactly at `muted_until` (`now >= muted_until` means not muted).
pub fn is_muted(muted_until: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(muted_until, Some(until) if until > now)
}

/// Whether `viewer` should see a comment at all, given its author's
/// shadow-ban state.
///
/// Shadow-banned authors see their own content as normal and receive no
/// notice. Staff see it so review queues still work. Everyone else,
/// including signed-out viewers, gets nothing.
pub fn shadow_ban_visible(
    author_id: DbId,
    author_shadow_banned: bool,
    viewer: Option<(DbId, Role)>,
) -> bool {
    if !author_shadow_banned {
        return true;
    }
    match viewer {
        Some((viewer_id, _)) if viewer_id == author_id => true,
        Some((_, role)) => role.is_staff(),
        None => false,
    }
}

/// Whether a comment's content should be rendered for `viewer`.
///
/// Soft-deleted comments keep their row for tree integrity but hide the
/// content from everyone below moderator; staff can still read it when
/// weighing a restore.
pub fn content_visible(
    deleted: bool,
    author_id: DbId,
    author_shadow_banned: bool,
    viewer: Option<(DbId, Role)>,
) -> bool {
    if deleted {
        return matches!(viewer, Some((_, role)) if role.is_staff());
    }
    shadow_ban_visible(author_id, author_shadow_banned, viewer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
