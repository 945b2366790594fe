//! Permission engine: a static policy table over (actor, target, action).
//!
//! Every decision here is a pure function of role ordinals and actor flags so
//! the whole table can be unit tested without storage or sessions. Rules are
//! evaluated in a fixed order; the first matching denial wins.

use crate::roles::Role;
use crate::types::{DbId, Timestamp};
use crate::visibility;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Moderation actions directed at a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserModAction {
    Warn,
    Mute,
    Ban,
    Unban,
    ShadowBan,
    UnshadowBan,
    Promote,
    Demote,
}

impl UserModAction {
    /// Audit-log string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Mute => "mute",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::ShadowBan => "shadow_ban",
            Self::UnshadowBan => "unshadow_ban",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }

    /// Minimum actor role required to perform this action.
    pub fn minimum_role(self) -> Role {
        match self {
            Self::Warn | Self::Mute => Role::Moderator,
            Self::Ban | Self::Unban | Self::ShadowBan | Self::UnshadowBan => Role::Admin,
            Self::Promote | Self::Demote => Role::SuperAdmin,
        }
    }
}

/// Moderation actions directed at a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentModAction {
    Pin,
    Unpin,
    Lock,
    Unlock,
    Delete,
    Restore,
    AddTag,
    RemoveTag,
}

impl CommentModAction {
    /// Audit-log string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Unpin => "unpin",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::AddTag => "tag_add",
            Self::RemoveTag => "tag_remove",
        }
    }

    /// All comment moderation requires moderator rank.
    pub fn minimum_role(self) -> Role {
        Role::Moderator
    }
}

/// Ordinary participation actions available to any account in good standing.
///
/// Role never gates these; only ban and mute state do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAction {
    CreateComment,
    EditComment,
    DeleteOwnComment,
    CastVote,
    RemoveVote,
    FileReport,
}

impl ContentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateComment => "create_comment",
            Self::EditComment => "edit_comment",
            Self::DeleteOwnComment => "delete_own_comment",
            Self::CastVote => "cast_vote",
            Self::RemoveVote => "remove_vote",
            Self::FileReport => "file_report",
        }
    }

    /// Whether a mute blocks this action. Muted users may still vote,
    /// report, and delete their own comments; they cannot produce content.
    pub fn requires_posting_rights(self) -> bool {
        matches!(self, Self::CreateComment | Self::EditComment)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert to a `Result`, mapping denial to `Forbidden` with the
    /// machine-readable reason as the message.
    pub fn into_result(self) -> Result<(), crate::error::CoreError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(crate::error::CoreError::Forbidden(
                reason.as_str().to_string(),
            )),
        }
    }
}

/// Machine-readable denial reasons. Every deny carries exactly one.
///
/// `SelfVote` and `NotAuthor` are produced by the orchestration layer's
/// ownership checks rather than the policy table below; they live here so
/// every denial reason shares one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    CannotTargetSuperAdmin,
    SelfTarget,
    InsufficientRole,
    TargetNotOutranked,
    Banned,
    Muted,
    SelfVote,
    NotAuthor,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CannotTargetSuperAdmin => "cannot_target_super_admin",
            Self::SelfTarget => "self_target",
            Self::InsufficientRole => "insufficient_role",
            Self::TargetNotOutranked => "target_not_outranked",
            Self::Banned => "banned",
            Self::Muted => "muted",
            Self::SelfVote => "self_vote",
            Self::NotAuthor => "not_author",
        }
    }
}

// ---------------------------------------------------------------------------
// Policy table
// ---------------------------------------------------------------------------

/// Authorize a user-directed moderation action.
///
/// Rules, in evaluation order:
/// 1. `super_admin` is never a valid target, for any actor.
/// 2. Self-moderation is denied.
/// 3. The actor must hold the action's minimum role and strictly outrank the
///    target; `super_admin` actors skip the outranking requirement.
pub fn authorize_user_moderation(
    actor_id: DbId,
    actor_role: Role,
    target_id: DbId,
    target_role: Role,
    action: UserModAction,
) -> Decision {
    if target_role == Role::SuperAdmin {
        return Decision::Deny(DenyReason::CannotTargetSuperAdmin);
    }
    if actor_id == target_id {
        return Decision::Deny(DenyReason::SelfTarget);
    }
    if actor_role < action.minimum_role() {
        return Decision::Deny(DenyReason::InsufficientRole);
    }
    if actor_role != Role::SuperAdmin && actor_role <= target_role {
        return Decision::Deny(DenyReason::TargetNotOutranked);
    }
    Decision::Allow
}

/// Authorize a comment-directed moderation action against the comment's
/// author.
///
/// Comments by `super_admin` authors are off limits like the accounts
/// themselves. Unlike user-directed moderation, equal rank suffices (a
/// moderator may lock another moderator's comment) and self-authored targets
/// are allowed (a moderator may pin their own announcement).
pub fn authorize_comment_moderation(
    actor_role: Role,
    author_role: Role,
    action: CommentModAction,
) -> Decision {
    if author_role == Role::SuperAdmin {
        return Decision::Deny(DenyReason::CannotTargetSuperAdmin);
    }
    if actor_role < action.minimum_role() {
        return Decision::Deny(DenyReason::InsufficientRole);
    }
    if actor_role != Role::SuperAdmin && actor_role < author_role {
        return Decision::Deny(DenyReason::TargetNotOutranked);
    }
    Decision::Allow
}

/// Authorize an ordinary participation action.
///
/// Banned accounts can do nothing. Muted accounts lose posting rights only;
/// the action itself declares whether it needs them.
pub fn authorize_content(
    action: ContentAction,
    banned: bool,
    muted_until: Option<Timestamp>,
    now: Timestamp,
) -> Decision {
    if banned {
        return Decision::Deny(DenyReason::Banned);
    }
    if action.requires_posting_rights() && visibility::is_muted(muted_until, now) {
        return Decision::Deny(DenyReason::Muted);
    }
    Decision::Allow
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
