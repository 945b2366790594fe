//! Guarded report filing and resolution.
//!
//! Filing is open to any account in good standing and burns report-class
//! rate budget. Resolution is staff work: every transition lands in the
//! moderation log, and the compare-and-set status write means two
//! moderators racing on the same report produce exactly one outcome.

use banter_core::authz::{self, ContentAction, DenyReason};
use banter_core::error::CoreError;
use banter_core::moderation::{
    target_kinds, ACTION_REPORT_DISMISS, ACTION_REPORT_ESCALATE, ACTION_REPORT_RESOLVE,
};
use banter_core::ratelimit::ActionClass;
use banter_core::reports::{
    validate_report_input, validate_transition, STATUS_DISMISSED, STATUS_ESCALATED,
    STATUS_RESOLVED,
};
use banter_core::types::DbId;
use banter_db::models::report::{CreateReport, Report};
use banter_db::repositories::{CommentRepo, ReportRepo};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::config::GuardConfig;
use crate::error::{GuardError, GuardResult};
use crate::moderation::ModerationEngine;
use crate::ratelimit::RateLimiter;
use crate::session::SessionContext;

/// A moderator's verdict on an open report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    /// Close the report as acted upon.
    Resolve,
    /// Close the report without action.
    Dismiss,
    /// Bump the report to admin attention; it stays open.
    Escalate,
}

impl ReportAction {
    /// Status the report moves to under this action.
    pub fn target_status(self) -> &'static str {
        match self {
            Self::Resolve => STATUS_RESOLVED,
            Self::Dismiss => STATUS_DISMISSED,
            Self::Escalate => STATUS_ESCALATED,
        }
    }

    /// Audit-log action name recorded for this verdict.
    pub fn audit_action(self) -> &'static str {
        match self {
            Self::Resolve => ACTION_REPORT_RESOLVE,
            Self::Dismiss => ACTION_REPORT_DISMISS,
            Self::Escalate => ACTION_REPORT_ESCALATE,
        }
    }
}

/// Guarded report operations.
#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
    limiter: RateLimiter,
    engine: ModerationEngine,
}

impl ReportService {
    pub fn new(pool: PgPool, config: &GuardConfig) -> Self {
        let limiter = RateLimiter::new(pool.clone(), config);
        let engine = ModerationEngine::new(pool.clone());
        Self { pool, limiter, engine }
    }

    /// File a report against a comment.
    ///
    /// One open report per `(comment, reporter)` pair; a second attempt while
    /// the first is still pending or escalated fails with `Conflict`. Closed
    /// reports never block a fresh one.
    pub async fn file(
        &self,
        actor: &SessionContext,
        comment_id: DbId,
        reason: &str,
        notes: Option<&str>,
    ) -> GuardResult<Report> {
        let now = Utc::now();
        authz::authorize_content(ContentAction::FileReport, actor.banned, actor.muted_until, now)
            .into_result()?;
        validate_report_input(reason, notes)?;

        let comment = CommentRepo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "comment", id: comment_id })?;
        if comment.deleted {
            return Err(GuardError::Core(CoreError::Validation(
                "Cannot report a deleted comment".to_string(),
            )));
        }

        self.limiter.check(actor.user_id, actor.role, ActionClass::Report).await?.into_result()?;

        let created = ReportRepo::create(
            &self.pool,
            &CreateReport {
                comment_id,
                reporter_id: actor.user_id,
                reason: reason.to_string(),
                notes: notes.map(str::to_string),
            },
        )
        .await?;
        let report = created.ok_or_else(|| {
            GuardError::Core(CoreError::Conflict(
                "An open report for this comment by this reporter already exists".to_string(),
            ))
        })?;

        tracing::info!(report_id = report.id, comment_id, reporter_id = actor.user_id,
            "Filed report");
        Ok(report)
    }

    /// Apply a staff verdict to a report.
    ///
    /// `reason` is free-form context recorded in the audit entry, not on the
    /// report row. Fails with `Conflict` when the transition is not allowed
    /// from the report's current status or when another moderator got there
    /// first.
    pub async fn resolve(
        &self,
        actor: &SessionContext,
        report_id: DbId,
        action: ReportAction,
        reason: Option<&str>,
    ) -> GuardResult<Report> {
        self.require_staff(actor)?;

        let report = ReportRepo::find_by_id(&self.pool, report_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "report", id: report_id })?;
        validate_transition(&report.status, action.target_status())?;

        let updated =
            ReportRepo::set_status(&self.pool, report_id, &report.status, action.target_status())
                .await?
                .ok_or_else(|| {
                    GuardError::Core(CoreError::Conflict(
                        "Report status changed concurrently; retry".to_string(),
                    ))
                })?;

        self.engine
            .audit(
                actor.user_id,
                action.audit_action(),
                target_kinds::REPORT,
                report_id,
                reason,
                Some(json!({ "from": report.status, "to": updated.status })),
            )
            .await?;
        tracing::info!(report_id, actor_id = actor.user_id, status = %updated.status,
            "Updated report status");
        Ok(updated)
    }

    /// List open reports (pending or escalated), oldest first. Staff only.
    pub async fn open_queue(
        &self,
        actor: &SessionContext,
        limit: i64,
    ) -> GuardResult<Vec<Report>> {
        self.require_staff(actor)?;
        Ok(ReportRepo::list_open(&self.pool, limit).await?)
    }

    fn require_staff(&self, actor: &SessionContext) -> GuardResult<()> {
        if actor.role.is_staff() {
            Ok(())
        } else {
            Err(GuardError::Core(CoreError::Forbidden(
                DenyReason::InsufficientRole.as_str().to_string(),
            )))
        }
    }
}
