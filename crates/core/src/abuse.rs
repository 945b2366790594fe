//! Additive abuse scoring over content, behavior, and posting patterns.
//!
//! Scoring is pure and monotonic: every tripped signal adds a non-negative
//! contribution, no signal can lower the total, and evaluation never mutates
//! anything. The detector only recommends; applying an outcome is the
//! moderation layer's job. Weights and thresholds are deliberate policy
//! knobs, not derived constants, so they live in [`AbusePolicy`] rather than
//! being hard-coded at call sites.

use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Signal flags
// ---------------------------------------------------------------------------

/// Machine-readable signal names carried on an [`AbuseScore`].
pub mod flags {
    // Content signals
    pub const SUSPICIOUS_PATTERN: &str = "suspicious_pattern";
    pub const WORD_REPETITION: &str = "word_repetition";
    pub const EXCESSIVE_CAPS: &str = "excessive_caps";
    pub const EXCESSIVE_SYMBOLS: &str = "excessive_symbols";
    // Behavioral signals
    pub const COMMENT_BURST: &str = "comment_burst";
    pub const HIGH_REPORT_RATIO: &str = "high_report_ratio";
    pub const NEW_ACCOUNT_SPREE: &str = "new_account_spree";
    // Pattern signals
    pub const NEAR_DUPLICATE: &str = "near_duplicate";
    pub const MEDIA_FLOOD: &str = "media_flood";
    // Vote signals
    pub const VOTE_CHURN: &str = "vote_churn";
    pub const COHORT_VOTING: &str = "cohort_voting";
}

/// Substrings that mark a comment as likely spam: link spam vectors and
/// well-worn solicitation phrases. Matched case-insensitively.
pub const SUSPICIOUS_PATTERNS: &[&str] = &[
    "http://",
    "https://",
    "www.",
    "bit.ly",
    "tinyurl.com",
    "discord.gg",
    "t.me/",
    "free money",
    "free nitro",
    "click here",
    "buy now",
    "limited time",
    "casino",
    "crypto giveaway",
];

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable weights, thresholds, and guards for abuse scoring.
///
/// The defaults are operational policy choices, not derived values. Guards
/// (`*_min_*`) keep ratio checks from firing on trivially short content.
#[derive(Debug, Clone)]
pub struct AbusePolicy {
    /// Points per content signal.
    pub content_weight: i32,
    /// Points per behavioral signal.
    pub behavior_weight: i32,
    /// Points per pattern signal.
    pub pattern_weight: i32,

    /// Score at which content is queued for review, still visible.
    pub review_threshold: i32,
    /// Score at which content is hidden pending review.
    pub flag_threshold: i32,
    /// Score at which content is auto-deleted.
    pub delete_threshold: i32,

    /// One word making up more than this share of tokens is repetition.
    pub repetition_ratio: f64,
    /// Minimum token count before the repetition check applies.
    pub repetition_min_tokens: usize,
    /// Uppercase share of letters above which content counts as shouting.
    pub caps_ratio: f64,
    /// Minimum letter count before the caps check applies.
    pub caps_min_letters: usize,
    /// Non-alphanumeric share of non-whitespace characters counted as noise.
    pub symbol_ratio: f64,
    /// Minimum non-whitespace length before the symbol check applies.
    pub symbol_min_chars: usize,

    /// Comments in the trailing hour above which posting is a burst.
    pub burst_per_hour: i64,
    /// Reports-received to comments-posted ratio marking a problem account.
    pub report_ratio: f64,
    /// Minimum comment count before the report ratio applies.
    pub report_ratio_min_posts: i64,
    /// Account age in hours under which the account counts as new.
    pub young_account_age_hours: i64,
    /// Posts by a new account above which the pace is suspect.
    pub young_account_posts: i64,

    /// Normalized similarity at or above which two comments are duplicates.
    pub duplicate_similarity: f64,
    /// Duplicate matches tolerated before each further match adds a
    /// pattern-weight contribution.
    pub duplicate_allowance: usize,
    /// How many of the author's recent comments the duplicate check scans.
    pub duplicate_lookback: i64,
    /// Comments on one media item within the flood window above which
    /// posting there is a flood.
    pub media_flood_count: i64,
    /// Trailing window for the media flood check, in seconds.
    pub media_flood_window_secs: i64,

    /// Vote direction flips within the churn window above which voting is
    /// churn.
    pub vote_churn_cycles: i32,
    /// Gap in seconds after which a flip streak resets.
    pub vote_churn_window_secs: i64,
    /// Account age in hours bounding the "young cohort" for vote brigading.
    pub cohort_age_hours: i64,
    /// Young-cohort votes on one comment at or above which voting is
    /// coordinated.
    pub cohort_votes: i64,
    /// Vote-abuse score at which the comment is flagged for review.
    pub vote_flag_threshold: i32,
}

impl Default for AbusePolicy {
    fn default() -> Self {
        Self {
            content_weight: 10,
            behavior_weight: 15,
            pattern_weight: 20,
            review_threshold: 30,
            flag_threshold: 50,
            delete_threshold: 80,
            repetition_ratio: 0.3,
            repetition_min_tokens: 6,
            caps_ratio: 0.5,
            caps_min_letters: 12,
            symbol_ratio: 0.3,
            symbol_min_chars: 8,
            burst_per_hour: 20,
            report_ratio: 0.1,
            report_ratio_min_posts: 5,
            young_account_age_hours: 24,
            young_account_posts: 10,
            duplicate_similarity: 0.8,
            duplicate_allowance: 3,
            duplicate_lookback: 10,
            media_flood_count: 5,
            media_flood_window_secs: 300,
            vote_churn_cycles: 3,
            vote_churn_window_secs: 600,
            cohort_age_hours: 24,
            cohort_votes: 5,
            vote_flag_threshold: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Score and recommendation
// ---------------------------------------------------------------------------

/// Result of one evaluation: a weighted total plus the signals that fired.
///
/// `value` is the sum of per-signal contributions. Most signals contribute
/// their group weight once; the near-duplicate signal contributes once per
/// match beyond the allowance, so a sustained copy-paste spree keeps raising
/// the score even when no other signal moves.
#[derive(Debug, Clone, Serialize)]
pub struct AbuseScore {
    pub value: i32,
    pub flags: Vec<&'static str>,
}

impl AbuseScore {
    fn empty() -> Self {
        Self { value: 0, flags: Vec::new() }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(&flag)
    }
}

/// Recommended automated response for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Below every threshold; publish normally.
    None,
    /// Visible, queued for a moderator to look at.
    Review,
    /// Hidden pending review.
    Flag,
    /// Auto-deleted.
    Delete,
}

impl AbusePolicy {
    /// Map a content score to its recommendation band.
    pub fn recommendation(&self, score: i32) -> Recommendation {
        if score >= self.delete_threshold {
            Recommendation::Delete
        } else if score >= self.flag_threshold {
            Recommendation::Flag
        } else if score >= self.review_threshold {
            Recommendation::Review
        } else {
            Recommendation::None
        }
    }

    /// Map a vote-abuse score to its recommendation. Vote abuse never
    /// escalates past a review flag.
    pub fn vote_recommendation(&self, score: i32) -> Recommendation {
        if score >= self.vote_flag_threshold {
            Recommendation::Flag
        } else {
            Recommendation::None
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation inputs
// ---------------------------------------------------------------------------

/// Recent history of the author, gathered by the caller from storage.
#[derive(Debug, Clone)]
pub struct BehaviorSnapshot {
    /// Comments created by this user in the trailing hour.
    pub comments_last_hour: i64,
    /// Comments created by this user over all time.
    pub total_comments: i64,
    /// Reports other users have filed against this user's comments.
    pub reports_received: i64,
    /// When the account was created.
    pub account_created_at: Timestamp,
}

/// Everything one content evaluation looks at.
#[derive(Debug)]
pub struct AbuseInput<'a> {
    /// The comment body under evaluation.
    pub content: &'a str,
    pub behavior: &'a BehaviorSnapshot,
    /// The author's most recent comment bodies, newest first, at most
    /// `duplicate_lookback` entries.
    pub recent_comments: &'a [String],
    /// The author's comments on the same media item within the flood window.
    pub same_media_recent: i64,
}

/// Vote activity on a single comment, gathered by the caller.
#[derive(Debug, Clone)]
pub struct VoteActivity {
    /// Direction flips in the current churn streak for this voter.
    pub reversal_count: i32,
    /// Votes on this comment from accounts younger than the cohort bound.
    pub young_cohort_votes: i64,
}

// ---------------------------------------------------------------------------
// Content signals
// ---------------------------------------------------------------------------

fn content_flags(content: &str, policy: &AbusePolicy) -> Vec<&'static str> {
    let mut fired = Vec::new();
    let lowered = content.to_lowercase();

    if SUSPICIOUS_PATTERNS.iter().any(|p| lowered.contains(p)) {
        fired.push(flags::SUSPICIOUS_PATTERN);
    }

    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.len() >= policy.repetition_min_tokens {
        let mut best = 0usize;
        for token in &tokens {
            let count = tokens.iter().filter(|t| *t == token).count();
            best = best.max(count);
        }
        if best as f64 / tokens.len() as f64 > policy.repetition_ratio {
            fired.push(flags::WORD_REPETITION);
        }
    }

    let letters = content.chars().filter(|c| c.is_alphabetic()).count();
    if letters >= policy.caps_min_letters {
        let upper = content.chars().filter(|c| c.is_uppercase()).count();
        if upper as f64 / letters as f64 > policy.caps_ratio {
            fired.push(flags::EXCESSIVE_CAPS);
        }
    }

    let visible = content.chars().filter(|c| !c.is_whitespace()).count();
    if visible >= policy.symbol_min_chars {
        let symbols = content
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        if symbols as f64 / visible as f64 > policy.symbol_ratio {
            fired.push(flags::EXCESSIVE_SYMBOLS);
        }
    }

    fired
}

// ---------------------------------------------------------------------------
// Text similarity
// ---------------------------------------------------------------------------

/// Normalized similarity between two comment bodies in `[0.0, 1.0]`.
///
/// Computed as `1 - levenshtein / max_len` over lowercased text, so `1.0`
/// means identical modulo case and `0.0` means nothing in common. Two empty
/// strings are identical.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Classic two-row Levenshtein distance over chars.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Score a content-producing action (comment create or edit).
pub fn evaluate(input: &AbuseInput<'_>, policy: &AbusePolicy, now: Timestamp) -> AbuseScore {
    let mut score = AbuseScore::empty();

    for flag in content_flags(input.content, policy) {
        score.value += policy.content_weight;
        score.flags.push(flag);
    }

    let behavior = input.behavior;
    if behavior.comments_last_hour > policy.burst_per_hour {
        score.value += policy.behavior_weight;
        score.flags.push(flags::COMMENT_BURST);
    }
    if behavior.total_comments >= policy.report_ratio_min_posts {
        let ratio = behavior.reports_received as f64 / behavior.total_comments as f64;
        if ratio > policy.report_ratio {
            score.value += policy.behavior_weight;
            score.flags.push(flags::HIGH_REPORT_RATIO);
        }
    }
    let age = now - behavior.account_created_at;
    if age < chrono::Duration::hours(policy.young_account_age_hours)
        && behavior.total_comments > policy.young_account_posts
    {
        score.value += policy.behavior_weight;
        score.flags.push(flags::NEW_ACCOUNT_SPREE);
    }

    let duplicates = input
        .recent_comments
        .iter()
        .filter(|prior| text_similarity(input.content, prior) >= policy.duplicate_similarity)
        .count();
    let excess = duplicates.saturating_sub(policy.duplicate_allowance);
    if excess > 0 {
        score.value += policy.pattern_weight * excess as i32;
        score.flags.push(flags::NEAR_DUPLICATE);
    }
    if input.same_media_recent > policy.media_flood_count {
        score.value += policy.pattern_weight;
        score.flags.push(flags::MEDIA_FLOOD);
    }

    score
}

/// Score voting activity on one comment.
///
/// Self-votes never reach this function; the comment layer rejects them
/// outright before any scoring.
pub fn evaluate_votes(activity: &VoteActivity, policy: &AbusePolicy) -> AbuseScore {
    let mut score = AbuseScore::empty();

    if activity.reversal_count > policy.vote_churn_cycles {
        score.value += policy.pattern_weight;
        score.flags.push(flags::VOTE_CHURN);
    }
    if activity.young_cohort_votes >= policy.cohort_votes {
        score.value += policy.pattern_weight;
        score.flags.push(flags::COHORT_VOTING);
    }

    score
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
