//! Derives a single verdict from the global calls of a gene in a condition
//!
//! The [`SummaryResolver`] combines the presence call and the absence call of
//! one [`GeneCondition`] into a [`Summary`]:
//!
//! - the [`SummaryCallType`]: presence evidence always takes precedence over
//!   absence evidence
//! - the [`SummaryQuality`], derived from the number of supporting data types
//!   according to a [`QualityPolicy`]
//! - the rank and the expression score of expressed calls
use std::fmt::Display;

use tracing::{debug, error};

use crate::call::{AbsenceCall, DataStates, PresenceCall};
use crate::condition::GeneCondition;
use crate::{CallError, CallResult, DEFAULT_SCORE_BOUND};

/// The final verdict about expression of a gene in a condition
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum SummaryCallType {
    /// At least one data type supports expression
    Expressed,
    /// Absence of expression is supported and nothing supports expression
    NotExpressed,
}

impl Display for SummaryCallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryCallType::Expressed => write!(f, "expressed"),
            SummaryCallType::NotExpressed => write!(f, "not expressed"),
        }
    }
}

/// The confidence tier of a [`Summary`]
///
/// `Bronze < Silver < Gold`
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SummaryQuality {
    /// Some supporting evidence
    Bronze,
    /// Good supporting evidence
    Silver,
    /// Strong supporting evidence
    Gold,
}

impl Display for SummaryQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryQuality::Bronze => write!(f, "bronze"),
            SummaryQuality::Silver => write!(f, "silver"),
            SummaryQuality::Gold => write!(f, "gold"),
        }
    }
}

/// The minimal evidence for a quality tier
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct QualityThreshold {
    supporting: usize,
    high_quality: usize,
}

impl QualityThreshold {
    /// Constructs a new threshold
    ///
    /// - `supporting`: minimal number of data types with at least `LowQuality` evidence
    /// - `high_quality`: minimal number of data types with `HighQuality` evidence
    pub fn new(supporting: usize, high_quality: usize) -> Self {
        Self {
            supporting,
            high_quality,
        }
    }

    /// Minimal number of data types with at least `LowQuality` evidence
    pub fn supporting(&self) -> usize {
        self.supporting
    }

    /// Minimal number of data types with `HighQuality` evidence
    pub fn high_quality(&self) -> usize {
        self.high_quality
    }

    fn is_reached(&self, states: &DataStates) -> bool {
        states.supporting_count() >= self.supporting
            && states.high_quality_count() >= self.high_quality
    }

    fn dominates(&self, other: &QualityThreshold) -> bool {
        self.supporting >= other.supporting && self.high_quality >= other.high_quality
    }
}

/// Maps the supporting data types of a call to a [`SummaryQuality`]
///
/// A call reaching the gold threshold is `Gold`, one reaching the silver
/// threshold is `Silver`, every other call is `Bronze`. The gold threshold
/// must not be lower than the silver threshold, so that more evidence
/// never lowers the quality.
///
/// The default policy is:
/// - Gold: at least 2 supporting data types, one of them `HighQuality`
/// - Silver: at least 1 `HighQuality` data type
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct QualityPolicy {
    silver: QualityThreshold,
    gold: QualityThreshold,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            silver: QualityThreshold::new(1, 1),
            gold: QualityThreshold::new(2, 1),
        }
    }
}

impl QualityPolicy {
    /// Constructs a new `QualityPolicy`
    ///
    /// # Errors
    ///
    /// [`CallError::InvalidPolicy`] if the gold threshold is lower than
    /// the silver threshold in any dimension
    ///
    /// # Examples
    ///
    /// ```
    /// use exprcalls::summary::{QualityPolicy, QualityThreshold};
    ///
    /// let strict = QualityPolicy::new(QualityThreshold::new(2, 1), QualityThreshold::new(3, 2));
    /// assert!(strict.is_ok());
    ///
    /// let broken = QualityPolicy::new(QualityThreshold::new(2, 2), QualityThreshold::new(3, 1));
    /// assert!(broken.is_err());
    /// ```
    pub fn new(silver: QualityThreshold, gold: QualityThreshold) -> CallResult<Self> {
        if !gold.dominates(&silver) {
            error!("Gold threshold {:?} is below silver {:?}", gold, silver);
            return Err(CallError::InvalidPolicy(format!(
                "gold {gold:?} must not be lower than silver {silver:?}"
            )));
        }
        Ok(Self { silver, gold })
    }

    /// The silver threshold
    pub fn silver(&self) -> &QualityThreshold {
        &self.silver
    }

    /// The gold threshold
    pub fn gold(&self) -> &QualityThreshold {
        &self.gold
    }

    /// Returns the quality of the evidence
    pub fn quality(&self, states: &DataStates) -> SummaryQuality {
        if self.gold.is_reached(states) {
            SummaryQuality::Gold
        } else if self.silver.is_reached(states) {
            SummaryQuality::Silver
        } else {
            SummaryQuality::Bronze
        }
    }
}

/// The resolved verdict of one gene in one condition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    call_type: SummaryCallType,
    quality: SummaryQuality,
    rank: Option<f64>,
    score: Option<f64>,
    conflict: bool,
}

impl Summary {
    /// Presence or absence of expression
    pub fn call_type(&self) -> SummaryCallType {
        self.call_type
    }

    /// The confidence tier of the verdict
    pub fn quality(&self) -> SummaryQuality {
        self.quality
    }

    /// The weighted mean rank of the presence evidence, lower means
    /// higher expression. `None` for `NotExpressed`.
    pub fn rank(&self) -> Option<f64> {
        self.rank
    }

    /// The expression score, higher means higher expression.
    /// `None` for `NotExpressed`.
    ///
    /// The score is only comparable within the batch it was computed in.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Returns `true` if both presence and absence evidence exist
    pub fn has_conflict(&self) -> bool {
        self.conflict
    }
}

/// Resolves global calls into a [`Summary`]
#[derive(Debug, Clone, Copy)]
pub struct SummaryResolver {
    policy: QualityPolicy,
    score_bound: f64,
}

impl Default for SummaryResolver {
    fn default() -> Self {
        Self::new(QualityPolicy::default(), DEFAULT_SCORE_BOUND)
    }
}

impl SummaryResolver {
    /// Constructs a new `SummaryResolver`
    ///
    /// Scores are in the range `0..=score_bound`.
    pub fn new(policy: QualityPolicy, score_bound: f64) -> Self {
        Self {
            policy,
            score_bound,
        }
    }

    /// Resolves the presence and absence call of one `GeneCondition`
    ///
    /// `max_rank` is the highest rank of the batch and is used to normalize
    /// the expression score.
    ///
    /// Returns `None` if neither call is given.
    pub fn resolve(
        &self,
        presence: Option<&PresenceCall>,
        absence: Option<&AbsenceCall>,
        max_rank: Option<f64>,
    ) -> Option<Summary> {
        let conflict = presence.is_some() && absence.is_some();
        if conflict {
            if let Some(call) = presence {
                debug!("Presence and absence evidence for {}", call.key());
            }
        }

        if let Some(call) = presence {
            let rank = call.rank();
            return Some(Summary {
                call_type: SummaryCallType::Expressed,
                quality: self.policy.quality(call.states()),
                rank,
                score: rank.map(|rank| self.score(rank, max_rank)),
                conflict,
            });
        }

        absence.map(|call| Summary {
            call_type: SummaryCallType::NotExpressed,
            quality: self.policy.quality(call.states()),
            rank: None,
            score: None,
            conflict,
        })
    }

    /// Transforms a rank into a score between 0 and the score bound
    ///
    /// The best possible rank of 1 scores close to the bound, the batch
    /// maximum scores close to 0. Without a batch maximum, `rank` itself
    /// is used as maximum.
    pub fn score(&self, rank: f64, max_rank: Option<f64>) -> f64 {
        let max_rank = match max_rank {
            Some(max) if max > 0.0 => max.max(rank),
            _ => rank.max(1.0),
        };
        let score = (max_rank + 1.0 - rank) * self.score_bound / max_rank;
        score.clamp(0.0, self.score_bound)
    }
}

/// Returns the highest rank of all presence calls
pub fn max_rank_of<'a, I>(calls: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a PresenceCall>,
{
    calls
        .into_iter()
        .filter_map(PresenceCall::rank)
        .fold(None, |max, rank| match max {
            Some(max) if max >= rank => Some(max),
            _ => Some(rank),
        })
}

/// The fully resolved call of a gene in a condition
///
/// This is what the engine returns to its callers.
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    key: GeneCondition,
    presence: Option<PresenceCall>,
    absence: Option<AbsenceCall>,
    summary: Summary,
}

impl ResolvedCall {
    pub(crate) fn new(
        key: GeneCondition,
        presence: Option<PresenceCall>,
        absence: Option<AbsenceCall>,
        summary: Summary,
    ) -> Self {
        Self {
            key,
            presence,
            absence,
            summary,
        }
    }

    /// The gene and condition
    pub fn key(&self) -> &GeneCondition {
        &self.key
    }

    /// The global call built from presence evidence, if any
    pub fn presence(&self) -> Option<&PresenceCall> {
        self.presence.as_ref()
    }

    /// The global call built from absence evidence, if any
    pub fn absence(&self) -> Option<&AbsenceCall> {
        self.absence.as_ref()
    }

    /// The resolved verdict
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}
