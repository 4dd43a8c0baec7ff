// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Soft protection for named processes.
//!
//! An exempt process is still killable, but its score is lowered by a fixed
//! discount so that it loses ties against everything else. The discount only
//! applies to scores at or above `min_score`, and a discounted score never
//! falls below `min_score`.

use tracing::trace;

use super::Candidate;
use crate::tiers::SCORE_ADJ_MIN;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(raw.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(p) => p == name,
            Self::Prefix(p) => name.starts_with(p.as_str()),
        }
    }
}

/// Name patterns (`"vold"`, or `"com.vendor.*"` for a prefix) with a discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionList {
    patterns: Vec<Pattern>,
    discount: i32,
    min_score: i32,
}

impl ExemptionList {
    pub fn new<I, S>(patterns: I, discount: i32, min_score: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter(|p| !p.as_ref().is_empty())
            .map(|p| Pattern::parse(p.as_ref()))
            .collect();

        Self {
            patterns,
            discount: discount.clamp(0, min_score.max(0)),
            min_score,
        }
    }

    /// An empty list; scores pass through unchanged.
    pub fn none() -> Self {
        Self::new(std::iter::empty::<&str>(), 0, 0)
    }

    #[must_use]
    pub fn is_exempt(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    #[must_use]
    pub fn discount(&self) -> i32 {
        self.discount
    }

    #[must_use]
    pub fn min_score(&self) -> i32 {
        self.min_score
    }

    /// Score used for comparison after the discount.
    #[must_use]
    pub fn adjusted_score(&self, candidate: &Candidate) -> i32 {
        let score = candidate.priority_score;
        if score < self.min_score || !self.is_exempt(&candidate.display_name) {
            return score;
        }

        let adjusted = score
            .saturating_sub(self.discount)
            .max(self.min_score)
            .max(SCORE_ADJ_MIN);
        trace!(
            name = %candidate.display_name,
            score,
            adjusted,
            "Exempt process discounted"
        );
        adjusted
    }
}

impl Default for ExemptionList {
    fn default() -> Self {
        Self::none()
    }
}
