//! Partitioning of a voice catalog into matched and unmatched subsets.
//!
//! The heuristic classifier is approximate: it infers attributes from
//! free-text names and descriptions plus whatever labels the service
//! happens to attach, with no ground truth behind it. Callers that need
//! an authoritative selection should use [`AllowlistClassifier`] with an
//! externally curated list of voice ids. Both implement
//! [`VoiceClassifier`], so they are interchangeable wherever one is
//! consumed.

mod allowlist;
mod category;
mod heuristic;

pub use allowlist::AllowlistClassifier;
pub use category::{categorize, VoiceGroup};
pub use heuristic::HeuristicClassifier;

use serde::Serialize;

use crate::voice::Voice;

pub trait VoiceClassifier: Send + Sync {
    /// Whether a single voice belongs to the matched subset.
    fn matches(&self, voice: &Voice) -> bool;

    /// Split `voices` into matched and unmatched subsets. Both keep the
    /// catalog's order and every input voice lands in exactly one of them.
    fn classify(&self, voices: &[Voice]) -> Classification {
        let (matched, unmatched): (Vec<Voice>, Vec<Voice>) =
            voices.iter().cloned().partition(|v| self.matches(v));
        Classification { matched, unmatched }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub matched: Vec<Voice>,
    pub unmatched: Vec<Voice>,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
