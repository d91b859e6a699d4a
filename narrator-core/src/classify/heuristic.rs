use std::collections::{BTreeMap, BTreeSet};

use super::VoiceClassifier;
use crate::voice::Voice;

/// Best-effort matching over voice metadata. A voice matches when its name
/// or description contains any indicator term (case-insensitive), or when
/// any label predicate matches its labels exactly (case-sensitive).
///
/// Indicator terms are trimmed and lowercased on construction. Terms that
/// are blank after trimming are dropped, so an empty string never matches
/// every voice.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    indicator_terms: BTreeSet<String>,
    label_predicates: BTreeMap<String, String>,
}

impl HeuristicClassifier {
    pub fn new<I, S>(indicator_terms: I, label_predicates: BTreeMap<String, String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indicator_terms = indicator_terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            indicator_terms,
            label_predicates,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_predicates.insert(key.into(), value.into());
        self
    }

    fn text_matches(&self, voice: &Voice) -> bool {
        if self.indicator_terms.is_empty() {
            return false;
        }
        let name = voice.name.to_lowercase();
        let description = voice.description.to_lowercase();
        self.indicator_terms
            .iter()
            .any(|term| name.contains(term.as_str()) || description.contains(term.as_str()))
    }

    fn label_matches(&self, voice: &Voice) -> bool {
        self.label_predicates
            .iter()
            .any(|(key, value)| voice.labels.get(key) == Some(value))
    }
}

impl VoiceClassifier for HeuristicClassifier {
    fn matches(&self, voice: &Voice) -> bool {
        self.text_matches(voice) || self.label_matches(voice)
    }
}
