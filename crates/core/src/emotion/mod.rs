mod sampler;

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

pub use sampler::{Sampler, SamplerChannels};

/// Fallback label used whenever no samples were collected in a period.
pub const NEUTRAL_LABEL: &str = "neutral";

/// A single emotion tag as reported by the classifier (e.g. "happy", "sad").
/// The vocabulary is owned by the remote service; locally a label is just a
/// validated non-empty string.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmotionLabel(String);

impl EmotionLabel {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, LabelError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self(v))
    }

    pub fn neutral() -> Self {
        Self(NEUTRAL_LABEL.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("emotion label must not be empty")]
    Empty,
}

/// Rolling buffer of labels collected since the last period boundary.
///
/// `roll_up` computes the dominant label and clears the buffer in the same
/// call, so no sample can be counted in two periods.
#[derive(Clone, Debug, Default)]
pub struct EmotionTally {
    samples: Vec<EmotionLabel>,
}

impl EmotionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: EmotionLabel) {
        self.samples.push(label);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most frequent label in the buffer; neutral when the buffer is empty.
    /// Ties break to the lexicographically smallest label.
    pub fn dominant(&self) -> EmotionLabel {
        let mut counts: BTreeMap<&EmotionLabel, usize> = BTreeMap::new();
        for label in &self.samples {
            *counts.entry(label).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .fold(None::<(&EmotionLabel, usize)>, |best, (label, count)| {
                match best {
                    Some((_, best_count)) if best_count >= count => best,
                    _ => Some((label, count)),
                }
            })
            .map(|(label, _)| label.clone())
            .unwrap_or_else(EmotionLabel::neutral)
    }

    /// Dominant label for the finished period, buffer cleared atomically.
    pub fn roll_up(&mut self) -> EmotionLabel {
        let dominant = self.dominant();
        self.samples.clear();
        dominant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> EmotionLabel {
        EmotionLabel::new(s).expect("valid label")
    }

    #[test]
    fn label_rejects_empty_and_whitespace() {
        assert_eq!(EmotionLabel::new(""), Err(LabelError::Empty));
        assert_eq!(EmotionLabel::new("   "), Err(LabelError::Empty));
        assert_eq!(label("happy").as_str(), "happy");
    }

    #[test]
    fn dominant_has_maximal_count() {
        let mut tally = EmotionTally::new();
        for s in ["happy", "sad", "happy", "angry", "happy", "sad"] {
            tally.record(label(s));
        }
        assert_eq!(tally.dominant(), label("happy"));
    }

    #[test]
    fn empty_buffer_yields_neutral() {
        let tally = EmotionTally::new();
        assert_eq!(tally.dominant(), EmotionLabel::neutral());
    }

    #[test]
    fn roll_up_clears_and_next_period_is_neutral() {
        let mut tally = EmotionTally::new();
        tally.record(label("happy"));
        tally.record(label("happy"));
        tally.record(label("sad"));

        assert_eq!(tally.roll_up(), label("happy"));
        assert!(tally.is_empty());
        assert_eq!(tally.roll_up(), EmotionLabel::neutral());
    }

    #[test]
    fn ties_break_to_lexicographically_smallest() {
        let mut tally = EmotionTally::new();
        for s in ["surprise", "angry", "surprise", "angry"] {
            tally.record(label(s));
        }
        assert_eq!(tally.dominant(), label("angry"));
    }
}
