use crate::block::BlockKind;
use serde::{Serialize, Serializer};

/// Screens of a single trial, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    Stimulus,
    Response,
    Feedback,
    Complete,
}

/// Scored outcome: `1` correct, `0` incorrect, `-1` no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accuracy {
    Correct,
    Incorrect,
    NoAnswer,
}

impl Accuracy {
    pub fn score(answer: &str, correct_answer: &str) -> Self {
        if answer.is_empty() {
            Accuracy::NoAnswer
        } else if answer == correct_answer {
            Accuracy::Correct
        } else {
            Accuracy::Incorrect
        }
    }

    pub fn value(&self) -> i64 {
        match self {
            Accuracy::Correct => 1,
            Accuracy::Incorrect => 0,
            Accuracy::NoAnswer => -1,
        }
    }
}

impl Serialize for Accuracy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

/// Behavioral result row, one per trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResult {
    pub n: usize,
    pub block_type: BlockKind,
    /// Seconds from response window onset; empty when no answer was given.
    pub rt: Option<f64>,
    pub acc: Accuracy,
    pub stimulus: String,
    pub answer: String,
    pub correct_answer: String,
    pub item_type: String,
}
