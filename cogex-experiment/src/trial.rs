use cogex_core::{AnswerMode, StimulusPair};
use std::time::Duration;

use crate::config::{ConfigError, ExperimentConfig};

/// How long the block-wide fixation stays up before the first trial.
pub const BLOCK_FIXATION_LEAD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixation {
    Skip,
    /// Fixation screen with its own trigger at the start of every trial.
    PerTrial(Duration),
    /// Fixation drawn under the whole block, without per-trial triggers.
    Block,
}

impl Fixation {
    pub fn from_millis(ms: i64) -> Self {
        match ms {
            ms if ms < 0 => Fixation::Block,
            0 => Fixation::Skip,
            ms => Fixation::PerTrial(Duration::from_millis(ms.unsigned_abs())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialDurations {
    /// One display refresh.
    pub frame: Duration,
    pub fixation: Fixation,
    pub stimulus: Duration,
    pub response_window: Duration,
    pub feedback: Duration,
    pub wait: Duration,
    pub wait_jitter: Duration,
}

impl TryFrom<&ExperimentConfig> for TrialDurations {
    type Error = ConfigError;

    fn try_from(config: &ExperimentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            frame: config.frame_duration()?,
            fixation: Fixation::from_millis(config.fixation_time_ms),
            stimulus: Duration::from_millis(config.stimulus_time_ms),
            response_window: Duration::from_millis(config.answer_time_ms),
            feedback: Duration::from_millis(config.fdbk_show_time_ms),
            wait: Duration::from_millis(config.wait_time_ms),
            wait_jitter: Duration::from_millis(config.wait_jitter_ms),
        })
    }
}

/// What the participant is asked for when the numbered variant is shown.
#[derive(Debug, Clone)]
pub struct ResponseRequest<'a> {
    pub stimulus: &'a StimulusPair,
    pub mode: AnswerMode,
    pub choices: &'a [String],
    /// Maximum answer length in text mode.
    pub max_len: usize,
    pub window: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub answer: String,
    /// Time from response window onset.
    pub rt: Duration,
}

/// Source of answers: a real input device, a script, or a simulation.
pub trait Responder {
    /// Blocks until an answer is given or the window closes.
    fn respond(&mut self, request: &ResponseRequest<'_>) -> Option<Response>;
}

/// Replays answers in order; `None` entries time out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponder {
    answers: std::collections::VecDeque<Option<Response>>,
}

impl ScriptedResponder {
    pub fn new(answers: impl IntoIterator<Item = Option<Response>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

impl Responder for ScriptedResponder {
    fn respond(&mut self, request: &ResponseRequest<'_>) -> Option<Response> {
        self.answers
            .pop_front()
            .flatten()
            .filter(|r| r.rt <= request.window)
    }
}
