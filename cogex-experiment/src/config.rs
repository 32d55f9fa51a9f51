use cogex_core::{AnswerMode, TextSymbols};
use cogex_triggers::{
    DEFAULT_PARPORT, DEFAULT_TRIGGER_LIMIT, LedgerConfig, TriggerVocabulary,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::triggers::{EXTRA_FIELDS, TriggerType};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub procedure_test: bool,
    pub randomize_trials: bool,
    /// 0 skips the fixation screen, -1 keeps it up for the whole block.
    pub fixation_time_ms: i64,
    pub stimulus_time_ms: u64,
    pub answer_time_ms: u64,
    pub answers_type: AnswerMode,
    pub reaction_keys: Vec<String>,
    pub answer_symbols: Vec<String>,
    pub text_box_text_type: TextSymbols,
    pub text_box_symbols: Vec<char>,
    pub text_box_max_elem: usize,
    pub fdbk_training: bool,
    pub fdbk_experiment: bool,
    pub fdbk_show_time_ms: u64,
    pub wait_time_ms: u64,
    pub wait_jitter_ms: u64,
    pub frame_rate_hz: f64,
    pub eeg: EegConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            procedure_test: false,
            randomize_trials: true,
            fixation_time_ms: 500,
            stimulus_time_ms: 2000,
            answer_time_ms: 10_000,
            answers_type: AnswerMode::Keyboard,
            reaction_keys: ["1", "2", "3", "4"].map(String::from).to_vec(),
            answer_symbols: ["1", "2", "3", "4"].map(String::from).to_vec(),
            text_box_text_type: TextSymbols::Integer,
            text_box_symbols: Vec::new(),
            text_box_max_elem: 3,
            fdbk_training: true,
            fdbk_experiment: false,
            fdbk_show_time_ms: 1000,
            wait_time_ms: 1000,
            wait_jitter_ms: 500,
            frame_rate_hz: 60.0,
            eeg: EegConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EegConfig {
    pub enabled: bool,
    pub port: String,
    /// Seconds a trigger value is held before clearing.
    pub trigger_time: f64,
    pub trigger_limit: u8,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_PARPORT.to_string(),
            trigger_time: 0.004,
            trigger_limit: DEFAULT_TRIGGER_LIMIT,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.answer_time_ms == 0 {
            return Err(ConfigError::Invalid("answer_time_ms must be positive".into()));
        }
        match self.answers_type {
            AnswerMode::Keyboard if self.reaction_keys.is_empty() => {
                return Err(ConfigError::Invalid("reaction_keys is empty".into()));
            }
            AnswerMode::Mouse if self.answer_symbols.is_empty() => {
                return Err(ConfigError::Invalid("answer_symbols is empty".into()));
            }
            AnswerMode::Text if self.text_box_max_elem == 0 => {
                return Err(ConfigError::Invalid("text_box_max_elem must be positive".into()));
            }
            AnswerMode::Text
                if self.text_box_text_type == TextSymbols::Custom
                    && self.text_box_symbols.is_empty() =>
            {
                return Err(ConfigError::Invalid(
                    "custom text box needs text_box_symbols".into(),
                ));
            }
            _ => {}
        }
        if self.fixation_time_ms < -1 {
            return Err(ConfigError::Invalid(format!(
                "fixation_time_ms must be -1, 0 or positive, got {}",
                self.fixation_time_ms
            )));
        }
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(ConfigError::Invalid("frame_rate_hz must be positive".into()));
        }
        self.frame_duration()?;
        self.trigger_hold_time()?;
        if self.eeg.trigger_limit == 0 {
            return Err(ConfigError::Invalid("eeg.trigger_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> Result<LedgerConfig, ConfigError> {
        Ok(LedgerConfig::new(TriggerVocabulary::of::<TriggerType>())
            .with_extra_fields(EXTRA_FIELDS)
            .with_dummy_mode(!self.eeg.enabled)
            .with_hold_time(self.trigger_hold_time()?)
            .with_trigger_limit(self.eeg.trigger_limit))
    }

    /// One display refresh.
    pub fn frame_duration(&self) -> Result<Duration, ConfigError> {
        seconds("frame_rate_hz", 1.0 / self.frame_rate_hz)
    }

    pub fn trigger_hold_time(&self) -> Result<Duration, ConfigError> {
        seconds("eeg.trigger_time", self.eeg.trigger_time)
    }

    /// Answers the simulated or real participant may give.
    pub fn answer_choices(&self) -> Vec<String> {
        match self.answers_type {
            AnswerMode::Keyboard => self.reaction_keys.clone(),
            AnswerMode::Mouse => self.answer_symbols.clone(),
            AnswerMode::Text => self
                .text_box_text_type
                .allowed(&self.text_box_symbols)
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

fn seconds(key: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::Invalid(format!("{key} gives no usable duration ({secs}s): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = ExperimentConfig::from_yaml(
            "answers_type: text\ntext_box_text_type: letters\neeg:\n  trigger_time: 0.008\n",
        )
        .unwrap();
        assert_eq!(config.answers_type, AnswerMode::Text);
        assert_eq!(config.eeg.trigger_time, 0.008);
        assert_eq!(config.eeg.trigger_limit, DEFAULT_TRIGGER_LIMIT);
        assert_eq!(config.answer_choices().len(), 52);

        let ledger = config.ledger_config().unwrap();
        assert!(ledger.dummy_mode);
        assert_eq!(ledger.hold_time, Duration::from_millis(8));
    }

    #[test]
    fn unknown_symbol_set_is_a_parse_error() {
        let err = ExperimentConfig::from_yaml("text_box_text_type: emoji\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn custom_text_without_symbols_is_invalid() {
        let err = ExperimentConfig::from_yaml("answers_type: text\ntext_box_text_type: custom\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_trigger_time_is_invalid() {
        let err = ExperimentConfig::from_yaml("eeg:\n  trigger_time: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn huge_durations_are_invalid() {
        for yaml in ["eeg:\n  trigger_time: 1.0e20\n", "frame_rate_hz: 1.0e-30\n"] {
            let err = ExperimentConfig::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}");
        }
    }

    #[test]
    fn fixation_time_below_block_mode_is_invalid() {
        assert!(ExperimentConfig::from_yaml("fixation_time_ms: -1\n").is_ok());
        let err = ExperimentConfig::from_yaml("fixation_time_ms: -2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
