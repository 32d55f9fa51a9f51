pub mod config;
pub mod flip;
pub mod session;
pub mod stimuli;
pub mod trial;
pub mod triggers;
pub use config::{ConfigError, EegConfig, ExperimentConfig};
pub use flip::FlipQueue;
pub use session::{SavedReports, Session};
pub use stimuli::{AnswerEntry, AnswerKey, load_block};
pub use trial::{
    BLOCK_FIXATION_LEAD, Fixation, Responder, Response, ResponseRequest, ScriptedResponder,
    TrialDurations,
};
pub use triggers::{EXTRA_FIELDS, TriggerType};
