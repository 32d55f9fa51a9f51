//! Error types for the trigger ledger

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("there's no trigger type called: {0}")]
    UnknownTriggerType(String),

    #[error("how_many was set to {0}, expected -1 or a non-negative count")]
    InvalidArgument(i64),

    #[error("no trial marker set, call start_trial() first")]
    NoActiveTrial,

    #[error("cannot annotate {requested} triggers, only {available} recorded")]
    InsufficientHistory { requested: usize, available: usize },

    #[error("trigger vocabulary is empty")]
    EmptyVocabulary,

    #[error("field name {0} is reserved")]
    ReservedField(String),

    #[error("trigger limit must be at least 1")]
    InvalidTriggerLimit,

    #[error("output port error: {0}")]
    Port(#[source] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TriggerError>;
