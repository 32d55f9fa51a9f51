//! Trigger ledger for EEG-synchronised experiments.
//!
//! Emits cyclic sequence numbers to a one-byte output port, keeps every
//! emitted trigger so outcome data can be attached once a trial ends, and
//! writes the whole history plus a diagnostic log to a flat report.

pub mod error;
pub mod ledger;
pub mod log;
pub mod port;
pub mod record;
pub mod report;
pub mod vocabulary;

pub use error::{Result, TriggerError};
pub use ledger::{
    AnnotateScope, LedgerConfig, TriggerLedger, CLEAR_VALUE, DEFAULT_HOLD_TIME,
    DEFAULT_TRIGGER_LIMIT, RESERVED_FIELDS,
};
pub use log::{EventLog, LogEntry, LogLevel};
pub use port::{OutputPort, ParallelPort, RecordingPort, DEFAULT_PARPORT};
pub use record::{FieldValue, Fields, TriggerRecord};
pub use report::UNKNOWN;
pub use vocabulary::{TriggerKind, TriggerVocabulary};
