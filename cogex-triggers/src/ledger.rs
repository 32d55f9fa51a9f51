use crate::error::{Result, TriggerError};
use crate::log::{EventLog, LogLevel};
use crate::port::OutputPort;
use crate::record::{Fields, TriggerRecord};
use crate::vocabulary::TriggerVocabulary;
use cogex_timing::Timer;
use colored::Colorize;
use std::io;
use std::time::Duration;

pub const CLEAR_VALUE: u8 = 0x00;
pub const DEFAULT_TRIGGER_LIMIT: u8 = 60;
pub const DEFAULT_HOLD_TIME: Duration = Duration::from_millis(4);

/// Column names that are always present in the report.
pub const RESERVED_FIELDS: [&str; 2] = ["trigger_no", "trigger_type"];

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub trigger_types: TriggerVocabulary,
    pub extra_fields: Vec<String>,
    pub dummy_mode: bool,
    /// How long a trigger value stays on the port before it is cleared.
    pub hold_time: Duration,
    pub trigger_limit: u8,
}

impl LedgerConfig {
    pub fn new(trigger_types: TriggerVocabulary) -> Self {
        Self {
            trigger_types,
            extra_fields: Vec::new(),
            dummy_mode: true,
            hold_time: DEFAULT_HOLD_TIME,
            trigger_limit: DEFAULT_TRIGGER_LIMIT,
        }
    }

    pub fn with_extra_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hold_time(mut self, hold_time: Duration) -> Self {
        self.hold_time = hold_time;
        self
    }

    pub fn with_trigger_limit(mut self, limit: u8) -> Self {
        self.trigger_limit = limit;
        self
    }

    pub fn with_dummy_mode(mut self, dummy_mode: bool) -> Self {
        self.dummy_mode = dummy_mode;
        self
    }
}

/// Which already-sent triggers an annotation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateScope {
    /// The `n` most recent triggers.
    Last(usize),
    /// Every trigger since the last `start_trial()`. Consumes the marker.
    CurrentTrial,
}

impl TryFrom<i64> for AnnotateScope {
    type Error = TriggerError;

    fn try_from(how_many: i64) -> Result<Self> {
        match how_many {
            -1 => Ok(AnnotateScope::CurrentTrial),
            n if n < -1 => Err(TriggerError::InvalidArgument(n)),
            n => Ok(AnnotateScope::Last(n as usize)),
        }
    }
}

/// Owns the trigger counter, the record history and the output port.
///
/// Usage from a trial loop:
///
/// 1. `start_trial()` once per trial
/// 2. `send_trigger(..)` at every event boundary (with `with_delay = false`
///    when called on a display flip, followed later by `send_clear()`)
/// 3. `annotate_recent(fields, -1)` once the outcome is known
/// 4. `persist(path)` at the end of the session
pub struct TriggerLedger<P: OutputPort, T: Timer> {
    port: Option<P>,
    timer: T,
    created: T::Timestamp,
    trigger_types: TriggerVocabulary,
    extra_fields: Vec<String>,
    hold_time: Duration,
    trigger_limit: u8,
    counter: u8,
    marker: Option<usize>,
    records: Vec<TriggerRecord>,
    events: EventLog,
}

impl<P: OutputPort, T: Timer> TriggerLedger<P, T> {
    /// Builds a ledger without a port. `config.dummy_mode` is only honoured
    /// by [`TriggerLedger::open`]; a ledger built here stays in dummy mode
    /// until [`TriggerLedger::connect`].
    pub fn new(config: LedgerConfig, timer: T) -> Result<Self> {
        if config.trigger_limit == 0 {
            return Err(TriggerError::InvalidTriggerLimit);
        }
        if config.trigger_types.is_empty() {
            return Err(TriggerError::EmptyVocabulary);
        }
        let mut extra_fields: Vec<String> = Vec::with_capacity(config.extra_fields.len());
        for field in config.extra_fields {
            if RESERVED_FIELDS.contains(&field.as_str()) {
                return Err(TriggerError::ReservedField(field));
            }
            if !extra_fields.contains(&field) {
                extra_fields.push(field);
            }
        }

        let created = timer.now();
        let mut ledger = Self {
            port: None,
            timer,
            created,
            trigger_types: config.trigger_types,
            extra_fields,
            hold_time: config.hold_time,
            trigger_limit: config.trigger_limit,
            counter: 1,
            marker: None,
            records: Vec::new(),
            events: EventLog::new(),
        };

        ledger.log(
            LogLevel::Info,
            format!(
                "TriggerLedger constructed with params: dummy_mode={},trigger_time={}",
                config.dummy_mode,
                ledger.hold_time.as_secs_f64()
            ),
        );
        ledger.log(
            LogLevel::Info,
            format!("Possible trigger types registered: {}", ledger.trigger_types),
        );
        if ledger.extra_fields.is_empty() {
            ledger.warn_visible(
                LogLevel::Warning,
                "No trigger info columns set, so only trigger_type will be recorded.".into(),
            );
        }
        ledger.log(
            LogLevel::Info,
            format!("Params registered: [{}]", ledger.params().join(", ")),
        );
        ledger.log(
            LogLevel::Info,
            format!("Trigger limit set to: {}", ledger.trigger_limit),
        );
        Ok(ledger)
    }

    /// Builds a ledger and, unless `config.dummy_mode` is set, connects it
    /// right away with `open`.
    pub fn open<F>(config: LedgerConfig, timer: T, open: F) -> Result<Self>
    where
        F: FnOnce() -> io::Result<P>,
    {
        let dummy_mode = config.dummy_mode;
        let mut ledger = Self::new(config, timer)?;
        if !dummy_mode {
            ledger.connect(open)?;
        }
        Ok(ledger)
    }

    /// Acquires the output port. `open` is not called when a port is
    /// already held.
    pub fn connect<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce() -> io::Result<P>,
    {
        if self.port.is_some() {
            self.log(
                LogLevel::Warning,
                "Connection to EEG already established.".into(),
            );
            println!("{}", "Already connected to EEG".yellow());
            return Ok(());
        }
        match open() {
            Ok(port) => {
                self.port = Some(port);
                self.log(LogLevel::Info, "Connected to EEG".into());
                Ok(())
            }
            Err(e) => {
                self.log(
                    LogLevel::Critical,
                    format!("Failed to open output port: {e}"),
                );
                Err(TriggerError::Port(e))
            }
        }
    }

    /// Emits a trigger carrying the current sequence number.
    ///
    /// In live mode the value is written before anything else is checked.
    /// With `with_delay` the call blocks for the hold time and clears the
    /// port; otherwise the caller must `send_clear()` later.
    pub fn send_trigger(
        &mut self,
        trigger_type: impl AsRef<str>,
        extra_fields: Option<Fields>,
        with_delay: bool,
    ) -> Result<()> {
        let trigger_type = trigger_type.as_ref();
        let value = self.counter;
        self.write_port(value)?;
        if self.port.is_some() {
            self.log(LogLevel::Info, format!("Value: {value} sent to EEG."));
        }

        self.log(
            LogLevel::Info,
            format!(
                "send_trigger() run with params trigger_type={trigger_type}, info={}, with_delay={with_delay}",
                extra_fields
                    .as_ref()
                    .map_or_else(|| "None".to_string(), |f| f.to_string())
            ),
        );
        if !self.trigger_types.contains(trigger_type) {
            self.log(
                LogLevel::Critical,
                format!("There's no trigger type called: {trigger_type}."),
            );
            return Err(TriggerError::UnknownTriggerType(trigger_type.to_string()));
        }

        // The value is already on the line, so the record is kept even if
        // the clear fails.
        let mut cleared = Ok(());
        if with_delay {
            self.timer.sleep(self.hold_time);
            if self.port.is_some() {
                cleared = self.write_port(CLEAR_VALUE);
                if cleared.is_ok() {
                    self.log(LogLevel::Info, "Clear message sent to EEG.".into());
                }
            }
        }

        let mut extra = extra_fields.unwrap_or_default();
        let dropped = extra.retain_names(|name| self.extra_fields.iter().any(|f| f == name));
        if !dropped.is_empty() {
            self.warn_visible(
                LogLevel::Warning,
                format!(
                    "Params: [{}] are unregistered and won't be saved.",
                    dropped.join(", ")
                ),
            );
        }

        self.records
            .push(TriggerRecord::new(value, trigger_type.to_string(), extra));
        self.counter = if self.counter >= self.trigger_limit {
            1
        } else {
            self.counter + 1
        };
        if let Some(pos) = self.marker.as_mut() {
            *pos += 1;
        }
        cleared
    }

    /// Shorthand for a trigger without extra fields, held for the hold time.
    pub fn trigger(&mut self, trigger_type: impl AsRef<str>) -> Result<()> {
        self.send_trigger(trigger_type, None, true)
    }

    pub fn send_clear(&mut self) -> Result<()> {
        if self.port.is_some() {
            self.write_port(CLEAR_VALUE)?;
            self.log(
                LogLevel::Info,
                "Clear sent to EEG (manually by user).".into(),
            );
        } else {
            self.log(
                LogLevel::Info,
                "send_clear() called in dummy mode, nothing sent.".into(),
            );
        }
        Ok(())
    }

    /// Starts counting triggers for a new trial.
    pub fn start_trial(&mut self) {
        if self.marker.is_some() {
            self.warn_visible(
                LogLevel::Warning,
                "New trial position marker was set without the previous one being used.".into(),
            );
        }
        self.marker = Some(0);
    }

    /// Adds `extra_fields` to already-sent triggers.
    ///
    /// `how_many == -1` covers every trigger since the last `start_trial()`.
    pub fn annotate_recent(&mut self, extra_fields: Fields, how_many: i64) -> Result<()> {
        let scope = match AnnotateScope::try_from(how_many) {
            Ok(scope) => scope,
            Err(e) => {
                self.log(
                    LogLevel::Critical,
                    format!("annotate_recent() called with how_many={how_many} which doesn't make sense."),
                );
                return Err(e);
            }
        };
        self.annotate(extra_fields, scope)
    }

    pub fn annotate(&mut self, mut extra_fields: Fields, scope: AnnotateScope) -> Result<()> {
        let count = match scope {
            AnnotateScope::Last(n) => n,
            AnnotateScope::CurrentTrial => match self.marker.take() {
                Some(n) => n,
                None => {
                    self.log(
                        LogLevel::Critical,
                        "Cannot add info to current trial because no trial was started.".into(),
                    );
                    return Err(TriggerError::NoActiveTrial);
                }
            },
        };
        let available = self.records.len();
        if available < count {
            self.log(
                LogLevel::Critical,
                format!("Cannot annotate {count} triggers, only {available} recorded."),
            );
            return Err(TriggerError::InsufficientHistory {
                requested: count,
                available,
            });
        }

        let dropped = extra_fields.retain_names(|name| self.extra_fields.iter().any(|f| f == name));
        if !dropped.is_empty() {
            self.warn_visible(
                LogLevel::Warning,
                format!(
                    "Params: [{}] are unregistered so won't be saved.",
                    dropped.join(", ")
                ),
            );
        }

        for idx in (available - count..available).rev() {
            let overwritten: Vec<&str> = extra_fields
                .names()
                .filter(|name| self.records[idx].extra.contains(name))
                .collect();
            if !overwritten.is_empty() {
                let msg = format!(
                    "[{}] will be overwritten on trigger {}.",
                    overwritten.join(", "),
                    self.records[idx].sequence_number()
                );
                self.warn_visible(LogLevel::Critical, msg);
            }
            self.records[idx].extra.merge(&extra_fields);
        }
        Ok(())
    }

    pub fn records(&self) -> &[TriggerRecord] {
        &self.records
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Sequence number the next trigger will carry.
    pub fn next_sequence_number(&self) -> u8 {
        self.counter
    }

    /// Triggers sent since `start_trial()`, or `None` when no trial is open.
    pub fn trial_marker(&self) -> Option<usize> {
        self.marker
    }

    pub fn is_dummy(&self) -> bool {
        self.port.is_none()
    }

    pub fn trigger_limit(&self) -> u8 {
        self.trigger_limit
    }

    /// Report columns: the reserved fields followed by the registered extras.
    pub fn params(&self) -> Vec<&str> {
        RESERVED_FIELDS
            .iter()
            .copied()
            .chain(self.extra_fields.iter().map(String::as_str))
            .collect()
    }

    fn write_port(&mut self, value: u8) -> Result<()> {
        let Some(port) = self.port.as_mut() else {
            return Ok(());
        };
        if let Err(e) = port.set_data(value) {
            self.log(
                LogLevel::Critical,
                format!("Writing {value} to the output port failed: {e}"),
            );
            return Err(TriggerError::Port(e));
        }
        Ok(())
    }

    fn log(&mut self, level: LogLevel, message: String) {
        let elapsed = self.timer.elapsed(self.created);
        self.events.push(elapsed, level, message);
    }

    fn warn_visible(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Critical => println!("{}", message.red()),
            _ => println!("{}", message.yellow()),
        }
        self.log(level, message);
    }
}
