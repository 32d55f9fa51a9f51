use anyhow::{Context, Result};
use cogex_core::{Accuracy, BlockKind, StimulusPair, TrialResult, TrialState};
use cogex_timing::Timer;
use cogex_triggers::{Fields, OutputPort, TriggerError, TriggerLedger};
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ExperimentConfig;
use crate::flip::FlipQueue;
use crate::stimuli::{AnswerKey, results_path, triggers_path};
use crate::trial::{BLOCK_FIXATION_LEAD, Fixation, Responder, ResponseRequest, TrialDurations};
use crate::triggers::TriggerType;

type Ledger<P, T> = TriggerLedger<P, T>;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedReports {
    pub triggers: PathBuf,
    pub results: PathBuf,
}

/// One participant's run: owns the trigger ledger and the behavioral
/// results, and drives the per-trial trigger protocol.
pub struct Session<P, T, R>
where
    P: OutputPort + 'static,
    T: Timer + 'static,
    R: Rng,
{
    pub config: ExperimentConfig,
    pub participant: String,
    durations: TrialDurations,
    choices: Vec<String>,
    ledger: Ledger<P, T>,
    flips: FlipQueue<Ledger<P, T>, TriggerError>,
    timer: T,
    rng: R,
    state: Option<TrialState>,
    results: Vec<TrialResult>,
}

impl<P, T, R> Session<P, T, R>
where
    P: OutputPort + 'static,
    T: Timer + 'static,
    R: Rng,
{
    /// `open_port` is only called when `config.eeg.enabled` is set.
    pub fn new<F>(
        config: ExperimentConfig,
        participant: impl Into<String>,
        timer: T,
        rng: R,
        open_port: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> io::Result<P>,
    {
        config.validate()?;
        let ledger = TriggerLedger::open(config.ledger_config()?, timer.clone(), open_port)
            .context("setting up trigger ledger")?;
        let participant = participant.into();
        tracing::info!(
            participant = %participant,
            eeg = !ledger.is_dummy(),
            "session created"
        );
        Ok(Self {
            durations: TrialDurations::try_from(&config)?,
            choices: config.answer_choices(),
            config,
            participant,
            ledger,
            flips: FlipQueue::new(),
            timer,
            rng,
            state: None,
            results: Vec::new(),
        })
    }

    pub fn ledger(&self) -> &Ledger<P, T> {
        &self.ledger
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    /// Screen currently shown, `None` between trials.
    pub fn state(&self) -> Option<TrialState> {
        self.state
    }

    pub fn call_on_flip<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Ledger<P, T>) -> std::result::Result<(), TriggerError> + 'static,
    {
        self.flips.call_on_flip(f);
    }

    /// Runs the calls queued for this refresh, then holds the frame.
    pub fn flip(&mut self) -> std::result::Result<(), TriggerError> {
        self.flips.flip(&mut self.ledger)?;
        self.timer.sleep(self.durations.frame);
        Ok(())
    }

    pub fn run_block<Resp: Responder>(
        &mut self,
        block: BlockKind,
        stimuli: &[StimulusPair],
        key: &AnswerKey,
        responder: &mut Resp,
    ) -> Result<()> {
        tracing::info!(block = %block, trials = stimuli.len(), "block started");
        if self.durations.fixation == Fixation::Block {
            self.state = Some(TrialState::Fixation);
            self.flip()?;
            self.hold(BLOCK_FIXATION_LEAD, 1);
            self.state = None;
        }
        for (n, stimulus) in stimuli.iter().enumerate() {
            self.run_trial(block, n, stimulus, key, responder)
                .with_context(|| format!("{block} trial {n} ({})", stimulus.name))?;
        }
        Ok(())
    }

    pub fn run_trial<Resp: Responder>(
        &mut self,
        block: BlockKind,
        n: usize,
        stimulus: &StimulusPair,
        key: &AnswerKey,
        responder: &mut Resp,
    ) -> Result<TrialResult> {
        let entry = key
            .get(&stimulus.id)
            .with_context(|| format!("no answer key entry for item {}", stimulus.id))?
            .clone();
        let durations = self.durations.clone();

        self.ledger.start_trial();

        if let Fixation::PerTrial(fixation) = durations.fixation {
            self.state = Some(TrialState::Fixation);
            self.call_on_flip(|l| l.send_trigger(TriggerType::Fixation, None, true));
            self.flip()?;
            self.hold(fixation, 1);
        }

        self.state = Some(TrialState::Stimulus);
        self.onset(TriggerType::Stimulus)?;
        self.hold(durations.stimulus, 2);

        self.state = Some(TrialState::Response);
        self.onset(TriggerType::Answers)?;
        let request = ResponseRequest {
            stimulus,
            mode: self.config.answers_type,
            choices: &self.choices,
            max_len: self.config.text_box_max_elem,
            window: durations.response_window,
        };
        let response = responder.respond(&request);
        if response.is_some() {
            self.ledger.send_trigger(TriggerType::Response, None, true)?;
        }

        let answer = response
            .as_ref()
            .map(|r| r.answer.clone())
            .unwrap_or_default();
        let rt = response.as_ref().map(|r| r.rt.as_secs_f64());
        let acc = Accuracy::score(&answer, &entry.answer);

        let feedback = match block {
            BlockKind::Training => self.config.fdbk_training,
            BlockKind::Experiment => self.config.fdbk_experiment,
        };
        if feedback {
            self.state = Some(TrialState::Feedback);
            self.call_on_flip(|l| l.send_trigger(TriggerType::Feedback, None, true));
            self.flip()?;
            self.hold(durations.feedback, 1);
        }

        let mut fields = Fields::new()
            .with("block", block.name())
            .with("acc", acc.value())
            .with("answer", answer.clone());
        if let Some(rt) = rt {
            fields.insert("rt", rt);
        }
        self.ledger.annotate_recent(fields, -1)?;

        self.state = Some(TrialState::Complete);
        let jitter = durations.wait_jitter.mul_f64(self.rng.random::<f64>());
        self.timer.sleep(durations.wait + jitter);
        self.state = None;

        let result = TrialResult {
            n,
            block_type: block,
            rt,
            acc,
            stimulus: stimulus.name.clone(),
            answer,
            correct_answer: entry.answer,
            item_type: entry.item_type,
        };
        tracing::info!(
            block = %block,
            trial = n,
            acc = acc.value(),
            rt = ?result.rt,
            "trial finished"
        );
        self.results.push(result.clone());
        Ok(result)
    }

    /// Writes the trigger report and the behavioral results into `dir`.
    pub fn save(&mut self, dir: impl AsRef<Path>) -> Result<SavedReports> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let triggers = triggers_path(dir, &self.participant);
        self.ledger
            .persist(&triggers)
            .with_context(|| format!("writing {}", triggers.display()))?;

        let results = results_path(dir, &self.participant, &mut self.rng);
        let mut writer = csv::Writer::from_path(&results)
            .with_context(|| format!("creating {}", results.display()))?;
        for row in &self.results {
            writer.serialize(row)?;
        }
        writer.flush()?;
        tracing::info!(path = %results.display(), rows = self.results.len(), "results saved");

        Ok(SavedReports { triggers, results })
    }

    /// Onset trigger on the next refresh, cleared on the one after.
    fn onset(&mut self, trigger: TriggerType) -> std::result::Result<(), TriggerError> {
        self.call_on_flip(move |l| l.send_trigger(trigger, None, false));
        self.flip()?;
        self.call_on_flip(|l| l.send_clear());
        self.flip()
    }

    /// Keeps the current screen up for `duration`, of which `frames` refreshes
    /// have already elapsed.
    fn hold(&self, duration: Duration, frames: u32) {
        self.timer
            .sleep(duration.saturating_sub(self.durations.frame * frames));
    }
}
