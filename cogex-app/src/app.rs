use anyhow::{Context, Result};
use cogex_core::BlockKind;
use cogex_experiment::{AnswerKey, ExperimentConfig, Session, load_block};
use cogex_timing::HighPrecisionTimer;
use cogex_triggers::ParallelPort;
use rand::rngs::ThreadRng;
use std::path::PathBuf;

use crate::participant::SimulatedParticipant;

const DEFAULT_CONFIG: &str = "config.yaml";
const IMAGES_DIR: &str = "images";
const ANSWER_KEY: &str = "answers.csv";
const RESULTS_DIR: &str = "results";
const TEST_PARTICIPANT: &str = "test";

type AppSession = Session<ParallelPort, HighPrecisionTimer, ThreadRng>;

/// Headless run of both blocks with a simulated participant.
pub struct App {
    config_path: PathBuf,
    participant: Option<String>,
    images: PathBuf,
    results: PathBuf,
}

impl App {
    /// `cogex-app [config.yaml] [participant]`
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let config_path = args
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
        let participant = args.next();
        Ok(Self {
            config_path,
            participant,
            images: PathBuf::from(IMAGES_DIR),
            results: PathBuf::from(RESULTS_DIR),
        })
    }

    pub fn run(self) -> Result<()> {
        let config = ExperimentConfig::load(&self.config_path)?;
        let participant = match (&self.participant, config.procedure_test) {
            (_, true) => TEST_PARTICIPANT.to_string(),
            (Some(p), false) => p.clone(),
            (None, false) => anyhow::bail!("participant id required unless procedure_test is set"),
        };

        #[cfg(target_os = "windows")]
        unsafe {
            windows::Win32::Media::timeBeginPeriod(1);
        }

        println!("=== COGNITIVE EXPERIMENT APPLICATION ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Architecture: {}", std::env::consts::ARCH);
        println!("Participant: {participant}\n");

        let port = config.eeg.port.clone();
        let timer = HighPrecisionTimer::new();
        let mut session: AppSession = Session::new(
            config,
            participant,
            timer.clone(),
            rand::rng(),
            move || ParallelPort::open(&port),
        )?;

        let outcome = self.run_blocks(&mut session, timer);

        // Reports are written even when a block failed part-way.
        let saved = session.save(&self.results);

        #[cfg(target_os = "windows")]
        unsafe {
            windows::Win32::Media::timeEndPeriod(1);
        }

        match (outcome, saved) {
            (Err(e), Err(save_err)) => {
                tracing::error!(error = %save_err, "could not save reports");
                Err(e)
            }
            (Err(e), Ok(_)) => Err(e),
            (Ok(()), saved) => {
                let saved = saved?;
                println!("Triggers: {}", saved.triggers.display());
                println!("Results:  {}", saved.results.display());
                Ok(())
            }
        }
    }

    fn run_blocks(&self, session: &mut AppSession, timer: HighPrecisionTimer) -> Result<()> {
        let key = AnswerKey::load(self.images.join(ANSWER_KEY))?;
        let randomize = session.config.randomize_trials;
        let mut responder = SimulatedParticipant::new(timer, rand::rng());
        let mut rng = rand::rng();

        let mut block = Some(BlockKind::Training);
        while let Some(kind) = block {
            let stimuli = load_block(&self.images, kind, randomize, &mut rng)
                .with_context(|| format!("loading {kind} stimuli"))?;
            session.run_block(kind, &stimuli, &key, &mut responder)?;
            println!("{kind} block done: {} trials", stimuli.len());
            block = kind.next();
        }
        Ok(())
    }
}
