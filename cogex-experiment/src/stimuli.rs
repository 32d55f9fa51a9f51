//! Stimulus listing and the answer key.

use anyhow::{Context, Result};
use cogex_core::{BlockKind, ImageId, StimulusPair, leading_number};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const WITHOUT_NUMBERS: &str = "without_numbers";
pub const WITH_NUMBERS: &str = "with_numbers";

fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Pairs `<root>/<block>/without_numbers/*` with `<root>/<block>/with_numbers/*`.
///
/// Experiment images are ordered by the first number in their name;
/// both blocks are shuffled when `randomize` is set.
pub fn load_block<R: Rng>(
    root: &Path,
    block: BlockKind,
    randomize: bool,
    rng: &mut R,
) -> Result<Vec<StimulusPair>> {
    let dir = root.join(block.folder());
    let baseline_dir = dir.join(WITHOUT_NUMBERS);
    let annotated_dir = dir.join(WITH_NUMBERS);
    let mut baselines = list_files(&baseline_dir)?;
    let mut annotated = list_files(&annotated_dir)?;
    if baselines.len() != annotated.len() {
        anyhow::bail!(
            "{} has {} images but {} has {}",
            baseline_dir.display(),
            baselines.len(),
            annotated_dir.display(),
            annotated.len()
        );
    }
    if block == BlockKind::Experiment {
        baselines.sort_by_key(|n| leading_number(n));
        annotated.sort_by_key(|n| leading_number(n));
    }

    let mut pairs: Vec<StimulusPair> = baselines
        .iter()
        .zip(&annotated)
        .map(|(b, a)| StimulusPair::new(&baseline_dir.join(b), &annotated_dir.join(a)))
        .collect();
    if randomize {
        pairs.shuffle(rng);
    }
    tracing::info!(block = %block, count = pairs.len(), "stimuli loaded");
    Ok(pairs)
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    item_id: String,
    answer: String,
    item_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntry {
    pub answer: String,
    pub item_type: String,
}

/// Correct answers keyed by item id, read from `item_id,answer,item_type`.
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    entries: HashMap<String, AnswerEntry>,
}

impl AnswerKey {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening answer key {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<Rd: std::io::Read>(reader: Rd) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut entries = HashMap::new();
        for row in csv.deserialize() {
            let row: AnswerRow = row.context("malformed answer key row")?;
            entries.insert(
                row.item_id.trim().to_string(),
                AnswerEntry {
                    answer: row.answer,
                    item_type: row.item_type,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn insert(&mut self, id: &ImageId, answer: impl Into<String>, item_type: impl Into<String>) {
        self.entries.insert(
            id.to_string(),
            AnswerEntry {
                answer: answer.into(),
                item_type: item_type.into(),
            },
        );
    }

    pub fn get(&self, id: &ImageId) -> Option<&AnswerEntry> {
        self.entries.get(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<dir>/<participant>_beh_<100..999>.csv`
pub fn results_path<R: Rng>(dir: &Path, participant: &str, rng: &mut R) -> PathBuf {
    let num: u32 = rng.random_range(100..=999);
    dir.join(format!("{participant}_beh_{num}.csv"))
}

/// `<dir>/<participant>_triggers.csv`
pub fn triggers_path(dir: &Path, participant: &str) -> PathBuf {
    dir.join(format!("{participant}_triggers.csv"))
}
