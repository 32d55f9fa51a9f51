use serde::{Deserialize, Serialize};
use std::fmt;

/// Experiment blocks, run in order.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Training,
    Experiment,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Training => "training",
            BlockKind::Experiment => "experiment",
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            BlockKind::Training => Some(BlockKind::Experiment),
            BlockKind::Experiment => None,
        }
    }

    /// Image sub-directory holding this block's stimuli.
    pub fn folder(&self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
