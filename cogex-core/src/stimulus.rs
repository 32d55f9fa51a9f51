use std::fmt;
use std::path::{Path, PathBuf};

/// Item identifier derived from a stimulus file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageId {
    Number(u64),
    Name(String),
}

impl ImageId {
    /// `12_matrix.png` -> `Number(12)`, `sample.png` -> `Name("sample")`.
    pub fn from_file_name(name: &str) -> Self {
        let stem = match name.split_once('_') {
            Some((prefix, _)) => prefix,
            None => name.split('.').next().unwrap_or(name),
        };
        match stem.parse() {
            Ok(n) => ImageId::Number(n),
            Err(_) => ImageId::Name(stem.to_string()),
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Number(n) => write!(f, "{n}"),
            ImageId::Name(s) => f.write_str(s),
        }
    }
}

/// First run of ASCII digits in `name`, used to order experiment images.
pub fn leading_number(name: &str) -> Option<u64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Baseline image and its numbered variant shown in the response window.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusPair {
    pub id: ImageId,
    /// File name of the baseline image, reported in the results.
    pub name: String,
    pub baseline: PathBuf,
    pub annotated: PathBuf,
}

impl StimulusPair {
    pub fn new(baseline: &Path, annotated: &Path) -> Self {
        let name = baseline
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: ImageId::from_file_name(&name),
            name,
            baseline: baseline.to_path_buf(),
            annotated: annotated.to_path_buf(),
        }
    }
}
