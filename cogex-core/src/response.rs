use serde::{Deserialize, Serialize};

/// How the participant answers.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Keyboard,
    Mouse,
    Text,
}

/// Symbol set accepted by the text box.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSymbols {
    Integer,
    Letters,
    Custom,
}

impl TextSymbols {
    pub fn allowed(&self, custom: &[char]) -> Vec<char> {
        match self {
            TextSymbols::Integer => ('0'..='9').collect(),
            TextSymbols::Letters => ('a'..='z').chain('A'..='Z').collect(),
            TextSymbols::Custom => custom.to_vec(),
        }
    }
}

/// Typed answer buffer with a symbol whitelist and a length cap.
#[derive(Debug, Clone)]
pub struct TextEntry {
    allowed: Vec<char>,
    max_len: usize,
    buffer: String,
}

impl TextEntry {
    pub fn new(allowed: Vec<char>, max_len: usize) -> Self {
        Self {
            allowed,
            max_len,
            buffer: String::new(),
        }
    }

    /// Appends `c` if it is allowed and the cap is not reached.
    pub fn push(&mut self, c: char) -> bool {
        if self.buffer.chars().count() >= self.max_len || !self.allowed.contains(&c) {
            return false;
        }
        self.buffer.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
