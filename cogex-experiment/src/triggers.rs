use cogex_triggers::TriggerKind;

/// Annotation columns attached to every trigger of a finished trial.
pub const EXTRA_FIELDS: [&str; 4] = ["block", "acc", "answer", "rt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Fixation,
    Stimulus,
    Answers,
    Response,
    Feedback,
}

impl TriggerKind for TriggerType {
    const ALL: &'static [Self] = &[
        TriggerType::Fixation,
        TriggerType::Stimulus,
        TriggerType::Answers,
        TriggerType::Response,
        TriggerType::Feedback,
    ];

    fn name(&self) -> &'static str {
        match self {
            TriggerType::Fixation => "fixation",
            TriggerType::Stimulus => "stimulus",
            TriggerType::Answers => "answers",
            TriggerType::Response => "response",
            TriggerType::Feedback => "feedback",
        }
    }
}

impl AsRef<str> for TriggerType {
    fn as_ref(&self) -> &str {
        self.name()
    }
}
