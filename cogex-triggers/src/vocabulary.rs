use std::fmt;

/// A closed set of trigger types, usually a fieldless enum.
pub trait TriggerKind: Copy + 'static {
    const ALL: &'static [Self];
    fn name(&self) -> &'static str;
}

/// Registered trigger-type names, in registration order without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerVocabulary {
    names: Vec<String>,
}

impl TriggerVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for name in names {
            let name = name.into();
            if !vocabulary.contains(&name) {
                vocabulary.names.push(name);
            }
        }
        vocabulary
    }

    pub fn of<K: TriggerKind>() -> Self {
        Self::new(K::ALL.iter().map(|k| k.name()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for TriggerVocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}
