pub mod block;
pub mod response;
pub mod stimulus;
pub mod trial;

pub use block::BlockKind;
pub use response::{AnswerMode, TextEntry, TextSymbols};
pub use stimulus::{ImageId, StimulusPair, leading_number};
pub use trial::{Accuracy, TrialResult, TrialState};
