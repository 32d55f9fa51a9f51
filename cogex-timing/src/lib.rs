pub mod timer;

pub use timer::{format_elapsed, HighPrecisionTimer, ManualTimer, Timer};
