//! Hardware interaction modules
//!
//! GPIO chip and line access, the edge source traits the engine consumes,
//! and the phase deadline timer.

mod chip;
mod line;
mod timer;

pub use chip::{auto_detect_chip, consumer_label, CdevLine, CdevProvider, ChipInfo, GpioChip};
pub use line::{EdgeLine, EdgeLineProvider, WaitOutcome};
pub use timer::{PhaseDeadline, TimerFd};

#[cfg(test)]
pub use line::MockEdgeLine;
