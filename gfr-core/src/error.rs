//! Error types re-exported from gfr-error

pub use gfr_error::{FanRpmError, Result};
