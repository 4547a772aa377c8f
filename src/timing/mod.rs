//! Pure timing stages: normalization, elapsed calculation and formatting.
//!
//! None of these functions fail. Malformed input degrades to dropped
//! observations or an [`Elapsed::Incomplete`] result.

mod elapsed;
mod format;
mod normalize;

pub use elapsed::{Elapsed, elapsed};
pub use format::{UNAVAILABLE, format_duration, format_elapsed, format_gap};
pub use normalize::{epoch_seconds, merge, normalize};
