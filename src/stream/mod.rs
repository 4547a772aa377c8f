//! Stream combinators

mod debounce;

pub use debounce::{Debounce, DebounceExt};
