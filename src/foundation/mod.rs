/// Stopwatch and time-of-day arithmetic.
pub mod elapsed;
/// Crate error type.
pub mod error;
