//! Error types for the generator core.

use core::fmt;

/// Rejections raised by the core itself.
///
/// None of these are fatal: callers log them and leave the state as it
/// was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeneratorError {
    /// A frequency edit would leave the range of the active display unit
    /// (1–999 Hz, or 1–999 kHz).
    FrequencyOutOfRange,
    /// The timer-period table has no entry for the requested frequency.
    NoTimerPeriod,
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeneratorError::FrequencyOutOfRange => write!(f, "Frequency out of range"),
            GeneratorError::NoTimerPeriod => write!(f, "No timer period for frequency"),
        }
    }
}

/// Errors surfaced while driving the output sink.
#[derive(Debug)]
pub enum OutputError<E> {
    /// The output sink rejected a start or stop request.
    Sink(E),
    /// The rate controller could not plan the requested frequency.
    Rate(GeneratorError),
}

// Allow ergonomic `?` propagation from raw sink errors.
impl<E> From<E> for OutputError<E> {
    fn from(error: E) -> Self {
        OutputError::Sink(error)
    }
}

impl<E: fmt::Debug> fmt::Display for OutputError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputError::Sink(e) => write!(f, "Output sink error: {:?}", e),
            OutputError::Rate(e) => write!(f, "Rate error: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for OutputError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OutputError::Sink(e) => defmt::write!(f, "Output sink error: {}", e),
            OutputError::Rate(e) => defmt::write!(f, "Rate error: {}", e),
        }
    }
}
