//! Error type shared by every module of the crate.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum EprError {
    /// A text value could not be read as a number.
    #[error("not a number: {0:?}")]
    InvalidNumber(String),
    /// A line of an input file could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    /// A unit string other than G, mT or T.
    #[error("unknown field unit {0:?}, expected one of G, mT, T")]
    UnknownUnit(String),
    /// g-value requested at zero magnetic field.
    #[error("g-value is undefined at zero magnetic field")]
    ZeroField,
    /// Resonant field requested for a g-value of zero.
    #[error("resonant field is undefined for a g-value of zero")]
    ZeroGValue,
    /// An element of a sequence that failed to convert.
    #[error("element {index}: {source}")]
    AtElement {
        index: usize,
        #[source]
        source: Box<EprError>,
    },
    /// Microwave frequency that is not a finite positive number of Hz.
    #[error("microwave frequency must be finite and positive, got {0} Hz")]
    InvalidFrequency(f64),
    /// NaN or infinite input to a conversion.
    #[error("non-finite input value {0}")]
    NonFiniteValue(f64),
    /// An input file with no data rows.
    #[error("no measurements found in {0}")]
    EmptySpectrum(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid session file: {0}")]
    Config(#[from] toml::de::Error),
    /// Bad command line usage.
    #[error("{0}")]
    Usage(String),
}

impl EprError {
    pub(crate) fn at_index(self, index: usize) -> EprError {
        EprError::AtElement {
            index,
            source: Box::new(self),
        }
    }
}
