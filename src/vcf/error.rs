//! Error type for VCF parsing and effect ranking.

use thiserror::Error;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, parse_display::Display)]
pub enum ErrorKind {
    /// Underlying I/O failed.
    Io,
    /// The input does not conform to the expected line or field layout.
    InvalidFormat,
    /// A name (effect, sample, column, field) could not be resolved.
    LookupFailure,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // InvalidFormat
    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),
    #[error("not a variant line: {0:?}")]
    InvalidVariantLine(String),
    #[error("column names not set, call jump_to_variants() first")]
    ColumnsNotSet,
    #[error("invalid position {0:?}")]
    InvalidPosition(String),
    #[error("invalid EFF annotation {0:?}")]
    InvalidEffect(String),
    #[error("invalid allele index {0:?}")]
    InvalidAllele(String),
    #[error("invalid somatic status code {0:?}")]
    InvalidSomaticStatus(String),
    #[error("sample {sample} has {values} values but FORMAT {format:?} declares fewer fields")]
    SampleFieldCount {
        sample: String,
        format: String,
        values: usize,
    },

    // LookupFailure
    #[error("effect {0:?} is not in the priority table")]
    UnknownEffect(String),
    #[error("sample {0:?} is not in the header")]
    UnknownSample(String),
    #[error("header has no FORMAT column")]
    MissingFormat,
    #[error("no {field} field for sample {sample}")]
    MissingFormatField { sample: String, field: String },
    #[error("allele index {index} out of range, only {count} alleles present")]
    AlleleIndexOutOfRange { index: usize, count: usize },
    #[error("INFO field {0} is missing")]
    MissingInfoField(String),
}

impl Error {
    /// Return the coarse kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidHeader(_)
            | Error::InvalidVariantLine(_)
            | Error::ColumnsNotSet
            | Error::InvalidPosition(_)
            | Error::InvalidEffect(_)
            | Error::InvalidAllele(_)
            | Error::InvalidSomaticStatus(_)
            | Error::SampleFieldCount { .. } => ErrorKind::InvalidFormat,
            Error::UnknownEffect(_)
            | Error::UnknownSample(_)
            | Error::MissingFormat
            | Error::MissingFormatField { .. }
            | Error::AlleleIndexOutOfRange { .. }
            | Error::MissingInfoField(_) => ErrorKind::LookupFailure,
        }
    }
}
