//! Somatic status as reported by VarScan in the `SS` INFO field.

use parse_display::Display;

use crate::vcf::{Error, InfoFields};

/// INFO key of the somatic status.
pub const SS_KEY: &str = "SS";

/// VarScan somatic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, strum::EnumIter)]
pub enum SomaticStatus {
    Reference,
    Germline,
    Somatic,
    #[display("LOH")]
    Loh,
    Unknown,
}

impl SomaticStatus {
    /// Decode a numeric status code (`0`-`3`, `5`).
    pub fn from_code(code: &str) -> Result<Self, Error> {
        match code {
            "0" => Ok(SomaticStatus::Reference),
            "1" => Ok(SomaticStatus::Germline),
            "2" => Ok(SomaticStatus::Somatic),
            "3" => Ok(SomaticStatus::Loh),
            "5" => Ok(SomaticStatus::Unknown),
            _ => Err(Error::InvalidSomaticStatus(code.to_string())),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SomaticStatus::Reference => 0,
            SomaticStatus::Germline => 1,
            SomaticStatus::Somatic => 2,
            SomaticStatus::Loh => 3,
            SomaticStatus::Unknown => 5,
        }
    }

    /// Read the status from the `SS` entry of decomposed INFO fields.
    pub fn from_info(info: &InfoFields) -> Result<Self, Error> {
        Self::from_code(info.require(SS_KEY)?)
    }
}
