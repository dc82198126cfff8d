//! Interpretation of annotations added to VCF files by upstream tools.

pub mod snpeff;
pub mod varscan;
