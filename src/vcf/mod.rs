//! Line-oriented parsing of VCF files.
//!
//! The reader first skips the `##` meta lines and builds a [`ColumnIndex`] from the
//! `#CHROM` header line.  Data lines are then parsed into [`VariantRecord`] values from
//! which the INFO entries and the per-sample genotype fields can be decoded on demand.

pub mod error;
pub mod header;
pub mod info;
pub mod line;
pub mod reader;
pub mod record;
pub mod samples;

pub use error::{Error, ErrorKind};
pub use header::ColumnIndex;
pub use info::{parse_info, InfoFields};
pub use line::{is_header, is_meta};
pub use reader::VcfReader;
pub use record::{VariantRecord, VariantType};
pub use samples::{
    gt_bases, is_uncalled, parse_sample, parse_samples, sample_bases, sample_field, sample_gt,
    GenotypeRecord, Zygosity,
};
