//! Column index built from the `#CHROM ...` header line.

use std::collections::HashMap;

use super::{
    error::Error,
    line::{is_header, is_meta},
};

/// The eight mandatory leading columns.
pub const FIXED_COLUMNS: [&str; 8] = ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Name of the optional column describing the per-sample field layout.
pub const FORMAT_COLUMN: &str = "FORMAT";

/// Offset of the `FORMAT` column (if any).
pub const FORMAT_OFFSET: usize = FIXED_COLUMNS.len();

/// Offset of the first sample column (if any).
pub const SAMPLES_OFFSET: usize = FORMAT_OFFSET + 1;

/// Ordered column names of a VCF file with a precomputed name to position table.
///
/// Built once per file and shared (read-only) by all records of that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Parse the header line, e.g. `#CHROM\tPOS\tID\t...\tFORMAT\tNA00001`.
    ///
    /// Fails with [`Error::InvalidHeader`] if the line is not a header line, if the fixed
    /// columns are not in place, if the ninth column is not `FORMAT`, or if a column name
    /// occurs twice.
    pub fn from_header_line(line: &str) -> Result<Self, Error> {
        if !is_header(line) {
            return Err(Error::InvalidHeader(line.to_string()));
        }

        let names = line[1..]
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if names.len() < FIXED_COLUMNS.len()
            || names.iter().zip(FIXED_COLUMNS.iter()).any(|(a, b)| a != b)
        {
            return Err(Error::InvalidHeader(line.to_string()));
        }
        if names.len() > FORMAT_OFFSET && names[FORMAT_OFFSET] != FORMAT_COLUMN {
            return Err(Error::InvalidHeader(line.to_string()));
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(Error::InvalidHeader(line.to_string()));
            }
        }

        Ok(Self { names, positions })
    }

    /// All column names in header order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false` for a successfully parsed index.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Zero-based position of the column `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Whether the header has a `FORMAT` column.
    pub fn has_format(&self) -> bool {
        self.names.len() > FORMAT_OFFSET
    }

    /// The sample names after the `FORMAT` column, in header order.
    ///
    /// Fails with [`Error::MissingFormat`] for sites-only files.
    pub fn sample_names(&self) -> Result<&[String], Error> {
        if self.has_format() {
            Ok(&self.names[SAMPLES_OFFSET..])
        } else {
            Err(Error::MissingFormat)
        }
    }

    /// Zero-based index of `sample` among the sample columns.
    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.position(sample)
            .and_then(|pos| pos.checked_sub(SAMPLES_OFFSET))
    }

    /// Whether `line` is a data line matching this header's column count.
    pub fn is_variant_line(&self, line: &str) -> bool {
        !is_meta(line) && !is_header(line) && line.split_whitespace().count() == self.len()
    }
}
