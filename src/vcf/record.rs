//! Variant records parsed from VCF data lines.

use std::rc::Rc;

use parse_display::Display;

use super::{
    error::Error,
    header::{ColumnIndex, FORMAT_OFFSET, SAMPLES_OFFSET},
};

/// Classification of a variant by REF/ALT length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "UPPERCASE")]
pub enum VariantType {
    /// Single nucleotide polymorphism.
    Snp,
    /// Di-nucleotide polymorphism.
    Dnp,
    /// Tri-nucleotide polymorphism.
    Tnp,
    /// Oligo-nucleotide polymorphism.
    Onp,
    /// Insertion.
    Ins,
    /// Deletion.
    Del,
}

impl VariantType {
    /// Classify a variant from its reference and alternative allele.
    pub fn from_alleles(reference: &str, alternative: &str) -> Self {
        let (len_ref, len_alt) = (reference.len(), alternative.len());
        if len_ref <= 1 && len_alt <= 1 {
            VariantType::Snp
        } else if len_ref > len_alt {
            VariantType::Del
        } else if len_ref < len_alt {
            VariantType::Ins
        } else {
            match len_ref {
                2 => VariantType::Dnp,
                3 => VariantType::Tnp,
                _ => VariantType::Onp,
            }
        }
    }
}

/// One data line of a VCF file.
///
/// The fixed columns are stored as named fields, the sample columns positionally in
/// header order.  Name-based access goes through the shared [`ColumnIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    columns: Rc<ColumnIndex>,
    pub chrom: String,
    pub pos: String,
    pub id: String,
    pub reference: String,
    pub alternative: String,
    pub qual: String,
    pub filter: String,
    pub info: String,
    pub format: Option<String>,
    pub samples: Vec<String>,
}

impl VariantRecord {
    /// Parse a data line against `columns`.
    ///
    /// Tokens are assigned to columns strictly by position.  Fails with
    /// [`Error::InvalidVariantLine`] if `line` is not a variant line for `columns`.
    pub fn parse(columns: &Rc<ColumnIndex>, line: &str) -> Result<Self, Error> {
        if !columns.is_variant_line(line) {
            return Err(Error::InvalidVariantLine(line.to_string()));
        }

        let mut tokens = line.split_whitespace().map(str::to_string);
        let mut next = || tokens.next().unwrap_or_default();
        let chrom = next();
        let pos = next();
        let id = next();
        let reference = next();
        let alternative = next();
        let qual = next();
        let filter = next();
        let info = next();
        let format = columns.has_format().then(&mut next);
        let samples = tokens.collect();

        Ok(Self {
            columns: columns.clone(),
            chrom,
            pos,
            id,
            reference,
            alternative,
            qual,
            filter,
            info,
            format,
            samples,
        })
    }

    /// The column index this record was parsed against.
    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    /// Raw value of the column `name`, if the header has it.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match self.columns.position(name)? {
            0 => &self.chrom,
            1 => &self.pos,
            2 => &self.id,
            3 => &self.reference,
            4 => &self.alternative,
            5 => &self.qual,
            6 => &self.filter,
            7 => &self.info,
            FORMAT_OFFSET => self.format.as_ref()?,
            i => self.samples.get(i - SAMPLES_OFFSET)?,
        };
        Some(value.as_str())
    }

    /// Raw value of the column for `sample`.
    pub fn sample(&self, sample: &str) -> Result<&str, Error> {
        self.columns
            .sample_index(sample)
            .and_then(|i| self.samples.get(i))
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownSample(sample.to_string()))
    }

    /// The `FORMAT` column value.
    pub fn format(&self) -> Result<&str, Error> {
        self.format.as_deref().ok_or(Error::MissingFormat)
    }

    /// 1-based position as an integer.
    pub fn position(&self) -> Result<u64, Error> {
        self.pos
            .parse()
            .map_err(|_| Error::InvalidPosition(self.pos.clone()))
    }

    /// The alternative alleles, split on `,`.
    pub fn alt_alleles(&self) -> Vec<&str> {
        self.alternative.split(',').collect()
    }

    /// The reference allele followed by the alternative alleles.
    ///
    /// Genotype allele indices index into this list.
    pub fn alleles(&self) -> Vec<&str> {
        std::iter::once(self.reference.as_str())
            .chain(self.alternative.split(','))
            .collect()
    }

    /// Classify the variant by REF and the first ALT allele.
    pub fn variant_type(&self) -> VariantType {
        let first_alt = self.alternative.split(',').next().unwrap_or_default();
        VariantType::from_alleles(&self.reference, first_alt)
    }
}
