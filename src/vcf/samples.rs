//! Decoding of the per-sample genotype columns.

use indexmap::IndexMap;

use super::{error::Error, record::VariantRecord};

/// Per-sample mapping from FORMAT key (e.g. `GT`, `DP`) to value.
pub type GenotypeRecord = IndexMap<String, String>;

/// Base emitted for a no-call allele.
pub const NO_CALL_BASE: &str = "N";

/// Zip the FORMAT keys against the `:`-separated values of one sample.
///
/// Trailing fields may be dropped (e.g. `./.` for `GT:GQ:DP`); the missing keys are
/// absent from the result.  More values than keys is an error.
pub fn zip_format(format: &str, sample: &str, value: &str) -> Result<GenotypeRecord, Error> {
    let keys = format.split(':').collect::<Vec<_>>();
    let values = value.split(':').collect::<Vec<_>>();
    if values.len() > keys.len() {
        return Err(Error::SampleFieldCount {
            sample: sample.to_string(),
            format: format.to_string(),
            values: values.len(),
        });
    }

    Ok(keys
        .into_iter()
        .zip(values)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect())
}

/// Decode the genotype fields of a single sample of `record`.
pub fn parse_sample(record: &VariantRecord, sample: &str) -> Result<GenotypeRecord, Error> {
    zip_format(record.format()?, sample, record.sample(sample)?)
}

/// Decode the genotype fields of all samples of `record`, keyed by sample name in header
/// order.
pub fn parse_samples(record: &VariantRecord) -> Result<IndexMap<String, GenotypeRecord>, Error> {
    let format = record.format()?;
    record
        .columns()
        .sample_names()?
        .iter()
        .zip(record.samples.iter())
        .map(|(name, value)| Ok((name.clone(), zip_format(format, name, value)?)))
        .collect()
}

/// Look up the value of `field` for `sample`.
pub fn sample_field(record: &VariantRecord, sample: &str, field: &str) -> Result<String, Error> {
    parse_sample(record, sample)?
        .swap_remove(field)
        .ok_or_else(|| Error::MissingFormatField {
            sample: sample.to_string(),
            field: field.to_string(),
        })
}

/// Translate the `GT` value of `sample` into bases.
///
/// The GT value is split on `|` if `phased` and on `/` otherwise.  Each allele index is
/// replaced by the corresponding entry of REF followed by the ALT alleles, `.` by `N`.
/// Unphased genotypes are sorted so that `0/1` and `1/0` yield the same string.
pub fn sample_gt(record: &VariantRecord, sample: &str, phased: bool) -> Result<String, Error> {
    let gt = sample_field(record, sample, "GT")?;
    let sep = if phased { "|" } else { "/" };
    genotype_bases(&gt, sep, &record.alleles(), !phased)
}

/// Like [`sample_gt`] but with the phasing taken from the GT separator.
///
/// Haploid calls are treated as unphased.
pub fn sample_bases(record: &VariantRecord, sample: &str) -> Result<String, Error> {
    gt_bases(&sample_field(record, sample, "GT")?, &record.alleles())
}

/// Translate an already decoded GT value into bases given `alleles` (REF then ALT).
///
/// Phasing is taken from the separator as in [`sample_bases`].
pub fn gt_bases(gt: &str, alleles: &[&str]) -> Result<String, Error> {
    let phased = gt.contains('|');
    let sep = if phased { "|" } else { "/" };
    genotype_bases(gt, sep, alleles, !phased)
}

/// Whether no allele of the GT value is called, e.g. `./.` but not `./1`.
pub fn is_uncalled(gt: &str) -> bool {
    gt.split(['/', '|']).all(|allele| allele == ".")
}

fn genotype_bases(gt: &str, sep: &str, alleles: &[&str], sort: bool) -> Result<String, Error> {
    let mut bases = gt
        .split(sep)
        .map(|allele| {
            if allele == "." {
                return Ok(NO_CALL_BASE);
            }
            let index = allele
                .parse::<usize>()
                .map_err(|_| Error::InvalidAllele(allele.to_string()))?;
            alleles
                .get(index)
                .copied()
                .ok_or(Error::AlleleIndexOutOfRange {
                    index,
                    count: alleles.len(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if sort {
        bases.sort_unstable();
    }
    Ok(bases.join(sep))
}

/// Zygosity of a genotype call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zygosity {
    /// At least one allele is not called.
    NoCall,
    /// All alleles are the reference.
    HomRef,
    /// Two or more different alleles.
    Het,
    /// All alleles are the same alternative allele.
    HomAlt,
}

impl Zygosity {
    /// Classify a GT value such as `0/1` or `1|1`.
    pub fn from_gt(gt: &str) -> Self {
        let alleles = gt.split(['/', '|']).collect::<Vec<_>>();
        if alleles.iter().any(|a| *a == "." || a.is_empty()) {
            Zygosity::NoCall
        } else if alleles.iter().all(|a| *a == "0") {
            Zygosity::HomRef
        } else if alleles.iter().all(|a| *a == alleles[0]) {
            Zygosity::HomAlt
        } else {
            Zygosity::Het
        }
    }
}
