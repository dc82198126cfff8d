//! Parsing of SnpEff-annotated VCF files and conversion into reports.

pub mod annotate;
pub mod common;
pub mod convert;
pub mod vcf;
