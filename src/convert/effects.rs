//! Report of the highest-priority SnpEff effect per variant with genotype summary.

use std::io::{BufRead, Write};

use clap::Parser;
use itertools::Itertools;

use super::{build_prioritizer, Counts, Progress};
use crate::{
    annotate::snpeff::{eff::EFF_ATTRS, EffectPrioritizer},
    common::io::std::open_write_or_stdout,
    vcf::{gt_bases, parse_info, parse_sample, GenotypeRecord, VcfReader, Zygosity},
};

/// Value written for missing data.
pub const MISSING: &str = ".";

/// Leading columns before the per-sample blocks.
pub const FIXED_COLUMNS: [&str; 27] = [
    "CHROM",
    "POS",
    "VARIANT_ID",
    "REF",
    "ALT",
    "QUAL",
    "FILTER",
    "ALT_FREQ",
    "TOTAL_DP",
    "RMS_MQ",
    "EFFECT",
    "EFFECT_IMPACT",
    "FUNCTIONAL_CLASS",
    "CODON_CHANGE",
    "AA_CHANGE",
    "GENE_NAME",
    "GENE_BIOTYPE",
    "CODING",
    "TRANSCRIPT",
    "EXON",
    "./.",
    "0/0",
    "0/1",
    "1/1",
    "REF_HOMO_SAMPLE_IDS",
    "VARIANT_HETERO_SAMPLE_IDS",
    "VARIANT_HOMO_SAMPLE_IDS",
];

/// Suffixes of the per-sample column blocks.
const SAMPLE_SUFFIXES: [&str; 5] = ["GT_allele", "GT_base", "DP", "GQ", "AD"];

/// Command line arguments for `convert effects` sub command.
#[derive(Parser, Debug, Clone)]
#[command(about = "Report highest-priority SnpEff effect per variant", long_about = None)]
pub struct Args {
    /// Path to the input VCF file (may be gzip-compressed).
    #[arg(long)]
    pub path_input_vcf: String,
    /// Path to effect priority TSV file (impact, effect), default SnpEff table if omitted.
    #[arg(long)]
    pub path_effect_priorities: Option<String>,
    /// Path to the output TSV file, stdout if omitted.
    #[arg(long)]
    pub path_output_tsv: Option<String>,
    /// For debug purposes, maximal number of variants to convert.
    #[arg(long)]
    pub max_var_count: Option<usize>,
}

fn or_missing(value: &str) -> &str {
    if value.is_empty() {
        MISSING
    } else {
        value
    }
}

fn field_or_missing(fields: &GenotypeRecord, key: &str) -> String {
    fields
        .get(key)
        .map(|v| or_missing(v).to_string())
        .unwrap_or(MISSING.to_string())
}

/// Sample names grouped by zygosity.
#[derive(Debug, Default)]
struct ZygositySummary<'a> {
    no_call: Vec<&'a str>,
    hom_ref: Vec<&'a str>,
    het: Vec<&'a str>,
    hom_alt: Vec<&'a str>,
}

impl<'a> ZygositySummary<'a> {
    fn push(&mut self, sample: &'a str, zygosity: Zygosity) {
        match zygosity {
            Zygosity::NoCall => self.no_call.push(sample),
            Zygosity::HomRef => self.hom_ref.push(sample),
            Zygosity::Het => self.het.push(sample),
            Zygosity::HomAlt => self.hom_alt.push(sample),
        }
    }

    fn columns(&self) -> Vec<String> {
        let ids = |samples: &[&str]| {
            if samples.is_empty() {
                MISSING.to_string()
            } else {
                samples.iter().join(";")
            }
        };
        vec![
            self.no_call.len().to_string(),
            self.hom_ref.len().to_string(),
            self.het.len().to_string(),
            self.hom_alt.len().to_string(),
            ids(&self.hom_ref),
            ids(&self.het),
            ids(&self.hom_alt),
        ]
    }
}

/// Write header and one row per variant of `reader`.
pub fn write_effects_report<R: BufRead, W: Write>(
    reader: &mut VcfReader<R>,
    out: &mut W,
    prioritizer: &EffectPrioritizer,
    max_var_count: Option<usize>,
) -> Result<Counts, anyhow::Error> {
    let samples = reader.sample_names()?.to_vec();

    let header = FIXED_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain(
            SAMPLE_SUFFIXES
                .iter()
                .cartesian_product(samples.iter())
                .map(|(suffix, s)| format!("{}_{}", s, suffix)),
        )
        .join("\t");
    writeln!(out, "{}", header)?;

    let mut counts = Counts::default();
    let mut progress = Progress::new();
    while let Some(record) = reader.read_variant()? {
        if max_var_count.is_some_and(|max_var_count| counts.variants >= max_var_count) {
            tracing::warn!("Stopping after {} variants", counts.variants);
            break;
        }
        counts.variants += 1;
        progress.tick(&record.chrom, &record.pos);

        let info = parse_info(&record);
        let mut row = vec![
            record.chrom.clone(),
            record.pos.clone(),
            record.id.clone(),
            record.reference.clone(),
            record.alternative.clone(),
            record.qual.clone(),
            record.filter.clone(),
        ];
        for key in ["AF", "DP", "MQ"] {
            row.push(info.get(key).map(or_missing).unwrap_or(MISSING).to_string());
        }

        match prioritizer.select_highest_priority_effect(&record)? {
            Some(effect) => {
                row.extend(effect.attrs().into_iter().map(|a| or_missing(a).to_string()))
            }
            None => {
                tracing::debug!("no effects for {}:{}", &record.chrom, &record.pos);
                counts.skipped += 1;
                row.extend(vec![MISSING.to_string(); EFF_ATTRS]);
            }
        }

        let alleles = record.alleles();
        let mut summary = ZygositySummary::default();
        let mut blocks: [Vec<String>; SAMPLE_SUFFIXES.len()] = Default::default();
        for sample in &samples {
            let fields = parse_sample(&record, sample)?;
            let gt = fields.get("GT").map(String::as_str).unwrap_or(MISSING);
            summary.push(sample, Zygosity::from_gt(gt));

            blocks[0].push(or_missing(gt).to_string());
            blocks[1].push(match fields.get("GT") {
                Some(gt) => gt_bases(gt, &alleles)?,
                None => MISSING.to_string(),
            });
            blocks[2].push(field_or_missing(&fields, "DP"));
            blocks[3].push(field_or_missing(&fields, "GQ"));
            blocks[4].push(field_or_missing(&fields, "AD"));
        }
        row.extend(summary.columns());
        row.extend(blocks.into_iter().flatten());

        writeln!(out, "{}", row.join("\t"))?;
        counts.rows += 1;
    }

    Ok(counts)
}

/// Main entry point for `convert effects` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let prioritizer = build_prioritizer(args.path_effect_priorities.as_deref())?;
    let mut reader = VcfReader::from_path(&args.path_input_vcf)?;
    reader.jump_to_variants()?;
    let mut out = open_write_or_stdout(args.path_output_tsv.as_ref())?;

    let counts = write_effects_report(&mut reader, &mut out, &prioritizer, args.max_var_count)?;
    out.flush()?;
    counts.log_summary();

    Ok(())
}
