//! Conversion of VCF files into a flat genotype table.

use std::io::{BufRead, Write};

use clap::Parser;

use super::{Counts, Progress, NA};
use crate::{
    common::io::std::open_write_or_stdout,
    vcf::{gt_bases, is_uncalled, parse_info, parse_sample, VcfReader},
};

/// Command line arguments for `convert tsv` sub command.
#[derive(Parser, Debug, Clone)]
#[command(about = "Convert VCF to genotype TSV", long_about = None)]
pub struct Args {
    /// Path to the input VCF file (may be gzip-compressed).
    #[arg(long)]
    pub path_input_vcf: String,
    /// Path to the output TSV file, stdout if omitted.
    #[arg(long)]
    pub path_output_tsv: Option<String>,
    /// For debug purposes, maximal number of variants to convert.
    #[arg(long)]
    pub max_var_count: Option<usize>,
}

/// Write the TSV header and one row per variant of `reader`.
pub fn write_tsv<R: BufRead, W: Write>(
    reader: &mut VcfReader<R>,
    out: &mut W,
    max_var_count: Option<usize>,
) -> Result<Counts, anyhow::Error> {
    let samples = reader.sample_names()?.to_vec();

    let mut header = ["Chrom", "Position", "Ref", "Alt", "Type", "AF", "NoCall"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    header.extend(samples.iter().map(|s| format!("{}_gt", s)));
    header.extend(samples.iter().map(|s| format!("{}_dp", s)));
    writeln!(out, "{}", header.join("\t"))?;

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
        let alleles = record.alleles();
        let mut gts = Vec::with_capacity(samples.len());
        let mut dps = Vec::with_capacity(samples.len());
        let mut no_calls = 0;
        for sample in &samples {
            let fields = parse_sample(&record, sample)?;
            match fields.get("GT") {
                Some(gt) => {
                    if is_uncalled(gt) {
                        no_calls += 1;
                    }
                    gts.push(gt_bases(gt, &alleles)?);
                }
                None => gts.push(NA.to_string()),
            }
            dps.push(fields.get("DP").cloned().unwrap_or(NA.to_string()));
        }

        let mut row = vec![
            record.chrom.clone(),
            record.pos.clone(),
            record.reference.clone(),
            record.alternative.clone(),
            record.variant_type().to_string().to_lowercase(),
            info.get("AF").unwrap_or(NA).to_string(),
            no_calls.to_string(),
        ];
        row.extend(gts);
        row.extend(dps);
        writeln!(out, "{}", row.join("\t"))?;
        counts.rows += 1;
    }

    Ok(counts)
}

/// Main entry point for `convert tsv` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let mut reader = VcfReader::from_path(&args.path_input_vcf)?;
    reader.jump_to_variants()?;
    let mut out = open_write_or_stdout(args.path_output_tsv.as_ref())?;

    let counts = write_tsv(&mut reader, &mut out, args.max_var_count)?;
    out.flush()?;
    counts.log_summary();

    Ok(())
}
