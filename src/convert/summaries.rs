//! Summaries of somatic variants over a cohort of samples.
//!
//! The position report has one row per distinct variant, normal and tumor genotype, and
//! effect, listing the samples carrying it.  The gene report aggregates the position
//! report by gene (or by the most mutated transcript of each gene) and counts the samples
//! per mutation class.

use std::{
    collections::{BTreeSet, HashMap},
    io::{BufRead, Write},
    path::Path,
};

use clap::Parser;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use parse_display::Display;
use strum::{EnumCount, IntoEnumIterator};
use thousands::Separable;

use super::{build_prioritizer, Counts, Progress};
use crate::{
    annotate::snpeff::{EffectAnnotation, EffectPrioritizer, SnpEffEffect},
    common::io::std::{open_read_maybe_gz, open_write_maybe_gz},
    vcf::{sample_gt, VcfReader},
};

/// Header of the position report.
pub const POSITION_COLUMNS: [&str; 19] = [
    "chrom",
    "pos",
    "ref",
    "alt",
    "normal_gt",
    "tumor_gt",
    "dbSNP",
    "impact",
    "effect",
    "func_class",
    "codon_change",
    "aa_change",
    "gene_biotype",
    "coding",
    "gene",
    "transcript",
    "exon",
    "num_samples",
    "samples",
];

/// Command line arguments for `convert summaries` sub command.
#[derive(Parser, Debug, Clone)]
#[command(
    about = "Summarize somatic variants of several samples by position and by gene",
    long_about = None
)]
pub struct Args {
    /// Path to two-column TSV file with sample id and path to the sample's VCF file.
    #[arg(long)]
    pub path_vcf_list: String,
    /// Path to UCSC dbSNP table (`snpNNN.txt`) for looking up rs identifiers.
    #[arg(long)]
    pub path_dbsnp: Option<String>,
    /// Count all transcripts of each variant instead of the highest-priority effect.
    #[arg(long, short = 'a', default_value_t = false)]
    pub all_transcripts: bool,
    /// Report each gene by its transcript with the highest mutation count.
    #[arg(long, short = 'm', default_value_t = false)]
    pub most_mutated_transcript: bool,
    /// Name of the normal sample column.
    #[arg(long, default_value = "NORMAL")]
    pub normal_sample: String,
    /// Name of the tumor sample column.
    #[arg(long, default_value = "TUMOR")]
    pub tumor_sample: String,
    /// Path to effect priority TSV file (impact, effect), default SnpEff table if omitted.
    #[arg(long)]
    pub path_effect_priorities: Option<String>,
    /// Prefix of the output files `<prefix>.pos` and `<prefix>.gene`.
    #[arg(long, short = 'o', default_value = "report")]
    pub out_prefix: String,
}

/// One line of the VCF list file.
#[derive(Debug, serde::Deserialize)]
struct SampleVcf {
    sample: String,
    path: String,
}

/// Load the `(sample, VCF path)` pairs in file order.
pub fn load_vcf_list<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(open_read_maybe_gz(path)?);

    reader
        .deserialize()
        .map(|record| {
            let record: SampleVcf = record?;
            Ok((record.sample, record.path))
        })
        .collect()
}

fn strip_chr(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Load a UCSC dbSNP table into a mapping from `chrom:pos:ref:alt` to rs identifier.
///
/// Uses `chrom` (without `chr`), `chromEnd`, `name`, `refNCBI` and `observed`.  The
/// alternative allele is the first observed allele differing from the reference.
pub fn load_dbsnp<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(open_read_maybe_gz(path)?);

    let mut result = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(chrom), Some(pos), Some(rsid), Some(reference), Some(observed)) = (
            record.get(1),
            record.get(3),
            record.get(4),
            record.get(7),
            record.get(9),
        ) else {
            tracing::warn!("skipping dbSNP line with {} fields", record.len());
            continue;
        };
        let alternative = match observed.split('/').collect::<Vec<_>>().as_slice() {
            [first, second, ..] if *first == reference => second.to_string(),
            [first, _, ..] => first.to_string(),
            _ => {
                tracing::warn!("skipping {} with observed alleles {:?}", rsid, observed);
                continue;
            }
        };
        result.insert(
            [strip_chr(chrom), pos, reference, &alternative].join(":"),
            rsid.to_string(),
        );
    }
    Ok(result)
}

/// A variant together with the normal and tumor genotype bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub chrom: String,
    pub pos: String,
    pub reference: String,
    pub alternative: String,
    pub normal_gt: String,
    pub tumor_gt: String,
}

impl VariantKey {
    /// The `chrom:pos:ref:alt` key, as used for dbSNP lookup.
    pub fn variant(&self) -> String {
        [
            self.chrom.as_str(),
            &self.pos,
            &self.reference,
            &self.alternative,
        ]
        .join(":")
    }
}

#[derive(Debug, Default)]
struct PositionEntry {
    effects: IndexSet<EffectAnnotation>,
    samples: BTreeSet<String>,
}

/// Distinct variants over all samples with their effects and carrier samples.
#[derive(Debug, Default)]
pub struct PositionReport {
    entries: IndexMap<VariantKey, PositionEntry>,
}

impl PositionReport {
    /// Add the variants of one sample's VCF file.
    ///
    /// Variants without usable effect are counted as skipped.  The reader must be
    /// positioned at the first data line.
    pub fn add_sample<R: BufRead>(
        &mut self,
        sample_id: &str,
        reader: &mut VcfReader<R>,
        prioritizer: &EffectPrioritizer,
        args: &Args,
    ) -> Result<Counts, anyhow::Error> {
        let mut counts = Counts::default();
        let mut progress = Progress::new();
        while let Some(record) = reader.read_variant()? {
            counts.variants += 1;
            progress.tick(&record.chrom, &record.pos);

            let effects = if args.all_transcripts {
                prioritizer.parse_effects(&record)?
            } else {
                prioritizer
                    .select_highest_priority_effect(&record)?
                    .into_iter()
                    .collect()
            };
            if effects.is_empty() {
                tracing::debug!("no effects for {}:{}", &record.chrom, &record.pos);
                counts.skipped += 1;
                continue;
            }

            let key = VariantKey {
                chrom: strip_chr(&record.chrom).to_string(),
                pos: record.pos.clone(),
                reference: record.reference.clone(),
                alternative: record.alternative.clone(),
                normal_gt: sample_gt(&record, &args.normal_sample, false)?,
                tumor_gt: sample_gt(&record, &args.tumor_sample, false)?,
            };
            counts.rows += effects.len();
            let entry = self.entries.entry(key).or_default();
            entry.effects.extend(effects);
            entry.samples.insert(sample_id.to_string());
        }

        Ok(counts)
    }

    /// Number of distinct variant keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One item per variant key and effect, in insertion order.
    pub fn rows(
        &self,
    ) -> impl Iterator<Item = (&VariantKey, &EffectAnnotation, &BTreeSet<String>)> + '_ {
        self.entries.iter().flat_map(|(key, entry)| {
            entry
                .effects
                .iter()
                .map(move |effect| (key, effect, &entry.samples))
        })
    }

    /// Write header and rows, returns the number of rows.
    pub fn write<W: Write>(
        &self,
        out: &mut W,
        variant2rsid: &HashMap<String, String>,
    ) -> Result<usize, anyhow::Error> {
        writeln!(out, "{}", POSITION_COLUMNS.join("\t"))?;

        let mut rows = 0;
        for (key, effect, samples) in self.rows() {
            let rsid = variant2rsid
                .get(&key.variant())
                .map(String::as_str)
                .unwrap_or_default();
            let num_samples = samples.len().to_string();
            let sample_ids = samples.iter().join(",");
            let row: [&str; POSITION_COLUMNS.len()] = [
                &key.chrom,
                &key.pos,
                &key.reference,
                &key.alternative,
                &key.normal_gt,
                &key.tumor_gt,
                rsid,
                &effect.impact,
                &effect.effect,
                &effect.functional_class,
                &effect.codon_change,
                &effect.aa_change,
                &effect.gene_biotype,
                &effect.coding,
                &effect.gene,
                &effect.transcript,
                &effect.exon,
                &num_samples,
                &sample_ids,
            ];
            writeln!(out, "{}", row.join("\t"))?;
            rows += 1;
        }

        Ok(rows)
    }
}

/// Mutation classes counted in the gene report, in column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, strum::EnumIter, strum::EnumCount,
)]
#[display(style = "snake_case")]
pub enum MutationClass {
    Missense,
    StopLost,
    StartLost,
    NonsynCoding,
    NonsynStart,
    Nonsense,
    SpliceAcceptor,
    SpliceDonor,
    Silent,
    SynCoding,
    SynStop,
    /// `START_LOST` with silent functional class.
    #[display("start_lost")]
    SilentStartLost,
    Downstream,
    Exon,
    Intergenic,
    Intragenic,
    Intron,
    StartGained,
    Upstream,
    #[display("utr_3_prime")]
    Utr3Prime,
    #[display("utr_5_prime")]
    Utr5Prime,
}

fn with_detail(class: MutationClass, detail: Option<MutationClass>) -> Vec<MutationClass> {
    std::iter::once(class).chain(detail).collect()
}

impl MutationClass {
    /// The classes an effect is counted in; empty if the effect is not counted.
    ///
    /// Missense and silent effects are counted in the general class and, for some
    /// effects, additionally in a detail class.
    pub fn classify(functional_class: &str, effect: &str) -> Vec<Self> {
        let effect = effect.parse::<SnpEffEffect>().ok();
        match (functional_class, effect) {
            ("MISSENSE", effect) => with_detail(
                Self::Missense,
                match effect {
                    Some(SnpEffEffect::StopLost) => Some(Self::StopLost),
                    Some(SnpEffEffect::StartLost) => Some(Self::StartLost),
                    Some(SnpEffEffect::NonSynonymousCoding) => Some(Self::NonsynCoding),
                    Some(SnpEffEffect::NonSynonymousStart) => Some(Self::NonsynStart),
                    _ => None,
                },
            ),
            ("NONSENSE", _) => vec![Self::Nonsense],
            (_, Some(SnpEffEffect::SpliceSiteAcceptor)) => vec![Self::SpliceAcceptor],
            (_, Some(SnpEffEffect::SpliceSiteDonor)) => vec![Self::SpliceDonor],
            ("SILENT", effect) => with_detail(
                Self::Silent,
                match effect {
                    Some(SnpEffEffect::SynonymousCoding) => Some(Self::SynCoding),
                    Some(SnpEffEffect::SynonymousStop) => Some(Self::SynStop),
                    Some(SnpEffEffect::StartLost) => Some(Self::SilentStartLost),
                    _ => None,
                },
            ),
            (_, Some(effect)) => match effect {
                SnpEffEffect::Downstream => vec![Self::Downstream],
                SnpEffEffect::Exon => vec![Self::Exon],
                SnpEffEffect::Intergenic => vec![Self::Intergenic],
                SnpEffEffect::Intragenic => vec![Self::Intragenic],
                SnpEffEffect::Intron => vec![Self::Intron],
                SnpEffEffect::StartGained => vec![Self::StartGained],
                SnpEffEffect::Upstream => vec![Self::Upstream],
                SnpEffEffect::Utr3Prime => vec![Self::Utr3Prime],
                SnpEffEffect::Utr5Prime => vec![Self::Utr5Prime],
                _ => Vec::new(),
            },
            (_, None) => Vec::new(),
        }
    }
}

/// Sample-weighted mutation counts of a gene or transcript.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MutationCounts {
    counts: [usize; MutationClass::COUNT],
    /// Sum over all counted rows of the number of samples.
    pub total: usize,
    /// Distinct samples.
    pub samples: BTreeSet<String>,
    /// Distinct `sample:chrom:pos` values.
    pub sample_positions: BTreeSet<String>,
}

impl MutationCounts {
    pub fn get(&self, class: MutationClass) -> usize {
        self.counts[class as usize]
    }

    fn add(&mut self, classes: &[MutationClass], key: &VariantKey, samples: &BTreeSet<String>) {
        for class in classes {
            self.counts[*class as usize] += samples.len();
        }
        self.total += samples.len();
        for sample in samples {
            self.samples.insert(sample.clone());
            self.sample_positions
                .insert(format!("{}:{}:{}", sample, key.chrom, key.pos));
        }
    }

    fn merge(&mut self, other: &Self) {
        for (count, other) in self.counts.iter_mut().zip(other.counts) {
            *count += other;
        }
        self.total += other.total;
        self.samples.extend(other.samples.iter().cloned());
        self.sample_positions
            .extend(other.sample_positions.iter().cloned());
    }

    fn columns(&self) -> impl Iterator<Item = String> + '_ {
        MutationClass::iter()
            .map(|class| self.get(class).to_string())
            .chain([
                self.total.to_string(),
                self.samples.len().to_string(),
                self.sample_positions.iter().join(","),
            ])
    }
}

/// Mutation counts per gene and transcript.
#[derive(Debug, Default)]
pub struct GeneReport {
    genes: IndexMap<String, IndexMap<String, MutationCounts>>,
}

impl GeneReport {
    /// Aggregate the rows of a position report.
    ///
    /// A missing gene name is replaced by the transcript and vice versa; rows with neither
    /// or with an uncounted effect are ignored.
    pub fn from_positions(report: &PositionReport) -> Self {
        let mut genes: IndexMap<String, IndexMap<String, MutationCounts>> = IndexMap::new();
        for (key, effect, samples) in report.rows() {
            let (gene, transcript) = match (effect.gene.as_str(), effect.transcript.as_str()) {
                ("", "") => continue,
                (gene, "") => (gene, gene),
                ("", transcript) => (transcript, transcript),
                (gene, transcript) => (gene, transcript),
            };
            let classes = MutationClass::classify(&effect.functional_class, &effect.effect);
            if classes.is_empty() {
                continue;
            }
            genes
                .entry(gene.to_string())
                .or_default()
                .entry(transcript.to_string())
                .or_default()
                .add(&classes, key, samples);
        }
        Self { genes }
    }

    /// Gene names in order of first occurrence.
    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(String::as_str)
    }

    /// Counts of `gene` over all its transcripts.
    pub fn gene_counts(&self, gene: &str) -> Option<MutationCounts> {
        self.genes.get(gene).map(|transcripts| {
            transcripts
                .values()
                .fold(MutationCounts::default(), |mut acc, counts| {
                    acc.merge(counts);
                    acc
                })
        })
    }

    /// The transcript of `gene` with the highest total; the first one wins ties.
    pub fn most_mutated_transcript(&self, gene: &str) -> Option<(&str, &MutationCounts)> {
        self.genes
            .get(gene)?
            .iter()
            .rev()
            .max_by_key(|(_, counts)| counts.total)
            .map(|(transcript, counts)| (transcript.as_str(), counts))
    }

    /// Write header and one row per gene, returns the number of rows.
    pub fn write<W: Write>(
        &self,
        out: &mut W,
        most_mutated_transcript: bool,
    ) -> Result<usize, anyhow::Error> {
        let mut header = vec!["gene".to_string()];
        if most_mutated_transcript {
            header.push("transcript".to_string());
        }
        header.extend(MutationClass::iter().map(|class| class.to_string()));
        header.extend(["total", "num_samples", "sample:chr:pos"].map(String::from));
        writeln!(out, "{}", header.join("\t"))?;

        let mut rows = 0;
        for gene in self.genes() {
            let mut row = vec![gene.to_string()];
            if most_mutated_transcript {
                let Some((transcript, counts)) = self.most_mutated_transcript(gene) else {
                    continue;
                };
                row.push(transcript.to_string());
                row.extend(counts.columns());
            } else {
                let Some(counts) = self.gene_counts(gene) else {
                    continue;
                };
                row.extend(counts.columns());
            }
            writeln!(out, "{}", row.join("\t"))?;
            rows += 1;
        }

        Ok(rows)
    }
}

/// Main entry point for `convert summaries` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let prioritizer = build_prioritizer(args.path_effect_priorities.as_deref())?;
    let variant2rsid = match &args.path_dbsnp {
        Some(path) => {
            tracing::info!("Loading dbSNP from {}", path);
            let variant2rsid = load_dbsnp(path)?;
            tracing::info!(
                "... loaded {} variants",
                variant2rsid.len().separate_with_commas()
            );
            variant2rsid
        }
        None => HashMap::new(),
    };

    let mut positions = PositionReport::default();
    for (sample, path) in load_vcf_list(&args.path_vcf_list)? {
        tracing::info!("Processing sample {}, VCF file {}", sample, path);
        let mut reader = VcfReader::from_path(&path)?;
        reader.jump_to_variants()?;
        let counts = positions.add_sample(&sample, &mut reader, &prioritizer, args)?;
        tracing::info!(
            "... read {} variants, {} without effects",
            counts.variants.separate_with_commas(),
            counts.skipped.separate_with_commas()
        );
    }

    let path_pos = format!("{}.pos", args.out_prefix);
    tracing::info!("Writing position report to {}", path_pos);
    let mut out = open_write_maybe_gz(&path_pos)?;
    let rows = positions.write(&mut out, &variant2rsid)?;
    out.flush()?;
    tracing::info!("... wrote {} rows", rows.separate_with_commas());

    let path_gene = format!("{}.gene", args.out_prefix);
    tracing::info!("Writing gene report to {}", path_gene);
    let mut out = open_write_maybe_gz(&path_gene)?;
    let rows = GeneReport::from_positions(&positions).write(&mut out, args.most_mutated_transcript)?;
    out.flush()?;
    tracing::info!("... wrote {} rows", rows.separate_with_commas());

    Ok(())
}
