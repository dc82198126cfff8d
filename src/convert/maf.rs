//! Conversion of SnpEff-annotated somatic VCF files into TCGA MAF.
//!
//! By default, one row is written per annotated effect and transcript of each variant.
//! With `--highest-priority-effect`, only the most severe effect of each variant is used.
//! Effects without gene or transcript name never yield a row.

use std::{
    collections::HashMap,
    io::{BufRead, Write},
    path::Path,
};

use clap::Parser;
use parse_display::Display;

use super::{build_prioritizer, Counts, Progress};
use crate::{
    annotate::{
        snpeff::{EffectAnnotation, EffectPrioritizer, SnpEffEffect},
        varscan::SomaticStatus,
    },
    common::{
        io::std::{open_read_maybe_gz, open_write_or_stdout},
        GenomeRelease,
    },
    vcf::{parse_info, sample_gt, Error, VariantRecord, VcfReader},
};

/// The MAF header columns.
pub const MAF_COLUMNS: [&str; 34] = [
    "Hugo_Symbol",
    "Entrez_Gene_Id",
    "Center",
    "NCBI_Build",
    "Chromosome",
    "Start_position",
    "End_position",
    "Strand",
    "Variant_Classification",
    "Variant_Type",
    "Reference_Allele",
    "Tumor_Seq_Allele1",
    "Tumor_Seq_Allele2",
    "dbSNP_RS",
    "dbSNP_Val_Status",
    "Tumor_Sample_Barcode",
    "Matched_Norm_Sample_Barcode",
    "Match_Norm_Seq_Allele1",
    "Match_Norm_Seq_Allele2",
    "Tumor_Validation_Allele1",
    "Tumor_Validation_Allele2",
    "Match_Norm_Validation_Allele1",
    "Match_Norm_Validation_Allele2",
    "Verification_Status",
    "Validation_Status",
    "Mutation_Status",
    "Sequencing_Phase",
    "Sequence_Source",
    "Validation_Method",
    "Score",
    "BAM_File",
    "Sequencer",
    "transcript_name",
    "amino_acid_change",
];

const CENTER: &str = "sequencing.center";
const STRAND: &str = "+";
const SEQUENCE_SOURCE: &str = "WES";
const SEQUENCER: &str = "Illumina HiSeq";
const NOVEL: &str = "novel";
const UNAVAILABLE: &str = "";

/// The tool that produced the somatic calls.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SomaticCaller {
    /// VarScan 2, somatic status read from the `SS` INFO field.
    #[default]
    Varscan,
    /// GATK SomaticIndelDetector, all calls are somatic.
    #[value(name = "gatk_somatic_indel_detector")]
    GatkSomaticIndelDetector,
}

/// TCGA MAF variant classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum VariantClassification {
    #[display("Frame_Shift_Del")]
    FrameShiftDel,
    #[display("Frame_Shift_Ins")]
    FrameShiftIns,
    #[display("In_Frame_Del")]
    InFrameDel,
    #[display("In_Frame_Ins")]
    InFrameIns,
    #[display("Missense_Mutation")]
    MissenseMutation,
    #[display("Nonsense_Mutation")]
    NonsenseMutation,
    Silent,
    #[display("Splice_Site")]
    SpliceSite,
    #[display("Nonstop_Mutation")]
    NonstopMutation,
    #[display("3'UTR")]
    ThreePrimeUtr,
    #[display("3'Flank")]
    ThreePrimeFlank,
    #[display("5'UTR")]
    FivePrimeUtr,
    #[display("5'Flank")]
    FivePrimeFlank,
    #[display("IGR")]
    Igr,
    Intron,
    #[display("RNA")]
    Rna,
    #[display("Targeted_Region")]
    TargetedRegion,
    #[display("De_novo_Start_InFrame")]
    DeNovoStartInFrame,
    /// No classification, written as empty string.
    #[display("")]
    Unclassified,
}

impl VariantClassification {
    /// Classify a SnpEff effect.
    ///
    /// Frame shifts are split into insertions and deletions by comparing allele lengths.
    pub fn from_effect(effect: SnpEffEffect, reference: &str, alternative: &str) -> Self {
        use VariantClassification::*;

        match effect {
            SnpEffEffect::SpliceSiteAcceptor | SnpEffEffect::SpliceSiteDonor => SpliceSite,
            SnpEffEffect::StartLost => MissenseMutation,
            SnpEffEffect::ExonDeleted => FrameShiftDel,
            SnpEffEffect::FrameShift => {
                if reference.len() < alternative.len() {
                    FrameShiftIns
                } else {
                    FrameShiftDel
                }
            }
            SnpEffEffect::StopGained => NonsenseMutation,
            SnpEffEffect::StopLost => NonstopMutation,
            SnpEffEffect::NonSynonymousCoding | SnpEffEffect::CodonChange => MissenseMutation,
            SnpEffEffect::CodonInsertion | SnpEffEffect::CodonChangePlusCodonInsertion => {
                InFrameIns
            }
            SnpEffEffect::CodonDeletion | SnpEffEffect::CodonChangePlusCodonDeletion => InFrameDel,
            SnpEffEffect::Utr5Deleted => FivePrimeUtr,
            SnpEffEffect::Utr3Deleted => ThreePrimeUtr,
            SnpEffEffect::SynonymousStart => Silent,
            SnpEffEffect::NonSynonymousStart => MissenseMutation,
            SnpEffEffect::StartGained => DeNovoStartInFrame,
            SnpEffEffect::SynonymousCoding | SnpEffEffect::SynonymousStop => Silent,
            SnpEffEffect::NonSynonymousStop => NonsenseMutation,
            SnpEffEffect::Utr5Prime => FivePrimeUtr,
            SnpEffEffect::Utr3Prime => ThreePrimeUtr,
            SnpEffEffect::Regulation | SnpEffEffect::Upstream => FivePrimeFlank,
            SnpEffEffect::Downstream => ThreePrimeFlank,
            SnpEffEffect::Gene | SnpEffEffect::Exon | SnpEffEffect::Intragenic => TargetedRegion,
            SnpEffEffect::Transcript => Rna,
            SnpEffEffect::IntronConserved | SnpEffEffect::Intron => Intron,
            SnpEffEffect::Intergenic | SnpEffEffect::IntergenicConserved => Igr,
            SnpEffEffect::NoEffect | SnpEffEffect::Chromosome | SnpEffEffect::Custom => {
                Unclassified
            }
            SnpEffEffect::Cds => TargetedRegion,
        }
    }

    /// Classify an effect given by name, failing for names that are no SnpEff effect.
    pub fn from_effect_name(name: &str, reference: &str, alternative: &str) -> Result<Self, Error> {
        let effect = name
            .parse::<SnpEffEffect>()
            .map_err(|_| Error::UnknownEffect(name.to_string()))?;
        Ok(Self::from_effect(effect, reference, alternative))
    }
}

/// Command line arguments for `convert maf` sub command.
#[derive(Parser, Debug, Clone)]
#[command(about = "Convert SnpEff-annotated somatic VCF to TCGA MAF", long_about = None)]
pub struct Args {
    /// Path to the input VCF file (may be gzip-compressed).
    #[arg(long)]
    pub path_input_vcf: String,
    /// Sample identifier for the barcode columns.
    #[arg(long)]
    pub sample_id: String,
    /// Path to two-column TSV file with gene symbol to Entrez ID mapping.
    #[arg(long)]
    pub path_gene2entrez: Option<String>,
    /// Write only the highest-priority effect of each variant.
    #[arg(long, short = 'e', default_value_t = false)]
    pub highest_priority_effect: bool,
    /// Name of the normal sample column.
    #[arg(long, default_value = "NORMAL")]
    pub normal_sample: String,
    /// Name of the tumor sample column.
    #[arg(long, default_value = "TUMOR")]
    pub tumor_sample: String,
    /// The tool used for calling the somatic variants.
    #[arg(long, short = 't', value_enum, default_value_t = SomaticCaller::Varscan)]
    pub somatic_caller: SomaticCaller,
    /// The genome release for the `NCBI_Build` column.
    #[arg(long, value_enum, default_value_t = GenomeRelease::Grch37)]
    pub genome_release: GenomeRelease,
    /// Path to effect priority TSV file (impact, effect), default SnpEff table if omitted.
    #[arg(long)]
    pub path_effect_priorities: Option<String>,
    /// Path to the output MAF file, stdout if omitted.
    #[arg(long)]
    pub path_output_maf: Option<String>,
    /// For debug purposes, maximal number of variants to convert.
    #[arg(long)]
    pub max_var_count: Option<usize>,
}

/// Structure for deserializing a gene to Entrez ID line.
#[derive(Debug, serde::Deserialize)]
struct Gene2EntrezRecord {
    gene: String,
    #[serde(default)]
    entrez_id: String,
}

/// Load the gene symbol to Entrez ID mapping; lines with empty values are ignored.
pub fn load_gene2entrez<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(open_read_maybe_gz(path)?);

    let mut result = HashMap::new();
    for record in reader.deserialize() {
        let record: Gene2EntrezRecord = record?;
        if !record.gene.is_empty() && !record.entrez_id.is_empty() {
            result.insert(record.gene, record.entrez_id);
        }
    }
    Ok(result)
}

/// The two alleles of an unphased genotype in bases.
fn genotype_alleles(record: &VariantRecord, sample: &str) -> Result<(String, String), Error> {
    let bases = sample_gt(record, sample, false)?;
    let mut alleles = bases.split('/');
    let first = alleles.next().unwrap_or_default().to_string();
    let second = alleles.next().map(str::to_string).unwrap_or(first.clone());
    Ok((first, second))
}

/// Write the MAF rows for one effect, `false` if the effect was skipped.
fn write_effect<W: Write>(
    out: &mut W,
    args: &Args,
    record: &VariantRecord,
    effect: &EffectAnnotation,
    gene2entrez: &HashMap<String, String>,
    variant_cols: &VariantColumns,
) -> Result<bool, anyhow::Error> {
    if effect.gene.is_empty() || effect.transcript.is_empty() {
        return Ok(false);
    }

    let hugo_symbol = format!("{}_{}", effect.gene, effect.transcript);
    let entrez_id = gene2entrez
        .get(&effect.gene)
        .map(String::as_str)
        .unwrap_or_default();
    let classification = VariantClassification::from_effect_name(
        &effect.effect,
        &record.reference,
        &record.alternative,
    )?
    .to_string();
    let aa_change = if effect.aa_change.is_empty() {
        String::new()
    } else {
        format!("p.{}", effect.aa_change)
    };

    let row: [&str; MAF_COLUMNS.len()] = [
        &hugo_symbol,
        entrez_id,
        CENTER,
        args.genome_release.ncbi_build(),
        &record.chrom,
        &record.pos,
        &variant_cols.end,
        STRAND,
        &classification,
        &variant_cols.variant_type,
        &record.reference,
        &variant_cols.tumor.0,
        &variant_cols.tumor.1,
        &variant_cols.dbsnp_rs,
        UNAVAILABLE,
        &args.sample_id,
        &args.sample_id,
        &variant_cols.normal.0,
        &variant_cols.normal.1,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        &variant_cols.mutation_status,
        UNAVAILABLE,
        SEQUENCE_SOURCE,
        UNAVAILABLE,
        UNAVAILABLE,
        UNAVAILABLE,
        SEQUENCER,
        &effect.transcript,
        &aa_change,
    ];
    writeln!(out, "{}", row.join("\t"))?;

    Ok(true)
}

/// The MAF columns shared by all effects of a variant.
struct VariantColumns {
    end: String,
    variant_type: String,
    dbsnp_rs: String,
    tumor: (String, String),
    normal: (String, String),
    mutation_status: String,
}

impl VariantColumns {
    fn new(args: &Args, record: &VariantRecord) -> Result<Self, Error> {
        let end = (record.position()? + record.reference.len() as u64)
            .saturating_sub(1)
            .to_string();
        let dbsnp_rs = if record.id.starts_with("rs") {
            record.id.clone()
        } else {
            NOVEL.to_string()
        };
        let mutation_status = match args.somatic_caller {
            SomaticCaller::Varscan => SomaticStatus::from_info(&parse_info(record))?.to_string(),
            SomaticCaller::GatkSomaticIndelDetector => SomaticStatus::Somatic.to_string(),
        };

        Ok(Self {
            end,
            variant_type: record.variant_type().to_string(),
            dbsnp_rs,
            tumor: genotype_alleles(record, &args.tumor_sample)?,
            normal: genotype_alleles(record, &args.normal_sample)?,
            mutation_status,
        })
    }
}

/// Write MAF header and rows for all variants of `reader`.
///
/// The reader must be positioned at the first data line.
pub fn write_maf<R: BufRead, W: Write>(
    reader: &mut VcfReader<R>,
    out: &mut W,
    args: &Args,
    gene2entrez: &HashMap<String, String>,
    prioritizer: &EffectPrioritizer,
) -> Result<Counts, anyhow::Error> {
    writeln!(out, "{}", MAF_COLUMNS.join("\t"))?;

    let mut counts = Counts::default();
    let mut progress = Progress::new();
    while let Some(record) = reader.read_variant()? {
        if args
            .max_var_count
            .is_some_and(|max_var_count| counts.variants >= max_var_count)
        {
            tracing::warn!("Stopping after {} variants", counts.variants);
            break;
        }
        counts.variants += 1;
        progress.tick(&record.chrom, &record.pos);

        let effects = if args.highest_priority_effect {
            prioritizer
                .select_highest_priority_effect(&record)?
                .into_iter()
                .collect::<Vec<_>>()
        } else {
            prioritizer.parse_effects(&record)?
        };
        if effects.is_empty() {
            tracing::debug!("no effects for {}:{}", &record.chrom, &record.pos);
            counts.skipped += 1;
            continue;
        }

        let variant_cols = VariantColumns::new(args, &record)?;
        let mut rows = 0;
        for effect in &effects {
            if write_effect(out, args, &record, effect, gene2entrez, &variant_cols)? {
                rows += 1;
            }
        }
        if rows == 0 {
            counts.skipped += 1;
        }
        counts.rows += rows;
    }

    Ok(counts)
}

/// Main entry point for `convert maf` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("args = {:#?}", &args);

    let gene2entrez = match &args.path_gene2entrez {
        Some(path) => {
            tracing::info!("Loading gene to Entrez ID mapping from {}", path);
            load_gene2entrez(path)?
        }
        None => HashMap::new(),
    };
    let prioritizer = build_prioritizer(args.path_effect_priorities.as_deref())?;

    tracing::info!("Opening input VCF {}", &args.path_input_vcf);
    let mut reader = VcfReader::from_path(&args.path_input_vcf)?;
    reader.jump_to_variants()?;
    let mut out = open_write_or_stdout(args.path_output_maf.as_ref())?;

    tracing::info!("Converting variants ...");
    let counts = write_maf(&mut reader, &mut out, args, &gene2entrez, &prioritizer)?;
    out.flush()?;
    counts.log_summary();

    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::vcf::ErrorKind;

    const PATH_SNPEFF: &str = "tests/data/vcf/example.varscan.snpeff.vcf";
    const PATH_GENE2ENTREZ: &str = "tests/data/vcf/gene2entrez.tsv";

    fn args(highest_priority_effect: bool) -> Args {
        Args {
            path_input_vcf: PATH_SNPEFF.to_string(),
            sample_id: "S1".to_string(),
            path_gene2entrez: Some(PATH_GENE2ENTREZ.to_string()),
            highest_priority_effect,
            normal_sample: "NORMAL".to_string(),
            tumor_sample: "TUMOR".to_string(),
            somatic_caller: SomaticCaller::Varscan,
            genome_release: GenomeRelease::Grch37,
            path_effect_priorities: None,
            path_output_maf: None,
            max_var_count: None,
        }
    }

    fn convert(args: &Args) -> Result<(Counts, Vec<Vec<String>>), anyhow::Error> {
        let mut reader = VcfReader::from_path(&args.path_input_vcf)?;
        reader.jump_to_variants()?;
        let gene2entrez = super::load_gene2entrez(PATH_GENE2ENTREZ)?;
        let prioritizer = build_prioritizer(args.path_effect_priorities.as_deref())?;

        let mut buf = Vec::new();
        let counts = write_maf(&mut reader, &mut buf, args, &gene2entrez, &prioritizer)?;

        let rows = String::from_utf8(buf)?
            .lines()
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect();
        Ok((counts, rows))
    }

    #[test]
    fn load_gene2entrez() -> Result<(), anyhow::Error> {
        let gene2entrez = super::load_gene2entrez(PATH_GENE2ENTREZ)?;

        assert_eq!(gene2entrez.len(), 3);
        assert_eq!(gene2entrez["TP53"], "7157");
        assert_eq!(gene2entrez.get("EMPTY"), None);

        Ok(())
    }

    #[rstest::rstest]
    #[case(SnpEffEffect::SpliceSiteDonor, "A", "G", "Splice_Site")]
    #[case(SnpEffEffect::FrameShift, "C", "CA", "Frame_Shift_Ins")]
    #[case(SnpEffEffect::FrameShift, "CA", "C", "Frame_Shift_Del")]
    #[case(SnpEffEffect::StopGained, "C", "T", "Nonsense_Mutation")]
    #[case(SnpEffEffect::Utr5Prime, "C", "T", "5'UTR")]
    #[case(SnpEffEffect::Downstream, "C", "T", "3'Flank")]
    #[case(SnpEffEffect::StartGained, "C", "T", "De_novo_Start_InFrame")]
    #[case(SnpEffEffect::Custom, "C", "T", "")]
    fn variant_classification(
        #[case] effect: SnpEffEffect,
        #[case] reference: &str,
        #[case] alternative: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            VariantClassification::from_effect(effect, reference, alternative).to_string(),
            expected
        );
    }

    #[test]
    fn variant_classification_unknown_name() {
        assert_eq!(
            VariantClassification::from_effect_name("foo", "A", "C")
                .unwrap_err()
                .kind(),
            ErrorKind::LookupFailure
        );
    }

    #[test]
    fn highest_priority_effect() -> Result<(), anyhow::Error> {
        let (counts, rows) = convert(&args(true))?;

        assert_eq!(
            counts,
            Counts {
                variants: 4,
                skipped: 1,
                rows: 3
            }
        );
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], MAF_COLUMNS);
        assert!(rows.iter().all(|row| row.len() == MAF_COLUMNS.len()));

        assert_eq!(
            rows[1],
            vec![
                "WASH7P_ENST00000537342",
                "653635",
                "sequencing.center",
                "37",
                "1",
                "14907",
                "14907",
                "+",
                "Splice_Site",
                "SNP",
                "A",
                "A",
                "G",
                "rs79585140",
                "",
                "S1",
                "S1",
                "A",
                "A",
                "",
                "",
                "",
                "",
                "",
                "",
                "Somatic",
                "",
                "WES",
                "",
                "",
                "",
                "Illumina HiSeq",
                "ENST00000537342",
                "",
            ]
        );

        let frame_shift = &rows[2];
        assert_eq!(frame_shift[0], "OR4F5_ENST00000335137");
        assert_eq!(frame_shift[1], "79501");
        assert_eq!(frame_shift[6], "69511");
        assert_eq!(frame_shift[8], "Frame_Shift_Ins");
        assert_eq!(frame_shift[9], "INS");
        assert_eq!(&frame_shift[11..13], ["C", "CA"]);
        assert_eq!(frame_shift[13], "novel");

        let stop_gained = &rows[3];
        assert_eq!(stop_gained[0], "TP53_ENST00000269305");
        assert_eq!(stop_gained[8], "Nonsense_Mutation");
        assert_eq!(&stop_gained[11..13], ["T", "T"]);
        assert_eq!(&stop_gained[17..19], ["C", "T"]);
        assert_eq!(stop_gained[25], "LOH");
        assert_eq!(stop_gained[33], "p.R273*");

        Ok(())
    }

    #[test]
    fn all_effects() -> Result<(), anyhow::Error> {
        let (counts, rows) = convert(&args(false))?;

        assert_eq!(
            counts,
            Counts {
                variants: 4,
                skipped: 1,
                rows: 8
            }
        );
        assert_eq!(
            rows[1..]
                .iter()
                .map(|row| (row[0].as_str(), row[8].as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("WASH7P_ENST00000537342", "Splice_Site"),
                ("WASH7P_ENST00000541675", "Missense_Mutation"),
                ("WASH7P_ENST00000488147", "5'UTR"),
                ("WASH7P_ENST00000423562", "3'Flank"),
                ("WASH7P_ENST00000438504", "RNA"),
                ("OR4F5_ENST00000335137", "Frame_Shift_Ins"),
                ("OR4F5_ENST00000335137", "Intron"),
                ("TP53_ENST00000269305", "Nonsense_Mutation"),
            ]
        );
        assert_eq!(rows[2][33], "p.M1V");

        Ok(())
    }

    #[test]
    fn gatk_caller_and_build() -> Result<(), anyhow::Error> {
        let args = Args {
            somatic_caller: SomaticCaller::GatkSomaticIndelDetector,
            genome_release: GenomeRelease::Grch38,
            ..args(true)
        };

        let (_, rows) = convert(&args)?;

        assert!(rows[1..].iter().all(|row| row[25] == "Somatic"));
        assert!(rows[1..].iter().all(|row| row[3] == "38"));

        Ok(())
    }

    #[test]
    fn max_var_count() -> Result<(), anyhow::Error> {
        let args = Args {
            max_var_count: Some(1),
            ..args(true)
        };

        let (counts, rows) = convert(&args)?;

        assert_eq!(counts.variants, 1);
        assert_eq!(rows.len(), 2);

        Ok(())
    }

    #[test]
    fn custom_priorities_missing_effect() {
        let args = Args {
            path_effect_priorities: Some("tests/data/vcf/effect_priorities.tsv".to_string()),
            ..args(false)
        };

        let err = convert(&args).unwrap_err();

        assert_eq!(
            err.downcast_ref::<Error>().map(Error::kind),
            Some(ErrorKind::LookupFailure)
        );
    }

    #[test]
    fn run_writes_file() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_output = tmp_dir.join("out.maf");
        let args = Args {
            path_output_maf: Some(path_output.to_string_lossy().to_string()),
            ..args(true)
        };

        super::run(&crate::common::Args::default(), &args)?;

        let contents = std::fs::read_to_string(&path_output)?;
        assert_eq!(contents.lines().count(), 4);
        insta::assert_snapshot!(
            contents.lines().last().unwrap_or_default().replace('\t', " | "),
            @"TP53_ENST00000269305 | 7157 | sequencing.center | 37 | 17 | 7577120 | 7577120 | + | Nonsense_Mutation | SNP | C | T | T | rs28934576 |  | S1 | S1 | C | T |  |  |  |  |  |  | LOH |  | WES |  |  |  | Illumina HiSeq | ENST00000269305 | p.R273*"
        );

        Ok(())
    }
}
