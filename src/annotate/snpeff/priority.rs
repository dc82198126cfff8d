//! Ranking of SnpEff effects by severity.

use std::{collections::HashMap, path::Path};

use parse_display::{Display, FromStr};
use strum::IntoEnumIterator;

use super::eff::{parse_eff_info, EffectAnnotation};
use crate::{
    common::io::std::open_read_maybe_gz,
    vcf::{Error, VariantRecord},
};

/// Putative impact level of a SnpEff effect.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    FromStr,
)]
#[display(style = "UPPERCASE")]
pub enum PutativeImpact {
    High,
    Moderate,
    Low,
    Modifier,
}

/// SnpEff (classic `EFF`) effect names, most severe first.
///
/// The declaration order is the default priority order.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Display, FromStr, strum::EnumIter,
)]
#[display(style = "SNAKE_CASE")]
pub enum SnpEffEffect {
    // high impact
    SpliceSiteAcceptor,
    SpliceSiteDonor,
    StartLost,
    ExonDeleted,
    FrameShift,
    StopGained,
    StopLost,
    // moderate impact
    NonSynonymousCoding,
    CodonChange,
    CodonInsertion,
    CodonChangePlusCodonInsertion,
    CodonDeletion,
    CodonChangePlusCodonDeletion,
    #[display("UTR_5_DELETED")]
    Utr5Deleted,
    #[display("UTR_3_DELETED")]
    Utr3Deleted,
    // low impact
    SynonymousStart,
    NonSynonymousStart,
    StartGained,
    SynonymousCoding,
    SynonymousStop,
    NonSynonymousStop,
    // modifier
    #[display("UTR_5_PRIME")]
    Utr5Prime,
    #[display("UTR_3_PRIME")]
    Utr3Prime,
    Regulation,
    Upstream,
    Downstream,
    Gene,
    Transcript,
    Exon,
    IntronConserved,
    Intron,
    Intragenic,
    Intergenic,
    IntergenicConserved,
    #[display("NONE")]
    NoEffect,
    Chromosome,
    Custom,
    Cds,
}

impl From<SnpEffEffect> for PutativeImpact {
    fn from(val: SnpEffEffect) -> Self {
        match val {
            SnpEffEffect::SpliceSiteAcceptor
            | SnpEffEffect::SpliceSiteDonor
            | SnpEffEffect::StartLost
            | SnpEffEffect::ExonDeleted
            | SnpEffEffect::FrameShift
            | SnpEffEffect::StopGained
            | SnpEffEffect::StopLost => PutativeImpact::High,
            SnpEffEffect::NonSynonymousCoding
            | SnpEffEffect::CodonChange
            | SnpEffEffect::CodonInsertion
            | SnpEffEffect::CodonChangePlusCodonInsertion
            | SnpEffEffect::CodonDeletion
            | SnpEffEffect::CodonChangePlusCodonDeletion
            | SnpEffEffect::Utr5Deleted
            | SnpEffEffect::Utr3Deleted => PutativeImpact::Moderate,
            SnpEffEffect::SynonymousStart
            | SnpEffEffect::NonSynonymousStart
            | SnpEffEffect::StartGained
            | SnpEffEffect::SynonymousCoding
            | SnpEffEffect::SynonymousStop
            | SnpEffEffect::NonSynonymousStop => PutativeImpact::Low,
            SnpEffEffect::Utr5Prime
            | SnpEffEffect::Utr3Prime
            | SnpEffEffect::Regulation
            | SnpEffEffect::Upstream
            | SnpEffEffect::Downstream
            | SnpEffEffect::Gene
            | SnpEffEffect::Transcript
            | SnpEffEffect::Exon
            | SnpEffEffect::IntronConserved
            | SnpEffEffect::Intron
            | SnpEffEffect::Intragenic
            | SnpEffEffect::Intergenic
            | SnpEffEffect::IntergenicConserved
            | SnpEffEffect::NoEffect
            | SnpEffEffect::Chromosome
            | SnpEffEffect::Custom
            | SnpEffEffect::Cds => PutativeImpact::Modifier,
        }
    }
}

impl SnpEffEffect {
    /// Return vector of all values of `SnpEffEffect`.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    pub fn impact(&self) -> PutativeImpact {
        PutativeImpact::from(*self)
    }
}

/// The default priority table: all effect names, most severe first.
pub fn default_effects_prioritized() -> Vec<String> {
    SnpEffEffect::iter().map(|effect| effect.to_string()).collect()
}

/// Configuration for the `EffectPrioritizer`.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// Effect names, most severe first.
    #[builder(default = "default_effects_prioritized()")]
    pub effects_prioritized: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            effects_prioritized: default_effects_prioritized(),
        }
    }
}

/// Orders the effects of a variant by a priority table.
#[derive(Debug, Clone)]
pub struct EffectPrioritizer {
    effects_prioritized: Vec<String>,
    effect_to_priority: HashMap<String, usize>,
}

impl Default for EffectPrioritizer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl EffectPrioritizer {
    pub fn new(config: Config) -> Self {
        let mut result = Self {
            effects_prioritized: Vec::new(),
            effect_to_priority: HashMap::new(),
        };
        result.set_prioritized_effects(config.effects_prioritized);
        result
    }

    /// Replace the priority table.
    ///
    /// Effect names are not validated; ranking an effect that is not in the table fails.
    pub fn set_prioritized_effects(&mut self, effects: Vec<String>) {
        // keep the first occurrence of duplicates
        self.effect_to_priority = HashMap::with_capacity(effects.len());
        for (i, effect) in effects.iter().enumerate() {
            self.effect_to_priority.entry(effect.clone()).or_insert(i);
        }
        self.effects_prioritized = effects;
    }

    /// The priority table, most severe first.
    pub fn effects_prioritized(&self) -> &[String] {
        &self.effects_prioritized
    }

    /// Rank of `effect`, 0 being the most severe.
    pub fn priority(&self, effect: &str) -> Result<usize, Error> {
        self.effect_to_priority
            .get(effect)
            .copied()
            .ok_or_else(|| Error::UnknownEffect(effect.to_string()))
    }

    /// Stable sort of `effects` by rank.
    pub fn sort_effects(
        &self,
        effects: Vec<EffectAnnotation>,
    ) -> Result<Vec<EffectAnnotation>, Error> {
        let mut ranked = effects
            .into_iter()
            .map(|effect| Ok((self.priority(&effect.effect)?, effect)))
            .collect::<Result<Vec<_>, Error>>()?;
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, effect)| effect).collect())
    }

    /// Parse the `EFF` entry of `record`, sorted by rank.
    pub fn parse_effects(&self, record: &VariantRecord) -> Result<Vec<EffectAnnotation>, Error> {
        self.sort_effects(parse_eff_info(&record.info)?)
    }

    /// The most severe effect of `record`, `None` if it has no (usable) effects.
    pub fn select_highest_priority_effect(
        &self,
        record: &VariantRecord,
    ) -> Result<Option<EffectAnnotation>, Error> {
        Ok(self.parse_effects(record)?.into_iter().next())
    }
}

/// One line of an effect priority file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
struct EffectPriorityRecord {
    /// Impact category, informative only.
    impact: String,
    /// Effect name.
    effect: String,
}

/// Load an effect priority table from a two-column TSV file (`impact`, `effect`), most
/// severe first.  Lines starting with `#` are ignored.
pub fn load_effect_priorities<P: AsRef<Path>>(path: P) -> Result<Vec<String>, anyhow::Error> {
    tracing::debug!("loading effect priorities from {:?}", path.as_ref());
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(open_read_maybe_gz(path.as_ref())?);

    let mut result = Vec::new();
    for record in reader.deserialize() {
        let record: EffectPriorityRecord = record?;
        tracing::trace!("effect {} ({}) has rank {}", record.effect, record.impact, result.len());
        result.push(record.effect);
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use std::{rc::Rc, str::FromStr};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::vcf::{ColumnIndex, ErrorKind, VcfReader};

    const PATH_SNPEFF: &str = "tests/data/vcf/example.varscan.snpeff.vcf";

    fn record_with_info(info: &str) -> VariantRecord {
        let columns = Rc::new(
            ColumnIndex::from_header_line("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")
                .unwrap(),
        );
        VariantRecord::parse(&columns, &format!("1\t100\t.\tA\tC\t.\tPASS\t{}", info)).unwrap()
    }

    #[test]
    fn putative_impact_display() {
        assert_eq!(format!("{}", PutativeImpact::High), "HIGH");
        assert_eq!(format!("{}", PutativeImpact::Modifier), "MODIFIER");
        assert_eq!(
            PutativeImpact::from_str("MODERATE").ok(),
            Some(PutativeImpact::Moderate)
        );
    }

    #[rstest::rstest]
    #[case(SnpEffEffect::SpliceSiteAcceptor, "SPLICE_SITE_ACCEPTOR")]
    #[case(SnpEffEffect::CodonChangePlusCodonInsertion, "CODON_CHANGE_PLUS_CODON_INSERTION")]
    #[case(SnpEffEffect::Utr5Deleted, "UTR_5_DELETED")]
    #[case(SnpEffEffect::Utr3Prime, "UTR_3_PRIME")]
    #[case(SnpEffEffect::NoEffect, "NONE")]
    #[case(SnpEffEffect::Cds, "CDS")]
    fn snpeff_effect_display(#[case] effect: SnpEffEffect, #[case] expected: &str) {
        assert_eq!(format!("{}", effect), expected);
        assert_eq!(SnpEffEffect::from_str(expected).ok(), Some(effect));
    }

    #[test]
    fn snpeff_effect_impact() {
        let impacts = SnpEffEffect::all()
            .into_iter()
            .map(|effect| effect.impact())
            .collect::<Vec<_>>();

        assert_eq!(impacts.len(), 38);
        assert_eq!(
            impacts
                .iter()
                .filter(|i| **i == PutativeImpact::High)
                .count(),
            7
        );
        assert_eq!(
            impacts
                .iter()
                .filter(|i| **i == PutativeImpact::Moderate)
                .count(),
            8
        );
        assert_eq!(
            impacts.iter().filter(|i| **i == PutativeImpact::Low).count(),
            6
        );
        // impact bands are contiguous and ordered
        assert!(impacts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[rstest::rstest]
    #[case("SPLICE_SITE_ACCEPTOR", 0)]
    #[case("STOP_GAINED", 5)]
    #[case("CODON_CHANGE_PLUS_CODON_INSERTION", 10)]
    #[case("UTR_5_PRIME", 21)]
    #[case("CDS", 37)]
    fn default_priorities(#[case] effect: &str, #[case] expected: usize) -> Result<(), anyhow::Error> {
        let prioritizer = EffectPrioritizer::default();

        assert_eq!(prioritizer.priority(effect)?, expected);
        assert_eq!(prioritizer.effects_prioritized()[expected], effect);

        Ok(())
    }

    #[test]
    fn custom_priorities() -> Result<(), anyhow::Error> {
        let mut prioritizer = EffectPrioritizer::new(
            ConfigBuilder::default()
                .effects_prioritized(vec!["foo".to_string(), "bar".to_string()])
                .build()?,
        );

        assert_eq!(prioritizer.priority("foo")?, 0);
        assert_eq!(prioritizer.priority("bar")?, 1);
        assert_eq!(
            prioritizer.priority("STOP_GAINED").unwrap_err().kind(),
            ErrorKind::LookupFailure
        );

        prioritizer.set_prioritized_effects(vec!["bar".to_string(), "foo".to_string()]);
        assert_eq!(prioritizer.priority("foo")?, 1);
        assert_eq!(prioritizer.priority("bar")?, 0);

        Ok(())
    }

    #[test]
    fn config_builder_default() -> Result<(), anyhow::Error> {
        let config = ConfigBuilder::default().build()?;

        assert_eq!(config.effects_prioritized.len(), 38);
        assert_eq!(config.effects_prioritized, Config::default().effects_prioritized);

        Ok(())
    }

    #[test]
    fn instances_are_independent() -> Result<(), anyhow::Error> {
        let mut first = EffectPrioritizer::default();
        let second = EffectPrioritizer::default();

        first.set_prioritized_effects(vec!["foo".to_string()]);

        assert!(first.priority("STOP_GAINED").is_err());
        assert_eq!(second.priority("STOP_GAINED")?, 5);

        Ok(())
    }

    #[test]
    fn select_highest_priority_effect() -> Result<(), anyhow::Error> {
        let record = record_with_info(
            "DP=10;EFF=DOWNSTREAM(MODIFIER||||G1|||T1|),TRANSCRIPT(MODIFIER||||G2|||T2|),\
             STOP_GAINED(HIGH||||G3|||T3|)",
        );

        let effect = EffectPrioritizer::default()
            .select_highest_priority_effect(&record)?
            .expect("effect");

        assert_eq!(effect.effect, "STOP_GAINED");
        assert_eq!(effect.gene, "G3");

        Ok(())
    }

    #[test]
    fn parse_effects_is_stable() -> Result<(), anyhow::Error> {
        let record = record_with_info(
            "EFF=INTRON(MODIFIER||||G1|||T1|),FRAME_SHIFT(HIGH||||G2|||T2|),\
             INTRON(MODIFIER||||G3|||T3|),FRAME_SHIFT(HIGH||||G4|||T4|)",
        );

        let effects = EffectPrioritizer::default().parse_effects(&record)?;

        assert_eq!(
            effects.iter().map(|e| e.gene.as_str()).collect::<Vec<_>>(),
            vec!["G2", "G4", "G1", "G3"]
        );

        Ok(())
    }

    #[test]
    fn parse_effects_unknown_effect() {
        let record = record_with_info("EFF=SOMETHING_NEW(MODIFIER||||G1|||T1|)");

        let err = EffectPrioritizer::default()
            .parse_effects(&record)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LookupFailure);
    }

    #[test]
    fn select_highest_priority_effect_none() -> Result<(), anyhow::Error> {
        let prioritizer = EffectPrioritizer::default();

        assert_eq!(
            prioritizer.select_highest_priority_effect(&record_with_info("DP=10"))?,
            None
        );
        assert_eq!(
            prioritizer.select_highest_priority_effect(&record_with_info(
                "EFF=STOP_GAINED(HIGH||||G1|||T1||ERROR|WARNING)"
            ))?,
            None
        );

        Ok(())
    }

    #[test]
    fn example_file() -> Result<(), anyhow::Error> {
        let mut reader = VcfReader::from_path(PATH_SNPEFF)?;
        reader.jump_to_variants()?;
        let prioritizer = EffectPrioritizer::default();

        let first = reader.read_variant()?.expect("first record");
        assert_eq!(
            prioritizer
                .parse_effects(&first)?
                .iter()
                .map(|e| e.effect.as_str())
                .collect::<Vec<_>>(),
            vec![
                "SPLICE_SITE_ACCEPTOR",
                "NON_SYNONYMOUS_CODING",
                "UTR_5_PRIME",
                "DOWNSTREAM",
                "TRANSCRIPT"
            ]
        );

        let second = reader.read_variant()?.expect("second record");
        let effects = prioritizer.parse_effects(&second)?;
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].effect, "FRAME_SHIFT");
        assert_eq!(effects[0].transcript, "ENST00000335137");

        let third = reader.read_variant()?.expect("third record");
        let effect = prioritizer
            .select_highest_priority_effect(&third)?
            .expect("effect");
        assert_eq!(effect.effect, "STOP_GAINED");
        assert_eq!(effect.aa_change, "R273*");

        let fourth = reader.read_variant()?.expect("fourth record");
        assert_eq!(prioritizer.select_highest_priority_effect(&fourth)?, None);

        Ok(())
    }

    #[test]
    fn load_effect_priorities() -> Result<(), anyhow::Error> {
        let effects = super::load_effect_priorities("tests/data/vcf/effect_priorities.tsv")?;

        assert_eq!(
            effects,
            vec![
                "DOWNSTREAM",
                "SPLICE_SITE_ACCEPTOR",
                "NON_SYNONYMOUS_CODING",
                "UTR_5_PRIME",
                "TRANSCRIPT"
            ]
        );

        Ok(())
    }
}
