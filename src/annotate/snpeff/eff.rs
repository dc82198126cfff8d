//! Parsing of the SnpEff `EFF` INFO entry.
//!
//! Each comma-separated entry has the shape
//! `Effect(Impact|Functional_Class|Codon_Change|Amino_Acid_Change|Gene_Name|Transcript_BioType|Gene_Coding|Transcript_ID|Exon[|ERRORS|WARNINGS])`.

use nom::{
    bytes::complete::{tag, take_till1},
    combinator::{all_consuming, map_opt, rest},
    sequence::preceded,
    IResult, Parser,
};

use crate::vcf::Error;

/// Key of the INFO entry holding the effects.
pub const EFF_KEY: &str = "EFF";

/// Number of attributes of an effect, including the effect name.
pub const EFF_ATTRS: usize = 10;

/// One transcript-level effect prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EffectAnnotation {
    pub effect: String,
    pub impact: String,
    pub functional_class: String,
    pub codon_change: String,
    pub aa_change: String,
    pub gene: String,
    pub gene_biotype: String,
    pub coding: String,
    pub transcript: String,
    pub exon: String,
}

impl EffectAnnotation {
    /// Construct from the effect name and its `|`-separated fields.
    ///
    /// Missing trailing fields are left empty.  Returns `None` if there are more fields
    /// than attributes, as SnpEff appends errors and warnings that way.
    pub fn from_fields(effect: &str, fields: &str) -> Option<Self> {
        let fields = fields.split('|').collect::<Vec<_>>();
        if fields.len() + 1 > EFF_ATTRS {
            return None;
        }

        let mut fields = fields.into_iter().map(str::to_string);
        let mut next = || fields.next().unwrap_or_default();
        Some(Self {
            effect: effect.to_string(),
            impact: next(),
            functional_class: next(),
            codon_change: next(),
            aa_change: next(),
            gene: next(),
            gene_biotype: next(),
            coding: next(),
            transcript: next(),
            exon: next(),
        })
    }

    /// The ten attributes in declaration order.
    pub fn attrs(&self) -> [&str; EFF_ATTRS] {
        [
            &self.effect,
            &self.impact,
            &self.functional_class,
            &self.codon_change,
            &self.aa_change,
            &self.gene,
            &self.gene_biotype,
            &self.coding,
            &self.transcript,
            &self.exon,
        ]
    }
}

/// Split `NAME(fields)` into name and field string.
fn eff_token(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming((
        take_till1(|c: char| c == '('),
        preceded(tag("("), map_opt(rest, |s: &str| s.strip_suffix(')'))),
    ))
    .parse(input)
}

/// Parse a single entry; `Ok(None)` for entries carrying errors or warnings.
pub fn parse_effect(token: &str) -> Result<Option<EffectAnnotation>, Error> {
    let (_, (name, fields)) =
        eff_token(token).map_err(|_| Error::InvalidEffect(token.to_string()))?;
    Ok(EffectAnnotation::from_fields(name, fields))
}

/// Locate the value of the `EFF` entry in an INFO string.
pub fn find_eff(info: &str) -> Option<&str> {
    info.split(';').find_map(|token| {
        token
            .strip_prefix(EFF_KEY)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

/// Parse all entries of an `EFF` value in input order, skipping the over-long ones.
pub fn parse_eff_value(value: &str) -> Result<Vec<EffectAnnotation>, Error> {
    let mut result = Vec::new();
    for token in value.split(',').filter(|token| !token.is_empty()) {
        match parse_effect(token)? {
            Some(effect) => result.push(effect),
            None => tracing::debug!("skipping effect with extra fields: {}", token),
        }
    }
    Ok(result)
}

/// Parse the effects of an INFO string in input order; empty if there is no `EFF` entry.
pub fn parse_eff_info(info: &str) -> Result<Vec<EffectAnnotation>, Error> {
    match find_eff(info) {
        Some(value) => parse_eff_value(value),
        None => Ok(Vec::new()),
    }
}
