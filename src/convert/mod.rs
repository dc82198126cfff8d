//! Conversion of VCF files into tabular reports.

pub mod effects;
pub mod maf;
pub mod summaries;
pub mod tsv;

use thousands::Separable;

use crate::annotate::snpeff::{load_effect_priorities, ConfigBuilder, EffectPrioritizer};

/// Value written for missing data in TSV reports.
pub const NA: &str = "NA";

/// Interval between progress messages.
const PROGRESS_SECS: u64 = 5;

/// Counters collected while converting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Number of variants read.
    pub variants: usize,
    /// Number of variants that did not yield any output row.
    pub skipped: usize,
    /// Number of output rows written (excluding the header).
    pub rows: usize,
}

impl Counts {
    pub fn log_summary(&self) {
        tracing::info!(
            "... read {} variants, skipped {}, wrote {} rows",
            self.variants.separate_with_commas(),
            self.skipped.separate_with_commas(),
            self.rows.separate_with_commas()
        );
    }
}

/// Construct the effect prioritizer, from the given priority file or with the default table.
pub fn build_prioritizer(
    path_effect_priorities: Option<&str>,
) -> Result<EffectPrioritizer, anyhow::Error> {
    let mut builder = ConfigBuilder::default();
    if let Some(path) = path_effect_priorities {
        tracing::info!("Loading effect priorities from {}", path);
        let effects = load_effect_priorities(path)?;
        tracing::info!("... loaded {} effect names", effects.len());
        builder = builder.effects_prioritized(effects);
    }
    Ok(EffectPrioritizer::new(builder.build()?))
}

/// Emits a progress message at most every few seconds.
struct Progress {
    prev: std::time::Instant,
}

impl Progress {
    fn new() -> Self {
        Self {
            prev: std::time::Instant::now(),
        }
    }

    fn tick(&mut self, chrom: &str, pos: &str) {
        if self.prev.elapsed().as_secs() >= PROGRESS_SECS {
            tracing::info!("at {}:{}", chrom, pos);
            self.prev = std::time::Instant::now();
        }
    }
}
