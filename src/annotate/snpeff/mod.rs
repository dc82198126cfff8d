//! SnpEff effect annotations (`EFF` INFO entry) and their prioritization.

pub mod eff;
pub mod priority;

pub use eff::EffectAnnotation;
pub use priority::{
    load_effect_priorities, Config, ConfigBuilder, EffectPrioritizer, PutativeImpact, SnpEffEffect,
};
