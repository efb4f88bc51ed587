//! RB-006: Scoring — map a stat vector to a sortable key.
//!
//! The calculation mode is resolved once into a list of terms when the
//! [`Scorer`] is built, so scoring itself never branches on the mode.
//!
//! In potential-weighted mode each priority name is processed on its own: a
//! base attribute whose `_pot` companion is also a priority contributes
//! `base * pot`, and the `_pot` name then contributes its own value as well.

use super::catalog::AttributeSchema;
use super::error::SearchError;
use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Term {
    Plain(usize),
    Weighted { base: usize, pot: usize },
}

/// Scoring strategy for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer {
    mode: CalcMode,
    terms: Vec<Term>,
}

impl Scorer {
    /// Resolve priority names against the schema for the given mode.
    pub fn new(
        schema: &AttributeSchema,
        priority: &[String],
        mode: CalcMode,
    ) -> Result<Self, SearchError> {
        let indices = schema.resolve(priority)?;
        let terms = match mode {
            CalcMode::RawSum | CalcMode::Reserved => {
                indices.into_iter().map(Term::Plain).collect()
            }
            CalcMode::PotentialWeighted => priority
                .iter()
                .zip(indices)
                .map(|(name, base)| {
                    let companion = format!("{}{}", name, POT_SUFFIX);
                    match schema.index_of(&companion) {
                        Some(pot) if priority.contains(&companion) => {
                            Term::Weighted { base, pot }
                        }
                        _ => Term::Plain(base),
                    }
                })
                .collect(),
        };
        Ok(Self { mode, terms })
    }

    pub fn mode(&self) -> CalcMode {
        self.mode
    }

    /// Primary term only.
    pub fn primary(&self, stats: &[f64]) -> f64 {
        self.terms.iter().fold(0.0, |acc, term| {
            acc + match *term {
                Term::Plain(i) => stats[i],
                Term::Weighted { base, pot } => stats[base] * stats[pot],
            }
        })
    }

    /// Full key: primary term, then the sum of the whole vector.
    pub fn score(&self, stats: &[f64]) -> ScoreKey {
        ScoreKey {
            primary: self.primary(stats),
            secondary: stats.iter().fold(0.0, |acc, v| acc + v),
        }
    }

    /// Key for a finalized integer vector.
    pub fn score_final(&self, stats: &[i64]) -> ScoreKey {
        let as_float: Vec<f64> = stats.iter().map(|&v| v as f64).collect();
        self.score(&as_float)
    }
}
