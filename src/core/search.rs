//! RB-007: Beam search — slot-by-slot expansion, scoring, pruning.
//!
//! validate → resolve slots → for each slot: expand beam × candidates →
//! stable sort by score → truncate to beam width → report progress →
//! finalize.
//!
//! Expansion runs on rayon. Emission order (beam entry outer, candidate
//! inner) is preserved by the indexed collect, and the parallel sort is
//! stable, so parallel and sequential runs rank identically.

use super::catalog::FoodCatalog;
use super::error::SearchError;
use super::finalize;
use super::resolver::{self, SlotCandidates};
use super::scoring::Scorer;
use super::types::*;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Base beam width for templates of up to [`WIDE_BEAM_MAX_SLOTS`] slots.
pub const WIDE_BEAM: usize = 100_000;

/// Base beam width for longer templates.
pub const NARROW_BEAM: usize = 1_000;

/// Longest template that gets the wide beam.
pub const WIDE_BEAM_MAX_SLOTS: usize = 2;

/// Beam width for a template length and depth multiplier.
pub fn beam_width(slot_count: usize, depth: u32) -> usize {
    let base = if slot_count > WIDE_BEAM_MAX_SLOTS {
        NARROW_BEAM
    } else {
        WIDE_BEAM
    };
    base.saturating_mul(depth as usize)
}

// ============================================================================
// Progress
// ============================================================================

/// Receives one report per completed slot.
pub trait ProgressSink {
    fn on_slot_complete(&mut self, progress: SlotProgress);
}

impl<F: FnMut(SlotProgress)> ProgressSink for F {
    fn on_slot_complete(&mut self, progress: SlotProgress) {
        self(progress)
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_slot_complete(&mut self, _progress: SlotProgress) {}
}

/// Logs progress at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_slot_complete(&mut self, progress: SlotProgress) {
        info!(
            slot = progress.completed,
            of = progress.total,
            emitted = progress.emitted,
            "slot {}/{} done ({:.0}%)",
            progress.completed,
            progress.total,
            progress.fraction * 100.0
        );
    }
}

// ============================================================================
// Combination arithmetic
// ============================================================================

/// Add an item's stats onto an accumulated vector, writing into `out`.
///
/// Every dimension where both the running total and the incoming value are
/// positive loses one point.
pub fn combine_into(acc: &[f64], item: &[f64], out: &mut [f64]) {
    for ((o, &a), &v) in out.iter_mut().zip(acc).zip(item) {
        *o = a + v;
        if a > 0.0 && v > 0.0 {
            *o -= 1.0;
        }
    }
}

/// Allocating form of [`combine_into`].
pub fn combine(acc: &[f64], item: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; acc.len()];
    combine_into(acc, item, &mut out);
    out
}

// ============================================================================
// Validation
// ============================================================================

/// Reject requests that cannot drive a search. `config` must be normalized.
pub fn validate_request(
    catalog: &FoodCatalog,
    template: &RecipeTemplate,
    config: &SearchConfig,
) -> Result<(), SearchError> {
    if template.is_empty() {
        return Err(SearchError::invalid("template must have at least one slot"));
    }
    if template.len() > MAX_SLOTS {
        return Err(SearchError::invalid(format!(
            "template has {} slots; at most {} are supported",
            template.len(),
            MAX_SLOTS
        )));
    }
    if config.priority.is_empty() {
        return Err(SearchError::invalid(
            "at least one priority attribute is required",
        ));
    }
    if config.top_k == 0 {
        return Err(SearchError::invalid("top_k must be at least 1"));
    }
    if !(MIN_DEPTH..=MAX_DEPTH).contains(&config.depth) {
        return Err(SearchError::invalid(format!(
            "depth must be between {} and {}, got {}",
            MIN_DEPTH, MAX_DEPTH, config.depth
        )));
    }
    catalog.schema().resolve(&config.priority)?;
    Ok(())
}

// ============================================================================
// Engine
// ============================================================================

/// One scored child of a beam entry, not yet materialized.
#[derive(Debug, Clone, Copy)]
struct Expansion {
    key: ScoreKey,
    parent: usize,
    candidate: usize,
}

/// The final beam and how many entries were emitted to reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamRun {
    pub beam: Vec<BeamEntry>,
    pub emitted: u64,
    /// Beam size after each slot's pruning
    pub sizes: Vec<usize>,
}

/// Beam-search engine over a borrowed catalog.
#[derive(Debug, Clone, Copy)]
pub struct BeamSearch<'a> {
    catalog: &'a FoodCatalog,
    parallel: bool,
}

impl<'a> BeamSearch<'a> {
    pub fn new(catalog: &'a FoodCatalog) -> Self {
        Self {
            catalog,
            parallel: true,
        }
    }

    /// Toggle rayon expansion (on by default).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run a full search: validate, resolve, expand, finalize.
    pub fn run(
        &self,
        template: &RecipeTemplate,
        config: &SearchConfig,
        progress: &mut dyn ProgressSink,
    ) -> Result<SearchOutcome, SearchError> {
        let span = info_span!("search", template = %template, mode = %config.mode);
        let _guard = span.enter();
        let start = Instant::now();

        let config = config.normalized();
        validate_request(self.catalog, template, &config)?;
        let scorer = Scorer::new(self.catalog.schema(), &config.priority, config.mode)?;
        let slots = resolver::resolve_slots(self.catalog, template, &config)?;
        let width = beam_width(template.len(), config.depth);

        let run = self.run_beam(&slots, &scorer, width, progress);
        let finalized = finalize::finalize(self.catalog, &run.beam, &scorer, &config);

        let stats = SearchStats {
            beam_width: width,
            emitted: run.emitted,
            final_beam: run.beam.len(),
            survivors: finalized.survivors,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };
        info!(
            total_iterations = stats.emitted,
            elapsed_seconds = stats.elapsed_seconds,
            "iterations per second: {:.2}",
            stats.iterations_per_second()
        );
        if finalized.results.is_empty() {
            warn!(
                final_beam = stats.final_beam,
                "no combination passed the final filters"
            );
        }

        Ok(SearchOutcome {
            results: finalized.results,
            stats,
        })
    }

    /// Expand and prune slot by slot, returning the final beam.
    pub fn run_beam(
        &self,
        slots: &[SlotCandidates],
        scorer: &Scorer,
        width: usize,
        progress: &mut dyn ProgressSink,
    ) -> BeamRun {
        let mut beam = vec![BeamEntry::root(self.catalog.schema().len())];
        let mut emitted = 0u64;
        let mut sizes = Vec::with_capacity(slots.len());

        for (i, slot) in slots.iter().enumerate() {
            let mut expansions = self.expand(&beam, slot, scorer);
            emitted += expansions.len() as u64;

            if self.parallel {
                expansions.par_sort_by(|a, b| b.key.cmp(&a.key));
            } else {
                expansions.sort_by(|a, b| b.key.cmp(&a.key));
            }
            expansions.truncate(width);

            beam = self.materialize(&beam, &expansions);
            sizes.push(beam.len());
            debug!(
                slot = i + 1,
                slot_type = %slot.slot_type,
                candidates = slot.len(),
                beam = beam.len(),
                emitted,
                "slot pruned"
            );

            progress.on_slot_complete(SlotProgress {
                completed: i + 1,
                total: slots.len(),
                fraction: (i + 1) as f64 / slots.len() as f64,
                emitted,
            });
        }

        BeamRun {
            beam,
            emitted,
            sizes,
        }
    }

    /// Score every beam entry × candidate pair in emission order.
    fn expand(
        &self,
        beam: &[BeamEntry],
        slot: &SlotCandidates,
        scorer: &Scorer,
    ) -> Vec<Expansion> {
        let catalog = self.catalog;
        if self.parallel {
            beam.par_iter()
                .enumerate()
                .flat_map_iter(|(parent, entry)| children(catalog, scorer, slot, parent, entry))
                .collect()
        } else {
            beam.iter()
                .enumerate()
                .flat_map(|(parent, entry)| children(catalog, scorer, slot, parent, entry))
                .collect()
        }
    }

    /// Build the next beam from the surviving expansions.
    fn materialize(&self, beam: &[BeamEntry], kept: &[Expansion]) -> Vec<BeamEntry> {
        let build = |e: &Expansion| {
            let parent = &beam[e.parent];
            let mut items = Vec::with_capacity(parent.items.len() + 1);
            items.extend_from_slice(&parent.items);
            items.push(e.candidate);
            BeamEntry {
                items,
                stats: combine(&parent.stats, self.catalog.item(e.candidate).stats()),
            }
        };
        if self.parallel {
            kept.par_iter().map(build).collect()
        } else {
            kept.iter().map(build).collect()
        }
    }
}

/// Children of one beam entry, in candidate order.
fn children<'b>(
    catalog: &'b FoodCatalog,
    scorer: &'b Scorer,
    slot: &'b SlotCandidates,
    parent: usize,
    entry: &'b BeamEntry,
) -> impl Iterator<Item = Expansion> + 'b {
    let mut scratch = vec![0.0; entry.stats.len()];
    slot.items.iter().map(move |&candidate| {
        combine_into(&entry.stats, catalog.item(candidate).stats(), &mut scratch);
        Expansion {
            key: scorer.score(&scratch),
            parent,
            candidate,
        }
    })
}

/// Run a search with default settings and no progress reporting.
pub fn search(
    catalog: &FoodCatalog,
    template: &RecipeTemplate,
    config: &SearchConfig,
) -> Result<SearchOutcome, SearchError> {
    BeamSearch::new(catalog).run(template, config, &mut NoProgress)
}
