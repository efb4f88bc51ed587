//! RB-008: Result finalization — clamp, filter, rank, truncate.
//!
//! Applied to the surviving beam in this order:
//! 1. stats truncated to integers
//! 2. `per` floored at -2
//! 3. every priority attribute must be > 0
//! 4. must-have substrings counted over members (case-insensitive)
//! 5. at most one member carrying the `cha` name token
//!
//! Survivors are ranked with the search's scorer on the final vector.

use super::catalog::{AttributeSchema, FoodCatalog};
use super::scoring::Scorer;
use super::types::*;
use indexmap::IndexMap;

/// A must-have substring and how many members must contain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MustHave {
    pub needle: String,
    pub count: usize,
}

/// Collapse the must-have multiset into per-substring minimum counts,
/// in first-seen order.
pub fn must_have_requirements(must_have: &[String]) -> Vec<MustHave> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for m in must_have {
        *counts.entry(m.to_lowercase()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(needle, count)| MustHave { needle, count })
        .collect()
}

/// Each member counts once per substring, however often it matches.
pub fn satisfies_must_have(members: &[&str], requirements: &[MustHave]) -> bool {
    requirements.iter().all(|req| {
        let found = members
            .iter()
            .filter(|m| m.to_lowercase().contains(&req.needle))
            .count();
        found >= req.count
    })
}

/// Whether a name carries the co-occurrence marker as a whole token.
pub fn has_marker(name: &str) -> bool {
    name.to_lowercase()
        .split_whitespace()
        .any(|token| token == CO_OCCURRENCE_MARKER)
}

pub fn marker_count(members: &[&str]) -> usize {
    members.iter().filter(|m| has_marker(m)).count()
}

/// Truncate toward zero.
pub fn truncate_stats(stats: &[f64]) -> Vec<i64> {
    stats.iter().map(|v| v.trunc() as i64).collect()
}

/// Floor the clamped attribute, if the schema has it.
pub fn clamp_stats(schema: &AttributeSchema, stats: &mut [i64]) {
    if let Some(i) = schema.index_of(CLAMPED_ATTRIBUTE) {
        if stats[i] < CLAMP_FLOOR {
            stats[i] = CLAMP_FLOOR;
        }
    }
}

/// XP breakdown: priority stats weighted by their `_pot` dimension (1 when
/// the dimension is absent), other stats weighted by `_pot` unless it is 0.
pub fn xp_summary(schema: &AttributeSchema, stats: &[i64], priority: &[String]) -> XpSummary {
    let mut summary = XpSummary::default();
    for (i, name) in schema.names().iter().enumerate() {
        if name.ends_with(POT_SUFFIX) {
            continue;
        }
        let pot = schema.pot_index(name).map(|p| stats[p]);
        if priority.contains(name) {
            summary.prioritized += stats[i] * pot.unwrap_or(1);
        } else {
            let weight = match pot {
                Some(0) | None => 1,
                Some(p) => p,
            };
            summary.non_prioritized += stats[i] * weight;
        }
    }
    summary.total = summary.prioritized + summary.non_prioritized;
    summary
}

/// Finalized output plus how many beam entries passed the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub results: Vec<RecipeResult>,
    pub survivors: usize,
}

/// Filter and rank the final beam. `config` must already be normalized.
pub fn finalize(
    catalog: &FoodCatalog,
    beam: &[BeamEntry],
    scorer: &Scorer,
    config: &SearchConfig,
) -> Finalized {
    let schema = catalog.schema();
    let priority: Vec<usize> = config
        .priority
        .iter()
        .filter_map(|p| schema.index_of(p))
        .collect();
    let requirements = must_have_requirements(&config.must_have);

    let mut kept: Vec<(ScoreKey, Vec<&str>, Vec<i64>)> = Vec::new();
    for entry in beam {
        let mut stats = truncate_stats(&entry.stats);
        clamp_stats(schema, &mut stats);

        if !priority.iter().all(|&p| stats[p] > 0) {
            continue;
        }
        let members: Vec<&str> = entry.items.iter().map(|&i| catalog.item(i).name()).collect();
        if !requirements.is_empty() && !satisfies_must_have(&members, &requirements) {
            continue;
        }
        if marker_count(&members) > 1 {
            continue;
        }
        kept.push((scorer.score_final(&stats), members, stats));
    }
    let survivors = kept.len();

    kept.sort_by(|a, b| b.0.cmp(&a.0));
    let with_xp = scorer.mode() != CalcMode::Reserved;
    let results = kept
        .into_iter()
        .take(config.top_k)
        .enumerate()
        .map(|(i, (score, members, stats))| RecipeResult {
            rank: i + 1,
            members: members.into_iter().map(str::to_string).collect(),
            xp: with_xp.then(|| xp_summary(schema, &stats, &config.priority)),
            stats: schema.names().iter().cloned().zip(stats).collect(),
            score,
        })
        .collect();

    Finalized { results, survivors }
}
