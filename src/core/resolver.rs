//! RB-005: Slot resolution — eligible candidates per template slot.
//!
//! An item is eligible for a slot when it fills the slot type, every tag it
//! carries is allowed, and no banned substring occurs in its name
//! (case-insensitive). Candidates are ordered by the sum of their own
//! priority stats, descending, with catalog order breaking ties.

use super::catalog::FoodCatalog;
use super::error::SearchError;
use super::types::*;
use std::cmp::Ordering;

/// Ordered candidates for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCandidates {
    pub slot_type: String,
    /// Catalog indices, best first
    pub items: Vec<usize>,
}

impl SlotCandidates {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether an item may fill a slot under the given (normalized) config.
pub fn is_eligible(item: &CatalogItem, slot_type: &str, config: &SearchConfig) -> bool {
    item.fills(slot_type)
        && config.tags_allowed(item.tags())
        && !config
            .banned
            .iter()
            .any(|ban| item.name_lower().contains(&ban.to_lowercase()))
}

/// Eligible candidates for one slot type, pre-sorted.
pub fn candidates_for(
    catalog: &FoodCatalog,
    slot_type: &str,
    config: &SearchConfig,
    priority: &[usize],
) -> Vec<usize> {
    let mut ranked: Vec<(f64, usize)> = catalog
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| is_eligible(item, slot_type, config))
        .map(|(i, item)| (priority.iter().map(|&p| item.stats()[p]).sum(), i))
        .collect();
    // sort_by is stable: equal sums keep catalog order. Values are finite,
    // and -0.0 must tie with 0.0.
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    ranked.into_iter().map(|(_, i)| i).collect()
}

/// Resolve candidates for every slot of a template.
///
/// Fails with [`SearchError::EmptySlot`] on the first slot with no
/// candidates, and with `InvalidConfiguration` on unknown priority names.
pub fn resolve_slots(
    catalog: &FoodCatalog,
    template: &RecipeTemplate,
    config: &SearchConfig,
) -> Result<Vec<SlotCandidates>, SearchError> {
    let config = config.normalized();
    let priority = catalog.schema().resolve(&config.priority)?;

    let mut slots = Vec::with_capacity(template.len());
    for (slot, slot_type) in template.slots().iter().enumerate() {
        let items = candidates_for(catalog, slot_type, &config, &priority);
        if items.is_empty() {
            return Err(SearchError::EmptySlot {
                slot,
                slot_type: slot_type.clone(),
            });
        }
        slots.push(SlotCandidates {
            slot_type: slot_type.clone(),
            items,
        });
    }
    Ok(slots)
}

/// Rough runtime multiplier of a depth relative to depth 1:
/// `10^((depth-1) * slots)`, saturating.
pub fn depth_runtime_multiplier(depth: u32, slot_count: usize) -> u128 {
    let exp = (depth.saturating_sub(1) as usize).saturating_mul(slot_count);
    u32::try_from(exp)
        .ok()
        .and_then(|e| 10u128.checked_pow(e))
        .unwrap_or(u128::MAX)
}

/// Estimated number of combinations a search at this depth stands for:
/// the product of candidate counts scaled by the depth multiplier.
pub fn estimate_search_space(slots: &[SlotCandidates], depth: u32) -> u128 {
    let raw = slots
        .iter()
        .fold(1u128, |acc, s| acc.saturating_mul(s.len() as u128));
    raw.saturating_mul(depth_runtime_multiplier(depth, slots.len()))
}
