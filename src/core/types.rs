//! RB-001: Core types — catalog records, templates, search config, beam entries, results.
//!
//! File-facing types (catalog records, presets) derive Serialize/Deserialize so
//! they roundtrip through YAML and JSON. Search-internal types stay plain.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Longest recipe template the engine accepts.
pub const MAX_SLOTS: usize = 5;

/// Smallest beam-depth multiplier.
pub const MIN_DEPTH: u32 = 1;

/// Largest beam-depth multiplier.
pub const MAX_DEPTH: u32 = 10;

/// Suffix naming the "potential" companion of a base attribute.
pub const POT_SUFFIX: &str = "_pot";

/// Attribute floored during finalization.
pub const CLAMPED_ATTRIBUTE: &str = "per";

/// Floor applied to [`CLAMPED_ATTRIBUTE`].
pub const CLAMP_FLOOR: i64 = -2;

/// Name token allowed at most once per combination.
pub const CO_OCCURRENCE_MARKER: &str = "cha";

// ============================================================================
// Catalog file
// ============================================================================

/// On-disk catalog: the ordered attribute list plus every item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Ordered attribute names; every stat vector uses this order
    pub attributes: Vec<String>,

    /// Catalog items (order is the tie-break order for equal candidates)
    #[serde(default)]
    pub items: Vec<CatalogRecord>,
}

/// One catalog row as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Unique item name
    pub name: String,

    /// Slot types this item can fill
    #[serde(default)]
    pub slot_types: Vec<String>,

    /// Descriptive tags used by the allow-set filter
    #[serde(default)]
    pub tags: Vec<String>,

    /// Attribute values keyed by name; missing keys are zero
    #[serde(default)]
    pub stats: IndexMap<String, f64>,
}

// ============================================================================
// Catalog items
// ============================================================================

/// An immutable catalog item with a dense stat vector.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    name: String,
    name_lower: String,
    slot_types: Vec<String>,
    tags: Vec<String>,
    stats: Vec<f64>,
}

impl CatalogItem {
    /// Build an item. Slot types and tags are deduplicated, order kept.
    pub fn new(name: &str, slot_types: &[String], tags: &[String], stats: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            name_lower: name.to_lowercase(),
            slot_types: dedup_preserving(slot_types),
            tags: dedup_preserving(tags),
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased name, precomputed for substring filters.
    pub fn name_lower(&self) -> &str {
        &self.name_lower
    }

    pub fn slot_types(&self) -> &[String] {
        &self.slot_types
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Dense stat vector in catalog attribute order.
    pub fn stats(&self) -> &[f64] {
        &self.stats
    }

    /// Whether this item can fill the given slot type.
    pub fn fills(&self, slot_type: &str) -> bool {
        self.slot_types.iter().any(|s| s == slot_type)
    }
}

fn dedup_preserving(values: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// Template and search config
// ============================================================================

/// Ordered slot-type labels. A search fills each slot with one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeTemplate(Vec<String>);

impl RecipeTemplate {
    pub fn new<S: AsRef<str>>(slots: &[S]) -> Self {
        Self(slots.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn slots(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecipeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// How combinations are scored during pruning and final ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMode {
    /// Sum of priority attributes
    RawSum,
    /// Priority attributes weighted by their selected `_pot` companions
    #[default]
    PotentialWeighted,
    /// Placeholder; scores like `RawSum`
    Reserved,
}

impl CalcMode {
    /// Human-readable description shown next to the mode.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RawSum => "maximize food stat level: rank by the sum of priority stats",
            Self::PotentialWeighted => {
                "maximize XP gain: weight each priority stat by its selected stat_pot"
            }
            Self::Reserved => "reserved: currently ranks like raw_sum",
        }
    }
}

impl fmt::Display for CalcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawSum => write!(f, "raw_sum"),
            Self::PotentialWeighted => write!(f, "potential_weighted"),
            Self::Reserved => write!(f, "reserved"),
        }
    }
}

impl FromStr for CalcMode {
    type Err = String;

    /// Accepts the snake_case names and the legacy numeric codes 0/1/2.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw_sum" | "raw-sum" | "0" => Ok(Self::RawSum),
            "potential_weighted" | "potential-weighted" | "1" => Ok(Self::PotentialWeighted),
            "reserved" | "2" => Ok(Self::Reserved),
            other => Err(format!(
                "unknown calculation mode '{}' (expected raw_sum, potential_weighted, reserved)",
                other
            )),
        }
    }
}

/// Per-search constraints and knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Attributes to maximize; each must end strictly positive
    #[serde(default)]
    pub priority: Vec<String>,

    /// Case-insensitive substrings that exclude an item by name
    #[serde(default)]
    pub banned: Vec<String>,

    /// Case-insensitive substrings required in member names (multiset)
    #[serde(default)]
    pub must_have: Vec<String>,

    /// Allowed tags; `None` allows every tag
    #[serde(default)]
    pub allowed_tags: Option<BTreeSet<String>>,

    /// Number of results to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Beam-depth multiplier
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// Scoring mode
    #[serde(default)]
    pub mode: CalcMode,
}

fn default_top_k() -> usize {
    5
}

fn default_depth() -> u32 {
    MIN_DEPTH
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            priority: Vec::new(),
            banned: Vec::new(),
            must_have: Vec::new(),
            allowed_tags: None,
            top_k: default_top_k(),
            depth: default_depth(),
            mode: CalcMode::default(),
        }
    }
}

impl SearchConfig {
    /// Canonical form used by the engine.
    ///
    /// Banned entries are trimmed, lowercased and deduplicated. Must-have
    /// entries are trimmed and lowercased but keep duplicates, since each
    /// repeat raises the required count. Priority names are deduplicated.
    pub fn normalized(&self) -> Self {
        let mut banned: Vec<String> = Vec::new();
        for b in &self.banned {
            let b = b.trim().to_lowercase();
            if !b.is_empty() && !banned.contains(&b) {
                banned.push(b);
            }
        }
        let must_have = self
            .must_have
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        let mut priority: Vec<String> = Vec::new();
        for p in &self.priority {
            let p = p.trim().to_string();
            if !p.is_empty() && !priority.contains(&p) {
                priority.push(p);
            }
        }
        Self {
            priority,
            banned,
            must_have,
            allowed_tags: self.allowed_tags.clone(),
            top_k: self.top_k,
            depth: self.depth,
            mode: self.mode,
        }
    }

    /// Whether an item with these tags passes the allow-set.
    /// Untagged items always pass.
    pub fn tags_allowed(&self, tags: &[String]) -> bool {
        match &self.allowed_tags {
            None => true,
            Some(allowed) => tags.iter().all(|t| allowed.contains(t)),
        }
    }
}

/// A saved search: template plus config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name
    #[serde(default)]
    pub name: Option<String>,

    /// Slot types to fill, in order
    pub template: RecipeTemplate,

    #[serde(flatten)]
    pub config: SearchConfig,
}

// ============================================================================
// Search state and results
// ============================================================================

/// A partial combination carried between slots.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamEntry {
    /// Catalog indices of the chosen items, one per processed slot
    pub items: Vec<usize>,

    /// Accumulated stat vector (penalties included)
    pub stats: Vec<f64>,
}

impl BeamEntry {
    /// The empty combination at the root of the search.
    pub fn root(dimensions: usize) -> Self {
        Self {
            items: Vec::new(),
            stats: vec![0.0; dimensions],
        }
    }
}

/// Sortable score: primary term first, overall magnitude second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreKey {
    pub primary: f64,
    pub secondary: f64,
}

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then_with(|| self.secondary.total_cmp(&other.secondary))
    }
}

/// Experience breakdown shown alongside a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpSummary {
    pub prioritized: i64,
    pub non_prioritized: i64,
    pub total: i64,
}

/// A finalized combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeResult {
    /// 1-based rank
    pub rank: usize,

    /// Member item names in slot order
    pub members: Vec<String>,

    /// Final integer stats in catalog attribute order (after clamp)
    pub stats: IndexMap<String, i64>,

    /// Ranking key computed on the final stats
    pub score: ScoreKey,

    /// XP breakdown; absent for the reserved mode
    #[serde(default)]
    pub xp: Option<XpSummary>,
}

impl RecipeResult {
    /// Final value of a named attribute (0 if unknown).
    pub fn stat(&self, name: &str) -> i64 {
        self.stats.get(name).copied().unwrap_or(0)
    }
}

/// Progress report after a slot completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotProgress {
    /// Slots completed so far
    pub completed: usize,

    /// Template length
    pub total: usize,

    /// `completed / total`
    pub fraction: f64,

    /// Entries emitted across all slots so far
    pub emitted: u64,
}

/// Counters for one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub beam_width: usize,
    pub emitted: u64,
    pub final_beam: usize,
    pub survivors: usize,
    pub elapsed_seconds: f64,
}

impl SearchStats {
    pub fn iterations_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.emitted as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// Everything a search returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<RecipeResult>,
    pub stats: SearchStats,
}
