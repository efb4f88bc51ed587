//! RB-009: CLI subcommands — init, validate, catalog, candidates, estimate, search.

use crate::core::catalog::FoodCatalog;
use crate::core::{parser, resolver, search, types};
use crate::history;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample catalog and preset
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate a catalog, and a preset against it
    Validate {
        /// Path to the catalog file
        #[arg(short, long, default_value = "foods.yaml")]
        catalog: PathBuf,

        /// Path to a preset file
        #[arg(short, long)]
        preset: Option<PathBuf>,
    },

    /// List attributes, slot types and tags in a catalog
    Catalog {
        /// Path to the catalog file
        #[arg(short, long, default_value = "foods.yaml")]
        catalog: PathBuf,
    },

    /// Show the ranked candidates for each slot
    Candidates {
        #[command(flatten)]
        request: RequestArgs,

        /// Show at most this many candidates per slot
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Estimate the search space a depth stands for
    Estimate {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Run the beam search and print the best recipes
    Search {
        #[command(flatten)]
        request: RequestArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Append a record of this search to a JSONL history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Expand on a single thread
        #[arg(long)]
        sequential: bool,
    },
}

/// Catalog, preset, and per-run overrides shared by search-like commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Path to the catalog file
    #[arg(short, long, default_value = "foods.yaml")]
    pub catalog: PathBuf,

    /// Path to a preset file
    #[arg(short, long)]
    pub preset: Option<PathBuf>,

    /// Slot types, replacing the preset's template (repeatable)
    #[arg(short, long = "slot")]
    pub slots: Vec<String>,

    /// Priority attributes, replacing the preset's (repeatable)
    #[arg(long = "priority")]
    pub priority: Vec<String>,

    /// Banned name substrings, added to the preset's (repeatable)
    #[arg(long = "ban")]
    pub banned: Vec<String>,

    /// Must-have name substrings, added to the preset's (repeatable)
    #[arg(long = "must-have")]
    pub must_have: Vec<String>,

    /// Allowed tags, replacing the preset's allow-set (repeatable)
    #[arg(long = "tag", conflicts_with = "no_tags")]
    pub tags: Vec<String>,

    /// Allow no tags: only untagged items are eligible
    #[arg(long)]
    pub no_tags: bool,

    /// Number of results
    #[arg(short = 'k', long)]
    pub top: Option<usize>,

    /// Beam-depth multiplier (1-10)
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Calculation mode (raw_sum, potential_weighted, reserved)
    #[arg(short, long)]
    pub mode: Option<types::CalcMode>,
}

impl RequestArgs {
    /// Merge the preset file (if any) with command-line overrides.
    pub fn preset(&self) -> Result<types::Preset, String> {
        let mut preset = match &self.preset {
            Some(path) => parser::parse_preset_file(path)?,
            None => types::Preset {
                name: None,
                template: types::RecipeTemplate::default(),
                config: types::SearchConfig::default(),
            },
        };
        if !self.slots.is_empty() {
            preset.template = types::RecipeTemplate::new(&self.slots);
        }
        if !self.priority.is_empty() {
            preset.config.priority.clone_from(&self.priority);
        }
        preset.config.banned.extend(self.banned.iter().cloned());
        preset.config.must_have.extend(self.must_have.iter().cloned());
        if self.no_tags {
            preset.config.allowed_tags = Some(Default::default());
        } else if !self.tags.is_empty() {
            preset.config.allowed_tags = Some(self.tags.iter().cloned().collect());
        }
        if let Some(top) = self.top {
            preset.config.top_k = top;
        }
        if let Some(depth) = self.depth {
            preset.config.depth = depth;
        }
        if let Some(mode) = self.mode {
            preset.config.mode = mode;
        }
        Ok(preset)
    }
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { catalog, preset } => cmd_validate(&catalog, preset.as_deref()),
        Commands::Catalog { catalog } => cmd_catalog(&catalog),
        Commands::Candidates { request, limit } => cmd_candidates(&request, limit),
        Commands::Estimate { request } => cmd_estimate(&request),
        Commands::Search {
            request,
            json,
            history,
            sequential,
        } => cmd_search(&request, json, history.as_deref(), sequential),
    }
}

const SAMPLE_CATALOG: &str = r#"attributes: [str, dex, per, cha, str_pot, dex_pot, per_pot, cha_pot]
items:
  - name: Carrot
    slot_types: [Vegetable]
    stats: { dex: 2, dex_pot: 1 }
  - name: Red Onion
    slot_types: [Vegetable, Seasoning]
    tags: [Pungent]
    stats: { per: 2, cha: -1, per_pot: 1 }
  - name: Potato
    slot_types: [Vegetable]
    stats: { str: 1, dex: 1 }
  - name: Beef
    slot_types: [Meat]
    stats: { str: 3, per: -1, str_pot: 2 }
  - name: Chicken
    slot_types: [Meat]
    stats: { dex: 2, str: 1, dex_pot: 1 }
  - name: Boiled Egg
    slot_types: [Egg]
    stats: { str: 1, dex: 1 }
  - name: Cheddar
    slot_types: [Cheese]
    tags: [Aged]
    stats: { cha: 2, cha_pot: 1 }
  - name: Cha Leaf
    slot_types: [Seasoning]
    stats: { cha: 3, per: -3 }
  - name: Green Cha
    slot_types: [Seasoning]
    stats: { cha: 2, dex: 1 }
  - name: Salt
    slot_types: [Seasoning]
    stats: { per: 1 }
"#;

const SAMPLE_PRESET: &str = r#"name: dexterity stew
template: [Vegetable, Meat, Seasoning]
priority: [dex, dex_pot]
banned: []
must_have: []
top_k: 5
depth: 1
mode: potential_weighted
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let catalog_path = path.join("foods.yaml");
    let preset_path = path.join("preset.yaml");
    for p in [&catalog_path, &preset_path] {
        if p.exists() {
            return Err(format!("{} already exists", p.display()));
        }
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    parser::write_atomic(&catalog_path, SAMPLE_CATALOG)?;
    parser::write_atomic(&preset_path, SAMPLE_PRESET)?;

    println!("Initialized recipe workspace at {}", path.display());
    println!("  Created: {}", catalog_path.display());
    println!("  Created: {}", preset_path.display());
    Ok(())
}

fn cmd_validate(catalog_path: &Path, preset_path: Option<&Path>) -> Result<(), String> {
    let file = parser::parse_catalog_file(catalog_path)?;
    let mut errors = parser::validate_catalog(&file);
    if errors.is_empty() {
        println!(
            "OK: {} ({} attributes, {} items)",
            catalog_path.display(),
            file.attributes.len(),
            file.items.len()
        );
        if let Some(preset_path) = preset_path {
            let catalog = FoodCatalog::from_file(&file)?;
            let preset = parser::parse_preset_file(preset_path)?;
            errors = parser::validate_preset(&preset, &catalog);
            if errors.is_empty() {
                println!(
                    "OK: {} ({} slots, {} priorities)",
                    preset_path.display(),
                    preset.template.len(),
                    preset.config.priority.len()
                );
            }
        }
    }

    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn cmd_catalog(catalog_path: &Path) -> Result<(), String> {
    let catalog = parser::load_catalog(catalog_path)?;
    println!("Items: {}", catalog.len());
    println!("Attributes: {}", catalog.schema().names().join(", "));
    println!("Slot types: {}", catalog.slot_types().join(", "));
    let tags = catalog.tags();
    if tags.is_empty() {
        println!("Tags: (none)");
    } else {
        println!("Tags: {}", tags.join(", "));
    }
    Ok(())
}

/// Load the catalog and merged preset, rejecting invalid presets.
fn load_request(request: &RequestArgs) -> Result<(FoodCatalog, types::Preset), String> {
    let catalog = parser::load_catalog(&request.catalog)?;
    let preset = request.preset()?;
    let errors = parser::validate_preset(&preset, &catalog);
    if errors.is_empty() {
        return Ok((catalog, preset));
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err("invalid search request".to_string())
}

fn cmd_candidates(request: &RequestArgs, limit: usize) -> Result<(), String> {
    let (catalog, preset) = load_request(request)?;
    let slots = resolver::resolve_slots(&catalog, &preset.template, &preset.config)
        .map_err(|e| e.to_string())?;
    print!("{}", render_candidates(&catalog, &slots, &preset.config, limit));
    Ok(())
}

fn cmd_estimate(request: &RequestArgs) -> Result<(), String> {
    let (catalog, preset) = load_request(request)?;
    let slots = resolver::resolve_slots(&catalog, &preset.template, &preset.config)
        .map_err(|e| e.to_string())?;
    let depth = preset.config.depth;
    for (i, slot) in slots.iter().enumerate() {
        println!("  slot {} ({}): {} candidates", i + 1, slot.slot_type, slot.len());
    }
    println!(
        "Beam width: {}",
        search::beam_width(preset.template.len(), depth)
    );
    println!(
        "Search space at depth {}: {} combinations",
        depth,
        resolver::estimate_search_space(&slots, depth)
    );
    println!(
        "Runtime multiplier vs depth 1: ~{}x",
        resolver::depth_runtime_multiplier(depth, slots.len())
    );
    Ok(())
}

fn cmd_search(
    request: &RequestArgs,
    json: bool,
    history_path: Option<&Path>,
    sequential: bool,
) -> Result<(), String> {
    let (catalog, preset) = load_request(request)?;
    let engine = search::BeamSearch::new(&catalog).parallel(!sequential);
    let outcome = engine
        .run(&preset.template, &preset.config, &mut search::LogProgress)
        .map_err(|e| e.to_string())?;

    if let Some(path) = history_path {
        let rec = history::record(&catalog, &preset.template, &preset.config, &outcome);
        history::append_record(path, &rec)?;
    }

    if json {
        let out = serde_json::to_string_pretty(&outcome)
            .map_err(|e| format!("JSON serialize error: {}", e))?;
        println!("{}", out);
    } else {
        print!("{}", render_results(&outcome));
    }
    Ok(())
}

/// Text listing of each slot's candidates.
pub fn render_candidates(
    catalog: &FoodCatalog,
    slots: &[resolver::SlotCandidates],
    config: &types::SearchConfig,
    limit: usize,
) -> String {
    let config = config.normalized();
    let priority: Vec<usize> = config
        .priority
        .iter()
        .filter_map(|p| catalog.schema().index_of(p))
        .collect();
    let mut out = String::new();
    for (i, slot) in slots.iter().enumerate() {
        out.push_str(&format!(
            "Slot {} ({}): {} candidates\n",
            i + 1,
            slot.slot_type,
            slot.len()
        ));
        for &idx in slot.items.iter().take(limit) {
            let item = catalog.item(idx);
            let sum: f64 = priority.iter().map(|&p| item.stats()[p]).sum();
            out.push_str(&format!("  {:>6}  {}\n", sum, item.name()));
        }
        if slot.len() > limit {
            out.push_str(&format!("  ... {} more\n", slot.len() - limit));
        }
    }
    out
}

/// Text rendering of ranked results: members, XP, then non-zero stats
/// from highest to lowest with `stat * stat_pot` products.
pub fn render_results(outcome: &types::SearchOutcome) -> String {
    let mut out = String::new();
    if outcome.results.is_empty() {
        out.push_str("No valid recipes found.\n");
    }
    for r in &outcome.results {
        out.push_str(&format!("#{} {}\n", r.rank, r.members.join(", ")));
        if let Some(xp) = r.xp {
            out.push_str(&format!(
                "  Prioritized XP: {}  Non-prioritized XP: {}  Total XP: {}\n",
                xp.prioritized, xp.non_prioritized, xp.total
            ));
        }
        let mut stats: Vec<(&String, &i64)> = r.stats.iter().filter(|(_, v)| **v != 0).collect();
        stats.sort_by(|a, b| b.1.cmp(a.1));
        for (name, value) in stats {
            let pot_name = format!("{}{}", name, types::POT_SUFFIX);
            match r.stats.get(&pot_name) {
                Some(&pot) if pot != 0 => out.push_str(&format!(
                    "  {}: {} ({} * {} = {})\n",
                    name,
                    value,
                    name,
                    pot_name,
                    value * pot
                )),
                _ => out.push_str(&format!("  {}: {}\n", name, value)),
            }
        }
    }
    out.push_str(&format!(
        "\n{} combinations checked in {:.2}s ({:.0}/s); {} of {} passed filters\n",
        outcome.stats.emitted,
        outcome.stats.elapsed_seconds,
        outcome.stats.iterations_per_second(),
        outcome.stats.survivors,
        outcome.stats.final_beam
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        cmd_init(dir.path()).unwrap();
        dir
    }

    fn request(dir: &Path) -> RequestArgs {
        RequestArgs {
            catalog: dir.join("foods.yaml"),
            preset: Some(dir.join("preset.yaml")),
            ..Default::default()
        }
    }

    #[test]
    fn test_rb009_init() {
        let dir = workspace();
        assert!(dir.path().join("foods.yaml").exists());
        assert!(dir.path().join("preset.yaml").exists());
    }

    #[test]
    fn test_rb009_init_already_exists() {
        let dir = workspace();
        assert!(cmd_init(dir.path()).is_err());
    }

    #[test]
    fn test_rb009_sample_files_validate() {
        let dir = workspace();
        let preset = dir.path().join("preset.yaml");
        cmd_validate(&dir.path().join("foods.yaml"), Some(preset.as_path())).unwrap();
    }

    #[test]
    fn test_rb009_validate_invalid_preset() {
        let dir = workspace();
        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "template: []\npriority: [luck]\n").unwrap();
        let result = cmd_validate(&dir.path().join("foods.yaml"), Some(bad.as_path()));
        assert!(result.unwrap_err().contains("validation error"));
    }

    #[test]
    fn test_rb009_overrides() {
        let dir = workspace();
        let mut req = request(dir.path());
        req.slots = vec!["Meat".into()];
        req.priority = vec!["str".into()];
        req.banned = vec!["beef".into()];
        req.tags = vec!["Aged".into()];
        req.top = Some(2);
        req.depth = Some(3);
        req.mode = Some(types::CalcMode::RawSum);
        let preset = req.preset().unwrap();
        assert_eq!(preset.template.slots(), &["Meat".to_string()]);
        assert_eq!(preset.config.priority, vec!["str"]);
        assert_eq!(preset.config.banned, vec!["beef"]);
        assert_eq!(preset.config.top_k, 2);
        assert_eq!(preset.config.depth, 3);
        assert_eq!(preset.config.mode, types::CalcMode::RawSum);
        assert!(preset.config.allowed_tags.unwrap().contains("Aged"));
    }

    #[test]
    fn test_rb009_no_tags_allows_only_untagged() {
        let dir = workspace();
        let mut req = request(dir.path());
        req.slots = vec!["Seasoning".into()];
        req.no_tags = true;
        let (catalog, preset) = load_request(&req).unwrap();
        assert_eq!(preset.config.allowed_tags, Some(Default::default()));
        let slots =
            resolver::resolve_slots(&catalog, &preset.template, &preset.config).unwrap();
        let names: Vec<&str> = slots[0].items.iter().map(|&i| catalog.item(i).name()).collect();
        assert!(!names.contains(&"Red Onion"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_rb009_unused_tag_does_not_block_search() {
        let dir = workspace();
        let mut req = request(dir.path());
        req.tags = vec!["Smoked".into()];
        cmd_search(&req, false, None, true).unwrap();
    }

    #[test]
    fn test_rb009_search_writes_history() {
        let dir = workspace();
        let hist = dir.path().join("history.jsonl");
        cmd_search(&request(dir.path()), true, Some(hist.as_path()), false).unwrap();
        let records = history::read_records(&hist).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].results.is_empty());
    }

    #[test]
    fn test_rb009_search_without_preset() {
        let dir = workspace();
        let req = RequestArgs {
            catalog: dir.path().join("foods.yaml"),
            slots: vec!["Vegetable".into()],
            priority: vec!["dex".into()],
            ..Default::default()
        };
        cmd_search(&req, false, None, true).unwrap();
    }

    #[test]
    fn test_rb009_search_rejects_missing_priority() {
        let dir = workspace();
        let req = RequestArgs {
            catalog: dir.path().join("foods.yaml"),
            slots: vec!["Vegetable".into()],
            ..Default::default()
        };
        assert!(cmd_search(&req, false, None, false).is_err());
    }

    #[test]
    fn test_rb009_render_results() {
        let dir = workspace();
        let (catalog, preset) = load_request(&request(dir.path())).unwrap();
        let outcome = search::search(&catalog, &preset.template, &preset.config).unwrap();
        let text = render_results(&outcome);
        assert!(text.starts_with("#1 "));
        assert!(text.contains("Prioritized XP"));
        assert!(text.contains("dex * dex_pot"));
    }

    #[test]
    fn test_rb009_render_empty() {
        let outcome = types::SearchOutcome {
            results: vec![],
            stats: types::SearchStats::default(),
        };
        assert!(render_results(&outcome).starts_with("No valid recipes found."));
    }

    #[test]
    fn test_rb009_render_candidates_limit() {
        let dir = workspace();
        let mut req = request(dir.path());
        req.slots = vec!["Seasoning".into()];
        let (catalog, preset) = load_request(&req).unwrap();
        let slots =
            resolver::resolve_slots(&catalog, &preset.template, &preset.config).unwrap();
        let text = render_candidates(&catalog, &slots, &preset.config, 2);
        assert!(text.starts_with("Slot 1 (Seasoning): 4 candidates"));
        assert!(text.contains("... 2 more"));
    }

    #[test]
    fn test_rb009_estimate_and_catalog() {
        let dir = workspace();
        cmd_estimate(&request(dir.path())).unwrap();
        cmd_catalog(&dir.path().join("foods.yaml")).unwrap();
    }
}
