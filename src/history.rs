//! RB-010: Append-only JSONL search history with BLAKE3 fingerprints.
//!
//! A fingerprint covers the catalog contents, the template and the
//! normalized config. Identical inputs give identical fingerprints, and the
//! search is deterministic, so two records with the same fingerprint carry
//! the same ranked results.

use crate::core::catalog::FoodCatalog;
use crate::core::types::{CalcMode, RecipeTemplate, SearchConfig, SearchOutcome};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

/// One completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub ts: String,
    pub run_id: String,
    pub fingerprint: String,
    pub template: RecipeTemplate,
    pub mode: CalcMode,
    pub depth: u32,
    pub emitted: u64,
    pub elapsed_seconds: f64,
    pub results: Vec<RecordedResult>,
}

/// Compact form of a ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResult {
    pub rank: usize,
    pub members: Vec<String>,
    pub primary: f64,
}

/// BLAKE3 fingerprint of a search's inputs. Returns `"blake3:{hex}"`.
pub fn fingerprint(catalog: &FoodCatalog, template: &RecipeTemplate, config: &SearchConfig) -> String {
    let mut hasher = blake3::Hasher::new();
    for name in catalog.schema().names() {
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(b"\n");
    for item in catalog.items() {
        hasher.update(item.name().as_bytes());
        hasher.update(b"\0");
        for s in item.slot_types() {
            hasher.update(s.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\0");
        for t in item.tags() {
            hasher.update(t.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\0");
        for v in item.stats() {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        hasher.update(b"\n");
    }
    for slot in template.slots() {
        hasher.update(slot.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(b"\n");
    // Value-level serialization of the normalized config is stable
    let config = serde_json::to_string(&config.normalized()).unwrap_or_default();
    hasher.update(config.as_bytes());
    format!("blake3:{}", hasher.finalize().to_hex())
}

/// Build a record for a finished search.
pub fn record(
    catalog: &FoodCatalog,
    template: &RecipeTemplate,
    config: &SearchConfig,
    outcome: &SearchOutcome,
) -> SearchRecord {
    SearchRecord {
        ts: now_iso8601(),
        run_id: generate_run_id(),
        fingerprint: fingerprint(catalog, template, config),
        template: template.clone(),
        mode: config.mode,
        depth: config.depth,
        emitted: outcome.stats.emitted,
        elapsed_seconds: outcome.stats.elapsed_seconds,
        results: outcome
            .results
            .iter()
            .map(|r| RecordedResult {
                rank: r.rank,
                members: r.members.clone(),
                primary: r.score.primary,
            })
            .collect(),
    }
}

/// Append a record to a JSONL history file, creating it if needed.
pub fn append_record(path: &Path, record: &SearchRecord) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create history dir: {}", e))?;
        }
    }
    let json = serde_json::to_string(record).map_err(|e| format!("JSON serialize error: {}", e))?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open history {}: {}", path.display(), e))?;
    writeln!(file, "{}", json).map_err(|e| format!("write error: {}", e))?;
    Ok(())
}

/// Read every record from a history file. A missing file is empty history.
pub fn read_records(path: &Path) -> Result<Vec<SearchRecord>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open history {}: {}", path.display(), e))?;
    let mut records = Vec::new();
    for (i, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("read error: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let rec = serde_json::from_str(&line)
            .map_err(|e| format!("{} line {}: {}", path.display(), i + 1, e))?;
        records.push(rec);
    }
    Ok(records)
}

/// ISO 8601 UTC timestamp, seconds precision.
pub fn now_iso8601() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_utc(secs)
}

fn format_utc(secs: u64) -> String {
    let mut days = (secs / 86400) as i64;
    let rem = secs % 86400;

    let mut year = 1970i64;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }
    let feb = if is_leap(year) { 29 } else { 28 };
    let month_lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        days + 1,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

/// Short run identifier derived from the clock.
pub fn generate_run_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("s-{:012x}", nanos & 0xFFFF_FFFF_FFFF)
}
