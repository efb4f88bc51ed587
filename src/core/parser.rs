//! RB-004: Catalog and preset parsing, saving, and validation.
//!
//! Files are YAML unless the extension is `.json`. Validation collects every
//! problem instead of stopping at the first:
//! - Catalog: attribute list non-empty and unique, item names unique,
//!   every item fills at least one slot type, stats finite and known
//! - Preset: template length, priority attributes known, slot types fillable,
//!   top_k and depth in range

use super::catalog::FoodCatalog;
use super::types::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn err(message: String) -> ValidationError {
    ValidationError { message }
}

/// Serialization format, chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

fn read(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

/// Parse a catalog file from disk.
pub fn parse_catalog_file(path: &Path) -> Result<CatalogFile, String> {
    parse_catalog(&read(path)?, FileFormat::from_path(path))
}

/// Parse a catalog from a string.
pub fn parse_catalog(content: &str, format: FileFormat) -> Result<CatalogFile, String> {
    match format {
        FileFormat::Yaml => serde_yaml_ng::from_str(content)
            .map_err(|e| format!("catalog YAML parse error: {}", e)),
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|e| format!("catalog JSON parse error: {}", e)),
    }
}

/// Parse and validate a catalog file, returning the built catalog.
pub fn load_catalog(path: &Path) -> Result<FoodCatalog, String> {
    let file = parse_catalog_file(path)?;
    FoodCatalog::from_file(&file).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parse a preset file from disk.
pub fn parse_preset_file(path: &Path) -> Result<Preset, String> {
    parse_preset(&read(path)?, FileFormat::from_path(path))
}

/// Parse a preset from a string.
pub fn parse_preset(content: &str, format: FileFormat) -> Result<Preset, String> {
    match format {
        FileFormat::Yaml => serde_yaml_ng::from_str(content)
            .map_err(|e| format!("preset YAML parse error: {}", e)),
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|e| format!("preset JSON parse error: {}", e)),
    }
}

/// Serialize any file-facing value in the given format.
pub fn to_string<T: serde::Serialize>(value: &T, format: FileFormat) -> Result<String, String> {
    match format {
        FileFormat::Yaml => {
            serde_yaml_ng::to_string(value).map_err(|e| format!("serialize error: {}", e))
        }
        FileFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| format!("serialize error: {}", e))
        }
    }
}

/// Save a preset atomically (write to temp, then rename).
pub fn save_preset(path: &Path, preset: &Preset) -> Result<(), String> {
    let content = to_string(preset, FileFormat::from_path(path))?;
    write_atomic(path, &content)
}

/// Write a file atomically (temp file + rename), creating parent dirs.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp);
    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })
}

/// Validate a parsed catalog. Returns a list of errors (empty = valid).
pub fn validate_catalog(file: &CatalogFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if file.attributes.is_empty() {
        errors.push(err("catalog declares no attributes".to_string()));
    }
    let mut attrs = HashSet::new();
    for a in &file.attributes {
        if a.trim().is_empty() {
            errors.push(err("attribute names must not be empty".to_string()));
        } else if !attrs.insert(a.as_str()) {
            errors.push(err(format!("duplicate attribute '{}'", a)));
        }
    }

    let mut names = HashSet::new();
    for (i, item) in file.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            errors.push(err(format!("item #{} has an empty name", i + 1)));
            continue;
        }
        if !names.insert(item.name.as_str()) {
            errors.push(err(format!("duplicate item '{}'", item.name)));
        }
        if item.slot_types.iter().all(|s| s.trim().is_empty()) {
            errors.push(err(format!("item '{}' fills no slot type", item.name)));
        }
        for (attr, value) in &item.stats {
            if !attrs.contains(attr.as_str()) {
                errors.push(err(format!(
                    "item '{}' has unknown attribute '{}'",
                    item.name, attr
                )));
            }
            if !value.is_finite() {
                errors.push(err(format!(
                    "item '{}' has non-finite value for '{}'",
                    item.name, attr
                )));
            }
        }
    }

    errors
}

/// Validate a preset against a catalog. Returns a list of errors (empty = valid).
pub fn validate_preset(preset: &Preset, catalog: &FoodCatalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let template = &preset.template;
    let config = preset.config.normalized();

    if template.is_empty() {
        errors.push(err("template must have at least one slot".to_string()));
    }
    if template.len() > MAX_SLOTS {
        errors.push(err(format!(
            "template has {} slots; at most {} are supported",
            template.len(),
            MAX_SLOTS
        )));
    }
    let known_types = catalog.slot_types();
    for (i, slot) in template.slots().iter().enumerate() {
        if !known_types.contains(slot) {
            errors.push(err(format!(
                "slot {} ('{}') is not filled by any catalog item",
                i + 1,
                slot
            )));
        }
    }

    if config.priority.is_empty() {
        errors.push(err("at least one priority attribute is required".to_string()));
    }
    for p in &config.priority {
        if catalog.schema().index_of(p).is_none() {
            errors.push(err(format!("unknown priority attribute '{}'", p)));
        }
    }

    if config.top_k == 0 {
        errors.push(err("top_k must be at least 1".to_string()));
    }
    if !(MIN_DEPTH..=MAX_DEPTH).contains(&config.depth) {
        errors.push(err(format!(
            "depth must be between {} and {}, got {}",
            MIN_DEPTH, MAX_DEPTH, config.depth
        )));
    }

    // An allowed tag no item carries has no effect on eligibility
    if let Some(allowed) = &config.allowed_tags {
        let known = catalog.tags();
        for tag in allowed.iter().filter(|t| !known.contains(t)) {
            warn!(tag = %tag, "allowed tag is not used by any item");
        }
    }

    errors
}
