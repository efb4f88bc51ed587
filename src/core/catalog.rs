//! RB-003: Food catalog — immutable items with dense stat vectors.
//!
//! The catalog is built once from a [`CatalogFile`]. Attribute names are
//! resolved to indices here so the search only does index arithmetic.

use super::error::SearchError;
use super::parser;
use super::types::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Ordered attribute names with a name→index lookup.
#[derive(Debug, Clone, Default)]
pub struct AttributeSchema {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl AttributeSchema {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of `<name>_pot`, if that dimension exists.
    pub fn pot_index(&self, name: &str) -> Option<usize> {
        self.index_of(&format!("{}{}", name, POT_SUFFIX))
    }

    /// Resolve attribute names, failing on the first unknown one.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<usize>, SearchError> {
        names
            .iter()
            .map(|n| {
                self.index_of(n).ok_or_else(|| {
                    SearchError::invalid(format!("unknown attribute '{}'", n))
                })
            })
            .collect()
    }
}

/// The in-memory catalog.
#[derive(Debug, Clone)]
pub struct FoodCatalog {
    schema: AttributeSchema,
    items: Vec<CatalogItem>,
    by_name: FxHashMap<String, usize>,
}

impl FoodCatalog {
    /// Build from a parsed catalog file after validating it.
    pub fn from_file(file: &CatalogFile) -> Result<Self, String> {
        let errors = parser::validate_catalog(file);
        if !errors.is_empty() {
            return Err(format!(
                "{} catalog error(s): {}",
                errors.len(),
                errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ));
        }

        let schema = AttributeSchema::new(&file.attributes);
        let items = file
            .items
            .iter()
            .map(|rec| {
                let mut stats = vec![0.0; schema.len()];
                for (attr, value) in &rec.stats {
                    if let Some(i) = schema.index_of(attr) {
                        stats[i] = *value;
                    }
                }
                CatalogItem::new(&rec.name, &rec.slot_types, &rec.tags, stats)
            })
            .collect();
        Self::from_parts(schema, items)
    }

    /// Assemble from an already-dense schema and item list.
    ///
    /// Every item's stat vector must match the schema length and item names
    /// must be unique.
    pub fn from_parts(schema: AttributeSchema, items: Vec<CatalogItem>) -> Result<Self, String> {
        let mut by_name = FxHashMap::default();
        for (i, item) in items.iter().enumerate() {
            if item.stats().len() != schema.len() {
                return Err(format!(
                    "item '{}' has {} stats; the catalog declares {} attributes",
                    item.name(),
                    item.stats().len(),
                    schema.len()
                ));
            }
            if by_name.insert(item.name().to_string(), i).is_some() {
                return Err(format!("duplicate item '{}'", item.name()));
            }
        }
        Ok(Self {
            schema,
            items,
            by_name,
        })
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> &CatalogItem {
        &self.items[index]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&CatalogItem> {
        self.by_name.get(name).map(|&i| &self.items[i])
    }

    /// Every slot type any item can fill, sorted.
    pub fn slot_types(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|i| i.slot_types().iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Every tag used by any item, sorted.
    pub fn tags(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|i| i.tags().iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogFile {
        serde_yaml_ng::from_str(
            r#"
attributes: [dex, str, dex_pot]
items:
  - name: Carrot
    slot_types: [Veg]
    tags: [Sweet]
    stats: { dex: 3, dex_pot: 2 }
  - name: Beef
    slot_types: [Meat]
    stats: { str: 4 }
  - name: Cha Leaf
    slot_types: [Veg, Seasoning]
    tags: [Bitter]
    stats: { dex: 1 }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rb003_from_file_dense_stats() {
        let cat = FoodCatalog::from_file(&sample()).unwrap();
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.find("Carrot").unwrap().stats(), &[3.0, 0.0, 2.0]);
        assert_eq!(cat.find("Beef").unwrap().stats(), &[0.0, 4.0, 0.0]);
        assert!(cat.find("Tofu").is_none());
    }

    #[test]
    fn test_rb003_schema_lookup() {
        let cat = FoodCatalog::from_file(&sample()).unwrap();
        let schema = cat.schema();
        assert_eq!(schema.index_of("str"), Some(1));
        assert_eq!(schema.pot_index("dex"), Some(2));
        assert_eq!(schema.pot_index("str"), None);
        assert!(schema.resolve(&["dex".into(), "luck".into()]).is_err());
    }

    #[test]
    fn test_rb003_universes_sorted() {
        let cat = FoodCatalog::from_file(&sample()).unwrap();
        assert_eq!(cat.slot_types(), vec!["Meat", "Seasoning", "Veg"]);
        assert_eq!(cat.tags(), vec!["Bitter", "Sweet"]);
    }

    #[test]
    fn test_rb003_from_file_rejects_invalid() {
        let mut file = sample();
        file.items[1].name = "Carrot".to_string();
        let err = FoodCatalog::from_file(&file).unwrap_err();
        assert!(err.contains("duplicate item"));
    }

    #[test]
    fn test_rb003_from_parts_rejects_short_vector() {
        let veg = vec!["Veg".to_string()];
        let err = FoodCatalog::from_parts(
            AttributeSchema::new(&["dex", "str"]),
            vec![CatalogItem::new("Carrot", &veg, &[], vec![5.0])],
        )
        .unwrap_err();
        assert!(err.contains("'Carrot' has 1 stats"));
    }

    #[test]
    fn test_rb003_from_parts_rejects_duplicate_names() {
        let veg = vec!["Veg".to_string()];
        let err = FoodCatalog::from_parts(
            AttributeSchema::new(&["dex"]),
            vec![
                CatalogItem::new("Carrot", &veg, &[], vec![5.0]),
                CatalogItem::new("Carrot", &veg, &[], vec![1.0]),
            ],
        )
        .unwrap_err();
        assert!(err.contains("duplicate item 'Carrot'"));
    }
}
