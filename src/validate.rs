//! Checks export fixtures against the documented schema.
//!
//! CSV fixtures may only use documented CSV columns. JSON fixtures are walked
//! from the root collection and every key must be a documented field of the
//! object type it appears in.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::graph::RootAliases;
use crate::io::csv_file::read_headers;
use crate::model::{FieldType, Schema};

/// Documented columns and fields of a schema.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    pub csv_columns: BTreeSet<String>,
    pub json_fields: BTreeMap<String, BTreeSet<String>>,
    pub field_types: BTreeMap<(String, String), FieldType>,
    pub object_names: BTreeSet<String>,
}

impl FieldIndex {
    pub fn build(schema: &Schema) -> Self {
        let mut index = FieldIndex {
            object_names: schema.objects.iter().map(|obj| obj.name.clone()).collect(),
            ..FieldIndex::default()
        };

        for field in &schema.fields {
            if let Some(column) = &field.csv_column {
                index.csv_columns.insert(column.clone());
            }
            if let Some(name) = &field.json_name {
                if field.object.is_empty() {
                    continue;
                }
                index
                    .json_fields
                    .entry(field.object.clone())
                    .or_default()
                    .insert(name.clone());
                index
                    .field_types
                    .insert((field.object.clone(), name.clone()), field.field_type.clone());
            }
        }
        index
    }

    fn documents(&self, object: &str, field: &str) -> bool {
        self.json_fields
            .get(object)
            .is_some_and(|fields| fields.contains(field))
    }
}

/// Undocumented columns of a CSV fixture, in header order. Blank header
/// names are ignored.
pub fn validate_csv_fixture(text: &str, index: &FieldIndex) -> Result<Vec<String>> {
    let errors = read_headers(text)?
        .into_iter()
        .filter(|column| !column.trim().is_empty())
        .filter(|column| !index.csv_columns.contains(column))
        .map(|column| format!("Undocumented CSV column: '{column}'"))
        .collect();
    Ok(errors)
}

/// Undocumented fields of a JSON fixture, de-duplicated on field, object
/// type and index-free path, sorted.
pub fn validate_json_fixture(document: &Value, index: &FieldIndex, roots: &RootAliases) -> Vec<String> {
    let Some(items) = document.get(&roots.root_field).and_then(Value::as_array) else {
        return vec![format!(
            "JSON fixture missing '{}' array at root",
            roots.root_field
        )];
    };

    let mut errors: BTreeSet<(String, String, String)> = BTreeSet::new();
    for (idx, item) in items.iter().enumerate() {
        if let Value::Object(_) = item {
            let path = format!("{}[{idx}]", roots.root_field);
            validate_object(item, &roots.canonical, &path, index, roots, &mut errors);
        }
    }

    errors
        .into_iter()
        .map(|(field, object, path)| {
            format!("Undocumented field '{field}' in {object} (path: {path})")
        })
        .collect()
}

fn validate_object(
    value: &Value,
    object_type: &str,
    path: &str,
    index: &FieldIndex,
    roots: &RootAliases,
    errors: &mut BTreeSet<(String, String, String)>,
) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map {
        let current = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        // Root aliases document part of the root's fields.
        let owner = if index.documents(object_type, key) {
            Some(object_type)
        } else if object_type == roots.canonical {
            roots
                .aliases
                .iter()
                .map(String::as_str)
                .find(|alias| index.documents(alias, key))
        } else {
            None
        };
        let Some(owner) = owner else {
            errors.insert((key.clone(), object_type.to_string(), normalize_path(&current)));
            continue;
        };

        let Some(field_type) = index.field_types.get(&(owner.to_string(), key.clone())) else {
            continue;
        };
        let Some(target) = field_type.object_ref() else {
            continue;
        };
        if !index.object_names.contains(target) {
            continue;
        }

        match child {
            Value::Array(items) if field_type.repeated => {
                for (idx, item) in items.iter().enumerate() {
                    validate_object(item, target, &format!("{current}[{idx}]"), index, roots, errors);
                }
            }
            Value::Object(_) => validate_object(child, target, &current, index, roots, errors),
            _ => {}
        }
    }
}

/// Replaces every `[<digits>]` array index with `[]`.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('[') {
        normalized.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(']') {
            Some(end) if end > 0 && after[..end].bytes().all(|b| b.is_ascii_digit()) => {
                normalized.push_str("[]");
                rest = &after[end + 1..];
            }
            _ => {
                normalized.push('[');
                rest = after;
            }
        }
    }
    normalized.push_str(rest);
    normalized
}

/// Outcome of validating one fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    pub path: PathBuf,
    pub errors: Vec<String>,
}

impl FixtureReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates every `*.csv` and `*.json` fixture of `dir` (skipping
/// `*.raw.json`), CSV fixtures first, each group sorted by file name.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn validate_fixture_dir(dir: &Path, index: &FieldIndex, roots: &RootAliases) -> Result<Vec<FixtureReport>> {
    let mut csv_fixtures = Vec::new();
    let mut json_fixtures = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if name.ends_with(".csv") {
            csv_fixtures.push(path);
        } else if name.ends_with(".json") && !name.ends_with(".raw.json") {
            json_fixtures.push(path);
        }
    }
    csv_fixtures.sort();
    json_fixtures.sort();
    info!(
        csv = csv_fixtures.len(),
        json = json_fixtures.len(),
        "found fixtures"
    );

    let mut reports = Vec::new();
    for path in csv_fixtures {
        let text = fs::read_to_string(&path)?;
        let errors = validate_csv_fixture(&text, index)?;
        debug!(path = %path.display(), errors = errors.len(), "validated CSV fixture");
        reports.push(FixtureReport { path, errors });
    }
    for path in json_fixtures {
        let text = fs::read_to_string(&path)?;
        let document: Value = serde_json::from_str(&text)?;
        let errors = validate_json_fixture(&document, index, roots);
        debug!(path = %path.display(), errors = errors.len(), "validated JSON fixture");
        reports.push(FixtureReport { path, errors });
    }
    Ok(reports)
}
