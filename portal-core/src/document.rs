//! Read-modify-write helpers for the project's YAML documents.
//!
//! Documents are parsed whole into `serde_yaml::Value` so that sibling
//! settings the portal does not manage survive a round trip verbatim.
//! Only the targeted record list is touched.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Sequence, Value};

use crate::error::CoreError;

/// Insert-or-replace-by-key on an ordered record list.
///
/// If a record with the same `key_field` value exists it is replaced in
/// place, preserving its position; otherwise the new record is appended.
/// Applying the same upsert twice yields the same list as applying it
/// once.
pub fn upsert(records: &mut Sequence, key_field: &str, record: Value) {
    let key = record_key(&record, key_field).map(str::to_owned);

    let existing = key.as_deref().and_then(|k| {
        records
            .iter()
            .position(|r| record_key(r, key_field) == Some(k))
    });

    match existing {
        Some(idx) => records[idx] = record,
        None => records.push(record),
    }
}

/// Removes every record whose `key_field` equals `key`. At most one is
/// expected given the uniqueness invariant; a missing key is a no-op.
/// Returns whether anything was removed.
pub fn remove(records: &mut Sequence, key_field: &str, key: &str) -> bool {
    let before = records.len();
    records.retain(|r| record_key(r, key_field) != Some(key));
    records.len() != before
}

fn record_key<'a>(record: &'a Value, key_field: &str) -> Option<&'a str> {
    record.get(key_field).and_then(Value::as_str)
}

/// Parses a whole YAML document, requiring a mapping at the top level.
pub fn load_document(path: &Path) -> Result<Value, CoreError> {
    let content = fs::read_to_string(path)
        .map_err(|_| CoreError::Document(format!("document not found at {}", path.display())))?;
    let doc: Value = serde_yaml::from_str(&content)?;

    match doc {
        Value::Mapping(_) => Ok(doc),
        _ => Err(CoreError::Document(format!(
            "expected a mapping at the top level of {}",
            path.display()
        ))),
    }
}

pub fn write_document(path: &Path, doc: &Value) -> Result<(), CoreError> {
    let content = serde_yaml::to_string(doc)?;
    fs::write(path, content)?;
    Ok(())
}

/// Fresh platform schema document, for the first entity submission.
pub fn new_schema_document() -> Value {
    let mut map = Mapping::new();
    map.insert(Value::from("version"), Value::from(2));
    map.insert(Value::from("models"), Value::Sequence(Sequence::new()));
    Value::Mapping(map)
}

/// The `vars.client_mappings` list inside `dbt_project.yml`, created on
/// demand.
pub fn client_mappings_mut(doc: &mut Value) -> Result<&mut Sequence, CoreError> {
    let root = as_mapping_mut(doc)?;
    let vars = ensure_mapping(root, "vars");
    Ok(ensure_sequence(vars, "client_mappings"))
}

/// The `models` list of a platform schema document, created on demand.
pub fn models_mut(doc: &mut Value) -> Result<&mut Sequence, CoreError> {
    let root = as_mapping_mut(doc)?;
    Ok(ensure_sequence(root, "models"))
}

pub fn models(doc: &Value) -> Option<&Sequence> {
    doc.get("models").and_then(Value::as_sequence)
}

fn as_mapping_mut(doc: &mut Value) -> Result<&mut Mapping, CoreError> {
    doc.as_mapping_mut()
        .ok_or_else(|| CoreError::Document("document root is not a mapping".to_owned()))
}

fn ensure_mapping<'a>(map: &'a mut Mapping, key: &str) -> &'a mut Mapping {
    let k = Value::from(key);
    if !matches!(map.get(&k), Some(Value::Mapping(_))) {
        map.insert(k.clone(), Value::Mapping(Mapping::new()));
    }
    match map.get_mut(&k) {
        Some(Value::Mapping(m)) => m,
        _ => unreachable!(),
    }
}

fn ensure_sequence<'a>(map: &'a mut Mapping, key: &str) -> &'a mut Sequence {
    let k = Value::from(key);
    if !matches!(map.get(&k), Some(Value::Sequence(_))) {
        map.insert(k.clone(), Value::Sequence(Sequence::new()));
    }
    match map.get_mut(&k) {
        Some(Value::Sequence(s)) => s,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(code: &str, name: &str) -> Value {
        let mut map = Mapping::new();
        map.insert(Value::from("client_code"), Value::from(code));
        map.insert(Value::from("client_name"), Value::from(name));
        Value::Mapping(map)
    }

    #[test]
    fn upsert_appends_then_replaces_in_place() {
        let mut records = Sequence::new();
        upsert(&mut records, "client_code", record("GLOBEX", "Globex"));
        upsert(&mut records, "client_code", record("ACME", "Acme Corp"));
        upsert(&mut records, "client_code", record("WAYNE", "Wayne"));
        assert_eq!(records.len(), 3);

        // replacement keeps position
        upsert(&mut records, "client_code", record("ACME", "Acme Holdings"));
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1].get("client_name").unwrap().as_str(),
            Some("Acme Holdings")
        );
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut a = Sequence::new();
        upsert(&mut a, "client_code", record("ACME", "Acme"));
        let mut b = a.clone();
        upsert(&mut b, "client_code", record("ACME", "Acme"));
        assert_eq!(a, b);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let mut records = vec![record("ACME", "Acme")];
        assert!(!remove(&mut records, "client_code", "GLOBEX"));
        assert_eq!(records.len(), 1);
        assert!(remove(&mut records, "client_code", "ACME"));
        assert!(records.is_empty());
    }

    #[test]
    fn sibling_settings_survive_round_trip() {
        let raw = "\
name: config_driven_dbt
profile: demo
vars:
  run_started_at: '2024-01-01'
models:
  staging:
    +materialized: view
";
        let mut doc: Value = serde_yaml::from_str(raw).unwrap();
        let mappings = client_mappings_mut(&mut doc).unwrap();
        upsert(mappings, "client_code", record("ACME", "Acme"));

        let out = serde_yaml::to_string(&doc).unwrap();
        assert!(out.contains("name: config_driven_dbt"));
        assert!(out.contains("profile: demo"));
        assert!(out.contains("run_started_at:"));
        assert!(out.contains("+materialized: view"));
        assert!(out.contains("client_code: ACME"));
    }

    #[test]
    fn client_mappings_created_on_demand() {
        let mut doc: Value = serde_yaml::from_str("name: project").unwrap();
        let mappings = client_mappings_mut(&mut doc).unwrap();
        assert!(mappings.is_empty());
    }
}
