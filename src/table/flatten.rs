use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Res, error::ExportError};

use super::{ColumnSpec, Table};

/// Source path under which the 1-based rank of a record is available.
pub const RANK_FIELD: &str = "index";

/// Flattens nested objects into dotted paths. Lists and scalars are leaves;
/// a non-object record yields no fields at all.
pub fn flatten_record(record: &Value) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();
    if let Value::Object(map) = record {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut fields);
        }
    }
    fields
}

fn flatten_into(path: String, value: &Value, fields: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_into(format!("{path}.{key}"), nested, fields);
            }
        }
        other => {
            fields.insert(path, other.clone());
        }
    }
}

/// Converts a response (or a list of records) into a projected [`Table`].
///
/// # Arguments
///
/// * `data` - Raw response body, a list of records or a single record
/// * `spec` - Source paths to keep, their column names and the identity path
/// * `result_key` - Field of `data` holding the records, if any
///
/// # Behavior
///
/// Rows whose identity path is null are dropped before ranks are assigned,
/// so the `index` rank stays contiguous and 1-based. A path missing from
/// some rows yields null in those rows.
///
/// # Errors
///
/// [`ExportError::MissingField`] when `result_key` is absent from `data`, or
/// when a source path is missing from every row of a non-empty result.
pub fn flatten(data: &Value, spec: &ColumnSpec, result_key: Option<&str>) -> Res<Table> {
    let selected = match result_key {
        Some(key) => data
            .get(key)
            .ok_or_else(|| ExportError::MissingField(key.to_string()))?,
        None => data,
    };

    let records: Vec<&Value> = match selected {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        single => vec![single],
    };

    let mut flat: Vec<BTreeMap<String, Value>> = records
        .into_iter()
        .map(flatten_record)
        .filter(|fields| match spec.identity {
            Some(path) => fields.get(path).is_some_and(|v| !v.is_null()),
            None => true,
        })
        .collect();

    for (position, fields) in flat.iter_mut().enumerate() {
        fields.insert(RANK_FIELD.to_string(), Value::from(position as u64 + 1));
    }

    if !flat.is_empty() {
        if let Some((path, _)) = spec
            .columns
            .iter()
            .find(|(path, _)| flat.iter().all(|fields| !fields.contains_key(*path)))
        {
            return Err(ExportError::MissingField(path.to_string()));
        }
    }

    let mut table = Table::new(spec.destinations().map(String::from).collect());
    for fields in flat {
        let row = spec
            .columns
            .iter()
            .map(|(path, _)| fields.get(*path).cloned().unwrap_or(Value::Null))
            .collect();
        table.push_row(row);
    }

    Ok(table)
}
