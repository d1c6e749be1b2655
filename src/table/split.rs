use serde_json::Value;

use super::{Table, cell_text};

/// Splits a list into its first element and the remaining elements joined
/// with `", "`. The input slice is only read.
///
/// # Example
///
/// ```
/// let (primary, others) = split_primary_other(&[json!("A"), json!("B"), json!("C")]);
/// assert_eq!(primary, Some(json!("A")));
/// assert_eq!(others, "B, C");
/// ```
pub fn split_primary_other(items: &[Value]) -> (Option<Value>, String) {
    match items.split_first() {
        Some((primary, others)) => (
            Some(primary.clone()),
            others.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        ),
        None => (None, String::new()),
    }
}

/// Replaces the list-valued column `key` with `singular` and
/// `{singular}_others`. Cells that are not lists become nulls in both.
pub fn unfold_list_column(table: &mut Table, key: &str, singular: &str) {
    let Some(values) = table.column(key) else {
        return;
    };

    let (primaries, others): (Vec<Value>, Vec<Value>) = values
        .into_iter()
        .map(|value| match value {
            Value::Array(items) => {
                let (primary, others) = split_primary_other(items);
                (primary.unwrap_or(Value::Null), Value::String(others))
            }
            _ => (Value::Null, Value::Null),
        })
        .unzip();

    table.add_column(singular, primaries);
    table.add_column(&format!("{singular}_others"), others);
    table.drop_column(key);
}
