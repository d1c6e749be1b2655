//! # Table Module
//!
//! The tabular working representation of the export pipeline. Spotify answers
//! with nested JSON; every query kind ends up as a [`Table`] of scalar cells
//! before it is written to CSV.
//!
//! ## Building Blocks
//!
//! - [`flatten`] - turns raw records into a projected, renamed [`Table`]
//! - [`split`] - primary/other splitting of list-valued cells
//! - [`enrich`] - batched feature lookup merged back into a [`Table`]
//!
//! Cells are plain [`serde_json::Value`]s. After the parsers have run, every
//! cell is a scalar (null, bool, number or string).

mod enrich;
mod flatten;
mod split;

use std::collections::{HashMap, HashSet};

use serde_json::Value;

pub use enrich::{Enrichment, FEATURE_BATCH_SIZE, FeatureEndpoint, enrich};
pub use flatten::{RANK_FIELD, flatten, flatten_record};
pub use split::{split_primary_other, unfold_list_column};

/// Ordered projection of dotted source paths onto destination column names.
///
/// The pairs define both which fields survive flattening and how they are
/// renamed. `identity` names the source path whose null value drops a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub columns: &'static [(&'static str, &'static str)],
    pub identity: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn new(columns: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            columns,
            identity: None,
        }
    }

    pub const fn with_identity(self, path: &'static str) -> Self {
        Self {
            columns: self.columns,
            identity: Some(path),
        }
    }

    pub fn destinations(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|(_, destination)| *destination)
    }
}

/// Uniform-column, ordered rows of JSON scalars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All values of a column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Appends a row; short rows are padded with nulls, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Replaces every cell of `name` with `f(cell)`. Returns `false` when the
    /// column does not exist.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Sets (or replaces) a column from per-row values.
    pub fn add_column(&mut self, name: &str, mut values: Vec<Value>) {
        values.resize(self.rows.len(), Value::Null);
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    pub fn set_constant(&mut self, name: &str, value: Value) {
        let values = vec![value; self.rows.len()];
        self.add_column(name, values);
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Keeps the first row for every distinct `key` value. Rows with a null
    /// key are left alone.
    pub fn dedup_by(&mut self, key: &str) {
        let Some(idx) = self.column_index(key) else {
            return;
        };
        let mut seen = HashSet::new();
        self.rows
            .retain(|row| row[idx].is_null() || seen.insert(cell_text(&row[idx])));
    }

    /// Appends the rows of `other`, widening the column set when needed.
    pub fn append(&mut self, other: Table) {
        for column in &other.columns {
            if !self.has_column(column) {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
            }
        }

        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();

        for mut row in other.rows {
            let mapped = mapping
                .iter()
                .map(|src| match src {
                    Some(i) => std::mem::take(&mut row[*i]),
                    None => Value::Null,
                })
                .collect();
            self.rows.push(mapped);
        }
    }

    pub fn concat(tables: Vec<Table>) -> Table {
        let mut iter = tables.into_iter();
        let Some(mut first) = iter.next() else {
            return Table::default();
        };
        for table in iter {
            first.append(table);
        }
        first
    }

    /// Outer join on `key`.
    ///
    /// # Arguments
    ///
    /// * `other` - Table providing the extra columns, expected to be unique
    ///   on `key`; the first match wins otherwise
    /// * `key` - Column present in both tables
    ///
    /// # Returns
    ///
    /// A table with the columns of `self` followed by the non-key columns of
    /// `other` it did not already have. Base rows keep their order and receive
    /// the matching values (null when unmatched). Rows of `other` that match no
    /// base row are appended afterwards with the base columns null. Null keys
    /// never match.
    ///
    /// When either table lacks `key`, `self` is returned unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// let mut base = Table::new(vec!["track_id".into(), "track_name".into()]);
    /// base.push_row(vec![json!("t1"), json!("Song")]);
    /// let mut features = Table::new(vec!["track_id".into(), "track_energy".into()]);
    /// features.push_row(vec![json!("t1"), json!(0.8)]);
    ///
    /// let joined = base.outer_join(features, "track_id");
    /// assert_eq!(joined.get(0, "track_energy"), Some(&json!(0.8)));
    /// ```
    pub fn outer_join(self, other: Table, key: &str) -> Table {
        let (Some(base_key), Some(other_key)) = (self.column_index(key), other.column_index(key))
        else {
            return self;
        };

        let extra: Vec<usize> = (0..other.columns.len())
            .filter(|&i| i != other_key && !self.has_column(&other.columns[i]))
            .collect();

        let base_width = self.columns.len();
        let mut columns = self.columns;
        columns.extend(extra.iter().map(|&i| other.columns[i].clone()));

        let mut lookup: HashMap<String, usize> = HashMap::new();
        for (i, row) in other.rows.iter().enumerate() {
            if !row[other_key].is_null() {
                lookup.entry(cell_text(&row[other_key])).or_insert(i);
            }
        }

        let mut matched = vec![false; other.rows.len()];
        let mut rows = Vec::with_capacity(self.rows.len());
        for mut row in self.rows {
            let hit = match &row[base_key] {
                Value::Null => None,
                value => lookup.get(&cell_text(value)).copied(),
            };
            match hit {
                Some(i) => {
                    matched[i] = true;
                    row.extend(extra.iter().map(|&c| other.rows[i][c].clone()));
                }
                None => row.extend(std::iter::repeat_n(Value::Null, extra.len())),
            }
            rows.push(row);
        }

        for (i, other_row) in other.rows.into_iter().enumerate() {
            if matched[i] || other_row[other_key].is_null() {
                continue;
            }
            let mut row = vec![Value::Null; base_width];
            row[base_key] = other_row[other_key].clone();
            row.extend(extra.iter().map(|&c| other_row[c].clone()));
            rows.push(row);
        }

        Table { columns, rows }
    }
}

/// Text form of a cell: strings raw, null empty, everything else as JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
