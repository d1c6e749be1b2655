use std::path::Path;

use crate::{
    Res,
    table::{Table, cell_text},
};

/// Encodes a table as UTF-8 CSV: one header row with the column names, one
/// record per row, nulls as empty fields.
pub fn to_csv(table: &Table) -> Res<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !table.columns().is_empty() {
        writer.write_record(table.columns())?;
    }
    for row in table.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Writes `table` to `path`, creating parent directories as needed.
pub async fn write_csv(table: &Table, path: &Path) -> Res<()> {
    let bytes = to_csv(table)?;
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    async_fs::write(path, bytes).await?;
    Ok(())
}
