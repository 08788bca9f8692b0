use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use polars::prelude::*;
use std::path::PathBuf;

use super::{ExportSink, ExportTable};

/// Local fallback sink: one CSV file per sheet name, overwritten on every export.
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvSink { dir: dir.into() }
    }

    /// Always a direct child of the export directory, whatever the category text held.
    pub fn path_for(&self, sheet_name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", file_stem(sheet_name)))
    }
}

fn file_stem(sheet_name: &str) -> String {
    sheet_name
        .replace("..", "_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

fn table_to_dataframe(table: &ExportTable) -> Result<DataFrame> {
    let mut series_vec = Vec::with_capacity(table.headers.len());

    for (idx, header) in table.headers.iter().enumerate() {
        let values: Vec<String> = table
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect();

        let series = Series::new(header.as_str().into(), values);
        series_vec.push(series.into());
    }

    DataFrame::new(series_vec).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
}

#[async_trait]
impl ExportSink for CsvSink {
    async fn write_table(&self, sheet_name: &str, table: &ExportTable) -> Result<String> {
        let mut df = table_to_dataframe(table)?;

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create export directory {}", self.dir.display()))?;

        let path = self.path_for(sheet_name);
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file).finish(&mut df)?;

        Ok(path.display().to_string())
    }
}
