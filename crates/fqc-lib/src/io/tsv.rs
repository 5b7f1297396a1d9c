use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use log::warn;
use std::path::Path;

/// A tab-separated file with a header row, kept as strings.
#[derive(Debug, Clone)]
pub struct TsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TsvTable {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }
}

/// Read a BIDS-style TSV. A file without data rows is an error; a comma in
/// the first header cell usually means the wrong delimiter, which is
/// reported as a warning while the rows are still returned.
pub fn read_tsv(path: &Path) -> Result<TsvTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(Trim::All)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("parsing row {} of {}", idx + 1, path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    if rows.is_empty() {
        bail!("{} is empty or not a tab separated file", path.display());
    }
    if headers.first().is_some_and(|name| name.contains(',')) {
        warn!(
            "{} may not be tab separated, please check the input",
            path.display()
        );
    }
    Ok(TsvTable { headers, rows })
}
