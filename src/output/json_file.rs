//! Local JSON results file

use crate::extract::ExtractedProduct;
use crate::output::OutputResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ResultsFile<'a> {
    results: &'a [ExtractedProduct],
}

/// Writes `{"results": [...]}` to `path`, replacing any existing file
///
/// # Arguments
///
/// * `path` - Destination file; parent directories must exist
/// * `products` - Records to write, in the given order
pub fn save_results(path: &Path, products: &[ExtractedProduct]) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ResultsFile { results: products })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Results file configured for a run
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, products: &[ExtractedProduct]) -> OutputResult<()> {
        save_results(&self.path, products)?;
        tracing::info!(
            "Wrote {} products to {}",
            products.len(),
            self.path.display()
        );
        Ok(())
    }
}
