use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use arrow::datatypes::{DataType, Field, Schema};
use arrow_array::types::Date32Type;
use arrow_array::{ArrayRef, Date32Array, RecordBatch, StringArray, UInt64Array};
use serde_json::Value;

use diagnostics::*;
use platetree::{Config, LineError, PlateImageCount, Violation};

/// Load the run configuration, falling back to the built-in vocabulary.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let shown = path.display().to_string();
            debug!("Loading configuration from {shown}", shown: shown.as_str());
            Config::load(path).with_context(|| format!("Failed to load configuration {shown}"))
        }
        None => Ok(Config::default()),
    }
}

/// File name without its final extension, e.g. `source_4` for `lists/source_4.txt`.
pub fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Cannot derive a name from {}", path.display()))
}

/// `<dir>/<stem>_validated.json` next to the input tree.
pub fn validated_path(input: &Path) -> Result<PathBuf> {
    let stem = file_stem(input)?;
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{stem}_validated.json")))
}

pub async fn read_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub async fn write_json(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    let shown = path.display().to_string();
    debug!("Wrote {shown}", shown: shown.as_str());
    Ok(())
}

/// Write a record batch as CSV with a header row.
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut csv_writer = arrow_csv::WriterBuilder::new().with_header(true).build(file);
    csv_writer
        .write(batch)
        .map_err(|e| anyhow!("Failed to write CSV {}: {}", path.display(), e))?;
    let shown = path.display().to_string();
    let rows = batch.num_rows();
    debug!("Wrote {rows} rows to {shown}", rows: rows, shown: shown.as_str());
    Ok(())
}

fn utf8_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

/// `dataset_id,batch_id,plate_id,batch_date,num_images`, one row per plate.
pub fn image_counts_batch(counts: &[PlateImageCount]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("dataset_id", DataType::Utf8, false),
        Field::new("batch_id", DataType::Utf8, false),
        Field::new("plate_id", DataType::Utf8, false),
        Field::new("batch_date", DataType::Date32, true),
        Field::new("num_images", DataType::UInt64, false),
    ]);
    let dates: Date32Array = counts
        .iter()
        .map(|c| c.batch_date.map(Date32Type::from_naive_date))
        .collect();
    let images = UInt64Array::from_iter_values(counts.iter().map(|c| c.num_images as u64));
    let columns: Vec<ArrayRef> = vec![
        utf8_column(counts.iter().map(|c| c.dataset_id.as_str())),
        utf8_column(counts.iter().map(|c| c.batch_id.as_str())),
        utf8_column(counts.iter().map(|c| c.plate_id.as_str())),
        Arc::new(dates),
        Arc::new(images),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// `path,message_00`, the rejected listing lines of a run.
pub fn line_errors_batch(errors: &[LineError]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("path", DataType::Utf8, false),
        Field::new("message_00", DataType::Utf8, false),
    ]);
    let columns = vec![
        utf8_column(errors.iter().map(|e| e.line.as_str())),
        utf8_column(errors.iter().map(|e| e.message.as_str())),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// `path,message`, the schema violations that caused a removal.
pub fn violations_batch<'a>(violations: impl Iterator<Item = &'a Violation>) -> Result<RecordBatch> {
    let violations: Vec<&Violation> = violations.collect();
    let schema = Schema::new(vec![
        Field::new("path", DataType::Utf8, false),
        Field::new("message", DataType::Utf8, false),
    ]);
    let columns = vec![
        utf8_column(violations.iter().map(|v| v.path.as_str())),
        utf8_column(violations.iter().map(|v| v.message.as_str())),
    ];
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}
