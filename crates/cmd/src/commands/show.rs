use std::path::Path;

use anyhow::{Context, Result};

use platetree::DatasetRecord;
use platetree::display::dataset_tree;

use crate::common::read_json;

pub async fn show_command(input: &Path) -> Result<()> {
    let output = show_command_as_string(input).await?;
    print!("{output}");
    Ok(())
}

/// Render a structure file, full or summary, as a tree.
pub async fn show_command_as_string(input: &Path) -> Result<String> {
    let value = read_json(input).await?;
    let record: DatasetRecord = serde_json::from_value(value)
        .with_context(|| format!("{} is not a structure file", input.display()))?;
    Ok(dataset_tree(&record).to_string())
}
