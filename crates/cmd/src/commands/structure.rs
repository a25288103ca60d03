use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::BufReader;

use diagnostics::*;
use platetree::{
    Dataset, HierarchyBuilder, HierarchyRegistry, IngestReport, image_counts, ingest_reader,
    to_full_json, to_summary_json,
};

use crate::common::{
    file_stem, image_counts_batch, line_errors_batch, load_config, write_csv, write_json,
};

pub const SUMMARY_FILE: &str = "structure.json";
pub const FULL_FILE: &str = "structure_extensive.json";
pub const IMAGE_COUNTS_FILE: &str = "image_counts.csv";
pub const UNKNOWN_OBJECTS_FILE: &str = "unknown_objects.csv";

/// Build the hierarchy of one listing file and export every dataset it
/// mentions under `output_dir/<dataset_id>/`.
///
/// Rejected lines go to `unknown_objects.csv` in the directory named after the
/// listing file.
pub async fn structure_command(
    listing: &Path,
    output_dir: &Path,
    config_path: Option<&Path>,
) -> Result<IngestReport> {
    let config = load_config(config_path)?;
    let stem = file_stem(listing)?;
    let listing_name = listing.display().to_string();

    let file = tokio::fs::File::open(listing)
        .await
        .with_context(|| format!("Failed to open listing {listing_name}"))?;

    let mut registry = HierarchyRegistry::new();
    let report = {
        let mut builder = HierarchyBuilder::new(&mut registry, &config);
        ingest_reader(&mut builder, BufReader::new(file)).await?
    };

    let stem_dir = output_dir.join(&stem);
    tokio::fs::create_dir_all(&stem_dir)
        .await
        .with_context(|| format!("Failed to create {}", stem_dir.display()))?;

    if !report.is_clean() {
        let failed = report.errors.len();
        warn!(
            "{failed} lines of {listing_name} could not be placed in the hierarchy",
            failed: failed,
            listing_name: listing_name.as_str()
        );
        write_csv(
            &stem_dir.join(UNKNOWN_OBJECTS_FILE),
            &line_errors_batch(&report.errors)?,
        )?;
    }

    if !registry.contains(&stem) {
        warn!(
            "Could not parse any line from {listing_name} file",
            listing_name: listing_name.as_str()
        );
    }

    for dataset in registry.datasets() {
        if dataset.id() != stem {
            let dataset_id = dataset.id();
            info!(
                "Listing {listing_name} also holds dataset {dataset_id}",
                listing_name: listing_name.as_str(),
                dataset_id: dataset_id
            );
        }
        export_dataset(dataset, output_dir).await?;
    }

    registry.clear();
    Ok(report)
}

async fn export_dataset(dataset: &Dataset, output_dir: &Path) -> Result<()> {
    let dir = output_dir.join(dataset.id());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    write_json(&dir.join(SUMMARY_FILE), &to_summary_json(dataset)?).await?;
    write_json(&dir.join(FULL_FILE), &to_full_json(dataset)?).await?;

    let counts = image_counts(dataset);
    write_csv(&dir.join(IMAGE_COUNTS_FILE), &image_counts_batch(&counts)?)?;

    let dataset_id = dataset.id();
    let plates = counts.len();
    info!(
        "Exported dataset {dataset_id} with {plates} plates",
        dataset_id: dataset_id,
        plates: plates
    );
    Ok(())
}
