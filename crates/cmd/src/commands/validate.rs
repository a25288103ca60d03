// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use diagnostics::*;
use platetree::{RepairReport, SchemaRepairer};

use crate::common::{read_json, validated_path, violations_batch, write_csv, write_json};

pub const AUDIT_FILE: &str = "invalid_elements.csv";

/// Repair a full structure file against `schema` and write the result.
///
/// The output defaults to `<stem>_validated.json` beside the input. When
/// anything was removed, the violations are listed in `invalid_elements.csv`
/// next to the output.
pub async fn validate_command(
    input: &Path,
    output: Option<&Path>,
    schema: &Path,
) -> Result<RepairReport> {
    let schema_value = read_json(schema).await?;
    let repairer = SchemaRepairer::new(&schema_value)
        .with_context(|| format!("Unusable schema {}", schema.display()))?;

    let mut tree = read_json(input).await?;
    let input_name = input.display().to_string();
    let report = repairer
        .repair(&mut tree)
        .with_context(|| format!("{input_name} cannot be repaired"))?;

    let output: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => validated_path(input)?,
    };
    write_json(&output, &tree).await?;

    if !report.is_empty() {
        let audit = output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(AUDIT_FILE);
        write_csv(&audit, &violations_batch(report.audit())?)?;

        let plates = report.plates.len();
        let batches = report.batches.len();
        warn!(
            "Removed {plates} plates and {batches} batches from {input_name}",
            plates: plates,
            batches: batches,
            input_name: input_name.as_str()
        );
    }

    Ok(report)
}
