//! JSON views of a dataset.
//!
//! The full view carries every node down to sites and images; the summary
//! view drops `wells` and `images` from each plate. Both are pruned of nulls
//! and empty containers, so an unset slot and an empty collection look the
//! same: absent.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::OutlineKind;
use crate::error::Result;
use crate::listing::S3Object;
use crate::model::{Batch, Dataset, Plate, Well};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetRecord {
    pub dataset_id: String,
    pub batches: Vec<BatchRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRecord {
    pub batch_id: String,
    pub platemaps: Vec<S3Object>,
    pub barcode_platemap: Option<S3Object>,
    pub plates: Vec<PlateRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateRecord {
    pub plate_id: String,
    pub backend_csv: Option<S3Object>,
    pub backend_sqlite: Option<S3Object>,
    pub load_data_with_illum: Option<S3Object>,
    pub load_data_csv: Option<S3Object>,
    /// Keyed by channel name, e.g. `IllumAGP`
    pub correction_files: BTreeMap<String, S3Object>,
    pub profiles: BTreeMap<String, S3Object>,
    pub containers: BTreeMap<String, S3Object>,
    pub wells: Vec<WellRecord>,
    pub images: Vec<S3Object>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellRecord {
    pub well_id: String,
    pub containers: BTreeMap<String, S3Object>,
    pub sites: Vec<SiteRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteRecord {
    pub site_id: String,
    pub cell_outline: Option<S3Object>,
    pub nuclei_outline: Option<S3Object>,
    pub mito_outline: Option<S3Object>,
    pub mito_obj_outline: Option<S3Object>,
    pub containers: BTreeMap<String, S3Object>,
}

/// One row of the image count report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateImageCount {
    pub dataset_id: String,
    pub batch_id: String,
    pub plate_id: String,
    pub batch_date: Option<NaiveDate>,
    pub num_images: usize,
}

fn sorted(objects: &[S3Object]) -> Vec<S3Object> {
    let mut objects = objects.to_vec();
    objects.sort();
    objects
}

fn well_record(well: &Well) -> WellRecord {
    let sites = well
        .sites()
        .map(|site| SiteRecord {
            site_id: site.id().to_string(),
            cell_outline: site.outline(OutlineKind::Cell).cloned(),
            nuclei_outline: site.outline(OutlineKind::Nuclei).cloned(),
            mito_outline: site.outline(OutlineKind::Mito).cloned(),
            mito_obj_outline: site.outline(OutlineKind::MitoObject).cloned(),
            containers: well.site_csv_files(site),
        })
        .collect();

    WellRecord {
        well_id: well.id().to_string(),
        containers: well.csv_files().to_map(),
        sites,
    }
}

fn plate_record(plate: &Plate) -> PlateRecord {
    PlateRecord {
        plate_id: plate.id().to_string(),
        backend_csv: plate.backend_csv().cloned(),
        backend_sqlite: plate.backend_sqlite().cloned(),
        load_data_with_illum: plate.load_data_with_illum().cloned(),
        load_data_csv: plate.load_data_csv().cloned(),
        correction_files: plate
            .corrections()
            .map(|(channel, obj)| (channel.to_string(), obj.clone()))
            .collect(),
        profiles: plate
            .profiles()
            .map(|(kind, obj)| (kind.to_string(), obj.clone()))
            .collect(),
        containers: plate.csv_files().to_map(),
        wells: plate.wells().map(well_record).collect(),
        images: sorted(plate.images()),
    }
}

fn batch_record(batch: &Batch) -> BatchRecord {
    BatchRecord {
        batch_id: batch.id().to_string(),
        platemaps: sorted(batch.platemaps()),
        barcode_platemap: batch.barcode_platemap().cloned(),
        plates: batch.plates().map(plate_record).collect(),
    }
}

/// Snapshot a live dataset into its full record form.
///
/// Sites see their well's CSV files for every kind they lack.
pub fn full_record(dataset: &Dataset) -> DatasetRecord {
    DatasetRecord {
        dataset_id: dataset.id().to_string(),
        batches: dataset.batches().map(batch_record).collect(),
    }
}

/// Drop wells and images from every plate.
pub fn summarize(record: &mut DatasetRecord) {
    for plate in record.batches.iter_mut().flat_map(|b| b.plates.iter_mut()) {
        plate.wells.clear();
        plate.images.clear();
    }
}

/// Remove nulls everywhere and empty objects/arrays held by objects.
///
/// Children are pruned first, so an object left empty by pruning is itself
/// removed from its parent object. Array elements are only dropped when null.
pub fn prune_empty(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                prune_empty(child);
            }
            map.retain(|_, child| !is_empty_value(child));
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prune_empty(item);
            }
            items.retain(|item| !item.is_null());
        }
        _ => {}
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn pruned_json(record: &DatasetRecord) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    prune_empty(&mut value);
    Ok(value)
}

/// The full view, ready to write as `structure_extensive.json`.
pub fn to_full_json(dataset: &Dataset) -> Result<Value> {
    pruned_json(&full_record(dataset))
}

/// The summary view, ready to write as `structure.json`.
pub fn to_summary_json(dataset: &Dataset) -> Result<Value> {
    let mut record = full_record(dataset);
    summarize(&mut record);
    pruned_json(&record)
}

/// Number of images per plate, in dataset/batch/plate order.
pub fn image_counts(dataset: &Dataset) -> Vec<PlateImageCount> {
    dataset
        .batches()
        .flat_map(|batch| {
            batch.plates().map(move |plate| PlateImageCount {
                dataset_id: dataset.id().to_string(),
                batch_id: batch.id().to_string(),
                plate_id: plate.id().to_string(),
                batch_date: batch.date(),
                num_images: plate.images().len(),
            })
        })
        .collect()
}
