//! Caller-owned registry of every dataset seen during one run.
//!
//! The builder borrows the registry mutably for the duration of ingestion;
//! get-or-create lookups always return the same node, so later lines augment
//! nodes created by earlier ones regardless of input order.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{Batch, Dataset, Plate, Site, Well, WellId};

#[derive(Debug, Default)]
pub struct HierarchyRegistry {
    datasets: BTreeMap<String, Dataset>,
}

impl HierarchyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the dataset, creating it on first reference.
    pub fn dataset_mut(&mut self, dataset_id: &str) -> &mut Dataset {
        self.datasets
            .entry(dataset_id.to_string())
            .or_insert_with(|| Dataset::new(dataset_id))
    }

    /// Create a batch under a dataset; fails if the batch already exists.
    pub fn add_batch(&mut self, dataset_id: &str, batch_id: &str) -> Result<&mut Batch> {
        self.dataset_mut(dataset_id).add_batch(batch_id)
    }

    pub fn batch_mut(&mut self, dataset_id: &str, batch_id: &str) -> &mut Batch {
        self.dataset_mut(dataset_id).batch_mut(batch_id)
    }

    /// Ids are checked before the dataset and batch are created, so a
    /// rejected plate leaves no empty parents behind.
    pub fn plate_mut(
        &mut self,
        dataset_id: &str,
        batch_id: &str,
        plate_id: &str,
    ) -> Result<&mut Plate> {
        Batch::check_plate_id(plate_id)?;
        self.batch_mut(dataset_id, batch_id).plate_mut(plate_id)
    }

    pub fn well_mut(
        &mut self,
        dataset_id: &str,
        batch_id: &str,
        plate_id: &str,
        well_id: &str,
    ) -> Result<&mut Well> {
        WellId::parse(well_id)?;
        self.plate_mut(dataset_id, batch_id, plate_id)?
            .well_mut(well_id)
    }

    pub fn site_mut(
        &mut self,
        dataset_id: &str,
        batch_id: &str,
        plate_id: &str,
        well_id: &str,
        site_id: &str,
    ) -> Result<&mut Site> {
        Ok(self
            .well_mut(dataset_id, batch_id, plate_id, well_id)?
            .site_mut(site_id))
    }

    pub fn get(&self, dataset_id: &str) -> Option<&Dataset> {
        self.datasets.get(dataset_id)
    }

    pub fn contains(&self, dataset_id: &str) -> bool {
        self.datasets.contains_key(dataset_id)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }

    pub fn dataset_ids(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    /// Remove one dataset from the registry, handing ownership to the caller.
    pub fn take(&mut self, dataset_id: &str) -> Option<Dataset> {
        self.datasets.remove(dataset_id)
    }

    /// Release every dataset; the registry is ready for an independent run.
    pub fn clear(&mut self) {
        self.datasets.clear();
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
