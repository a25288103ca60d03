//! The live hierarchy: dataset → batch → plate → well → site.
//!
//! Nodes are created on first reference and mutated in place as later lines
//! attach more resources. Every single-valued slot accepts exactly one
//! assignment; the append-only lists (images, platemaps, metadata) accept
//! duplicates.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::category::{Channel, OutlineKind, ProfileKind};
use crate::config::{CSV_EXTENSIONS, Config};
use crate::error::{Error, Result};
use crate::listing::{S3Object, extract_date};

static WELL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{1,2}[0-9]{2}$").expect("valid regex"));

/// Fill a single-valued slot, refusing a second assignment.
fn assign(slot: &mut Option<S3Object>, name: &str, obj: S3Object) -> Result<()> {
    match slot {
        Some(existing) => Err(Error::duplicate(name, &existing.path, &obj.path)),
        None => {
            *slot = Some(obj);
            Ok(())
        }
    }
}

/// Insert into a keyed slot map, refusing a second assignment per key.
fn assign_keyed<K: Ord + fmt::Display>(
    slots: &mut BTreeMap<K, S3Object>,
    key: K,
    obj: S3Object,
) -> Result<()> {
    match slots.entry(key) {
        Entry::Occupied(entry) => Err(Error::duplicate(
            entry.key().to_string(),
            &entry.get().path,
            &obj.path,
        )),
        Entry::Vacant(entry) => {
            entry.insert(obj);
            Ok(())
        }
    }
}

/// A well position: one or two row letters and a two-digit column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WellId(String);

impl WellId {
    pub fn is_valid(id: &str) -> bool {
        WELL_ID.is_match(id)
    }

    pub fn parse(id: &str) -> Result<Self> {
        if Self::is_valid(id) {
            Ok(WellId(id.to_string()))
        } else {
            Err(Error::path_format(format!("Invalid Well Name {id}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Analysis CSV files owned by a plate, well or site, one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisCsvFiles {
    files: BTreeMap<String, S3Object>,
}

impl AnalysisCsvFiles {
    /// The analysis CSV kind of a path: extension `csv` or `csv.gz`, and a
    /// `<kind>.<ext>` suffix from the configured vocabulary.
    pub fn classify<'c>(path: &str, config: &'c Config) -> Result<&'c str> {
        if !CSV_EXTENSIONS
            .iter()
            .any(|ext| path.ends_with(&format!(".{ext}")))
        {
            return Err(Error::path_format(format!(
                "Invalid extension for a CSV file: {path}"
            )));
        }
        config
            .analysis_csv_kind(path)
            .ok_or_else(|| Error::unknown_category("csv_file in analysis folder", path))
    }

    /// Attach a CSV file of an already classified kind.
    pub fn insert(&mut self, kind: &str, obj: S3Object) -> Result<()> {
        assign_keyed(&mut self.files, kind.to_string(), obj)
    }

    pub fn get(&self, kind: &str) -> Option<&S3Object> {
        self.files.get(kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &S3Object)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// This container's files, with any kind it lacks taken from `fallback`.
    pub fn with_fallback(&self, fallback: &AnalysisCsvFiles) -> BTreeMap<String, S3Object> {
        let mut merged = fallback.files.clone();
        merged.extend(self.files.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn to_map(&self) -> BTreeMap<String, S3Object> {
        self.files.clone()
    }
}

/// All data from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: String,
    metadata: Vec<S3Object>,
    batches: BTreeMap<String, Batch>,
}

impl Dataset {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            metadata: Vec::new(),
            batches: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create a batch; the id must not exist yet.
    pub fn add_batch(&mut self, batch_id: &str) -> Result<&mut Batch> {
        match self.batches.entry(batch_id.to_string()) {
            Entry::Occupied(_) => Err(Error::path_format(format!(
                "Batch already exists: {batch_id}"
            ))),
            Entry::Vacant(entry) => Ok(entry.insert(Batch::new(batch_id))),
        }
    }

    /// Get the batch, creating it on first reference.
    pub fn batch_mut(&mut self, batch_id: &str) -> &mut Batch {
        self.batches
            .entry(batch_id.to_string())
            .or_insert_with(|| Batch::new(batch_id))
    }

    pub fn batch(&self, batch_id: &str) -> Option<&Batch> {
        self.batches.get(batch_id)
    }

    pub fn has_batch(&self, batch_id: &str) -> bool {
        self.batches.contains_key(batch_id)
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    pub fn add_metadata(&mut self, obj: S3Object) {
        self.metadata.push(obj);
    }

    pub fn metadata(&self) -> &[S3Object] {
        &self.metadata
    }

    /// Remove all batches and metadata.
    pub fn clear(&mut self) {
        self.batches.clear();
        self.metadata.clear();
    }
}

/// Plates captured under one experimental run.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    id: String,
    date: Option<NaiveDate>,
    plates: BTreeMap<String, Plate>,
    platemaps: Vec<S3Object>,
    barcode_platemap: Option<S3Object>,
}

impl Batch {
    pub fn new<S: Into<String>>(id: S) -> Self {
        let id = id.into();
        Self {
            date: extract_date(&id),
            id,
            plates: BTreeMap::new(),
            platemaps: Vec::new(),
            barcode_platemap: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// A plate id shaped like a well id means the path was misread.
    pub fn check_plate_id(plate_id: &str) -> Result<()> {
        if WellId::is_valid(plate_id) {
            return Err(Error::path_format(format!(
                "Expecting plate_id, receive well_id: {plate_id}"
            )));
        }
        Ok(())
    }

    /// Get the plate, creating it on first reference.
    pub fn plate_mut(&mut self, plate_id: &str) -> Result<&mut Plate> {
        Self::check_plate_id(plate_id)?;
        Ok(self
            .plates
            .entry(plate_id.to_string())
            .or_insert_with(|| Plate::new(plate_id)))
    }

    pub fn plate(&self, plate_id: &str) -> Option<&Plate> {
        self.plates.get(plate_id)
    }

    pub fn plates(&self) -> impl Iterator<Item = &Plate> {
        self.plates.values()
    }

    pub fn add_platemap(&mut self, obj: S3Object) {
        self.platemaps.push(obj);
    }

    pub fn platemaps(&self) -> &[S3Object] {
        &self.platemaps
    }

    /// Set the barcode platemap; a later file replaces an earlier one.
    ///
    /// Returns the replaced object, if any.
    pub fn set_barcode_platemap(&mut self, obj: S3Object) -> Option<S3Object> {
        self.barcode_platemap.replace(obj)
    }

    pub fn barcode_platemap(&self) -> Option<&S3Object> {
        self.barcode_platemap.as_ref()
    }
}

/// A multi-well plate and every per-plate resource found for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    id: String,
    wells: BTreeMap<WellId, Well>,
    images: Vec<S3Object>,
    correction: BTreeMap<Channel, S3Object>,
    backend_csv: Option<S3Object>,
    backend_sqlite: Option<S3Object>,
    load_data_csv: Option<S3Object>,
    load_data_with_illum: Option<S3Object>,
    profiles: BTreeMap<ProfileKind, S3Object>,
    csv_files: AnalysisCsvFiles,
}

impl Plate {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            wells: BTreeMap::new(),
            images: Vec::new(),
            correction: BTreeMap::new(),
            backend_csv: None,
            backend_sqlite: None,
            load_data_csv: None,
            load_data_with_illum: None,
            profiles: BTreeMap::new(),
            csv_files: AnalysisCsvFiles::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the well, creating it on first reference.
    pub fn well_mut(&mut self, well_id: &str) -> Result<&mut Well> {
        let well_id = WellId::parse(well_id)?;
        Ok(self
            .wells
            .entry(well_id.clone())
            .or_insert_with(|| Well::new(well_id)))
    }

    pub fn well(&self, well_id: &str) -> Option<&Well> {
        self.wells.get(&WellId::parse(well_id).ok()?)
    }

    pub fn wells(&self) -> impl Iterator<Item = &Well> {
        self.wells.values()
    }

    pub fn add_image(&mut self, obj: S3Object) {
        self.images.push(obj);
    }

    pub fn images(&self) -> &[S3Object] {
        &self.images
    }

    /// The channel of an illumination correction file: a `.npy` whose stem
    /// ends with a known channel name.
    pub fn correction_channel(path: &str) -> Result<Channel> {
        let Some(stem) = path.strip_suffix(".npy") else {
            return Err(Error::path_format(
                "Invalid format for Illumination Correction. Expected .npy",
            ));
        };
        Channel::from_stem(stem).ok_or_else(|| Error::unknown_category(Channel::CATEGORY, path))
    }

    pub fn set_correction(&mut self, channel: Channel, obj: S3Object) -> Result<()> {
        assign_keyed(&mut self.correction, channel, obj)
    }

    pub fn correction(&self, channel: Channel) -> Option<&S3Object> {
        self.correction.get(&channel)
    }

    pub fn corrections(&self) -> impl Iterator<Item = (&Channel, &S3Object)> {
        self.correction.iter()
    }

    pub fn set_backend_csv(&mut self, obj: S3Object) -> Result<()> {
        assign(&mut self.backend_csv, "backend_csv", obj)
    }

    pub fn set_backend_sqlite(&mut self, obj: S3Object) -> Result<()> {
        assign(&mut self.backend_sqlite, "backend_sqlite", obj)
    }

    pub fn set_load_data_csv(&mut self, obj: S3Object) -> Result<()> {
        assign(&mut self.load_data_csv, "load_data_csv", obj)
    }

    pub fn set_load_data_with_illum(&mut self, obj: S3Object) -> Result<()> {
        assign(&mut self.load_data_with_illum, "load_data_with_illum", obj)
    }

    pub fn backend_csv(&self) -> Option<&S3Object> {
        self.backend_csv.as_ref()
    }

    pub fn backend_sqlite(&self) -> Option<&S3Object> {
        self.backend_sqlite.as_ref()
    }

    pub fn load_data_csv(&self) -> Option<&S3Object> {
        self.load_data_csv.as_ref()
    }

    pub fn load_data_with_illum(&self) -> Option<&S3Object> {
        self.load_data_with_illum.as_ref()
    }

    pub fn set_profile(&mut self, kind: ProfileKind, obj: S3Object) -> Result<()> {
        assign_keyed(&mut self.profiles, kind, obj)
    }

    /// The profile kind of a file belonging to `plate_id`: `<plate>_<kind>.csv[.gz]`
    /// or `<plate>.csv[.gz]` for the default profile.
    pub fn profile_kind(plate_id: &str, path: &str) -> Result<ProfileKind> {
        let invalid = || {
            Error::path_format(format!(
                "Profile is not valid for plate {plate_id}: {path}"
            ))
        };
        let filename = path.rsplit('/').next().unwrap_or(path);
        let stem = filename
            .strip_suffix(".csv.gz")
            .or_else(|| filename.strip_suffix(".csv"))
            .ok_or_else(invalid)?;
        let rest = stem.strip_prefix(plate_id).ok_or_else(invalid)?;
        if rest.is_empty() {
            return Ok(ProfileKind::Default);
        }
        rest.strip_prefix('_')
            .and_then(|kind| kind.parse::<ProfileKind>().ok())
            .filter(|kind| *kind != ProfileKind::Default)
            .ok_or_else(invalid)
    }

    pub fn profile(&self, kind: ProfileKind) -> Option<&S3Object> {
        self.profiles.get(&kind)
    }

    pub fn profiles(&self) -> impl Iterator<Item = (&ProfileKind, &S3Object)> {
        self.profiles.iter()
    }

    /// Attach an analysis CSV file of an already classified kind.
    pub fn add_csv_file(&mut self, kind: &str, obj: S3Object) -> Result<()> {
        self.csv_files.insert(kind, obj)
    }

    pub fn csv_files(&self) -> &AnalysisCsvFiles {
        &self.csv_files
    }
}

/// One well on a plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Well {
    id: WellId,
    sites: BTreeMap<String, Site>,
    csv_files: AnalysisCsvFiles,
}

impl Well {
    pub fn new(id: WellId) -> Self {
        Self {
            id,
            sites: BTreeMap::new(),
            csv_files: AnalysisCsvFiles::default(),
        }
    }

    pub fn id(&self) -> &WellId {
        &self.id
    }

    pub fn site_mut(&mut self, site_id: &str) -> &mut Site {
        self.sites
            .entry(site_id.to_string())
            .or_insert_with(|| Site::new(site_id))
    }

    pub fn site(&self, site_id: &str) -> Option<&Site> {
        self.sites.get(site_id)
    }

    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }

    pub fn add_csv_file(&mut self, kind: &str, obj: S3Object) -> Result<()> {
        self.csv_files.insert(kind, obj)
    }

    pub fn csv_files(&self) -> &AnalysisCsvFiles {
        &self.csv_files
    }

    /// CSV files seen from a site: its own, then the well's for missing kinds.
    pub fn site_csv_files(&self, site: &Site) -> BTreeMap<String, S3Object> {
        site.csv_files.with_fallback(&self.csv_files)
    }
}

/// An imaged region within a well.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    id: String,
    cell_outline: Option<S3Object>,
    nuclei_outline: Option<S3Object>,
    mito_outline: Option<S3Object>,
    mito_obj_outline: Option<S3Object>,
    csv_files: AnalysisCsvFiles,
}

impl Site {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            cell_outline: None,
            nuclei_outline: None,
            mito_outline: None,
            mito_obj_outline: None,
            csv_files: AnalysisCsvFiles::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_outline(&mut self, kind: OutlineKind, obj: S3Object) -> Result<()> {
        let slot = match kind {
            OutlineKind::Cell => &mut self.cell_outline,
            OutlineKind::Nuclei => &mut self.nuclei_outline,
            OutlineKind::Mito => &mut self.mito_outline,
            OutlineKind::MitoObject => &mut self.mito_obj_outline,
        };
        assign(slot, kind.as_str(), obj)
    }

    pub fn outline(&self, kind: OutlineKind) -> Option<&S3Object> {
        match kind {
            OutlineKind::Cell => self.cell_outline.as_ref(),
            OutlineKind::Nuclei => self.nuclei_outline.as_ref(),
            OutlineKind::Mito => self.mito_outline.as_ref(),
            OutlineKind::MitoObject => self.mito_obj_outline.as_ref(),
        }
    }

    pub fn add_csv_file(&mut self, kind: &str, obj: S3Object) -> Result<()> {
        self.csv_files.insert(kind, obj)
    }

    pub fn csv_files(&self) -> &AnalysisCsvFiles {
        &self.csv_files
    }
}
