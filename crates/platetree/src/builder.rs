// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Attach listing objects to the hierarchy.
//!
//! A path reads `<prefix>/<dataset>/<root>/...`. The root folder and the
//! folders below it decide which node the object belongs to and which slot
//! it fills. Every line is classified before any node is created, so a line
//! that fails leaves the registry as it was.

use diagnostics::*;

use crate::category::{ImageFolder, MetadataFolder, OutlineKind, RootFolder, WorkspaceFolder};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::listing::S3Object;
use crate::model::{AnalysisCsvFiles, Plate, WellId};
use crate::registry::HierarchyRegistry;

/// Stands in for the plate id while an analysis folder name is split on `-`.
const PLATE_PLACEHOLDER: &str = "\u{0}PLATE_ID\u{0}";

/// Consumes listing lines one at a time and grows the registry.
pub struct HierarchyBuilder<'a> {
    registry: &'a mut HierarchyRegistry,
    config: &'a Config,
}

/// Which single-valued load_data slot a file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadDataKind {
    Plain,
    WithIllum,
    Split,
}

/// The node an analysis CSV file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CsvTarget {
    Plate,
    Well(String),
    Site(String, String),
}

/// Well, site and kind decoded from an outline filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutlineName<'n> {
    pub well: &'n str,
    pub site: &'n str,
    pub kind: OutlineKind,
}

fn segment<'p>(payload: &[&'p str], index: usize, what: &str, path: &str) -> Result<&'p str> {
    match payload.get(index) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::path_format(format!("Missing {what} in path: {path}"))),
    }
}

/// Plate id embedded in an image folder or file name.
///
/// The name is split on `__`, or on `_` when that yields a single token; the
/// first token longer than four characters is the plate id. Shorter tokens
/// are row/plate prefixes such as `P01`.
pub fn image_plate_id(name: &str) -> Result<&str> {
    let mut tokens: Vec<&str> = name.split("__").collect();
    if tokens.len() == 1 {
        tokens = name.split('_').collect();
    }
    tokens
        .into_iter()
        .find(|token| token.chars().count() > 4)
        .ok_or_else(|| Error::path_format(format!("Unable to find a valid plate_id in {name}")))
}

/// Decode `<well>_s<site>--<kind>.<ext>` or `<plate>_<well>_<site>_<kind>.<ext>`.
pub(crate) fn parse_outline_name<'n>(filename: &'n str, plate_id: &str) -> Result<OutlineName<'n>> {
    let basename = filename.split('.').next().unwrap_or(filename);
    let malformed = || Error::path_format(format!("Invalid outline filename: {filename}"));

    let (well, site, kind) = if basename.contains("--") {
        let parts: Vec<&str> = basename.split("--").collect();
        let &[prefix, kind] = parts.as_slice() else {
            return Err(malformed());
        };
        let ids: Vec<&str> = prefix.split("_s").collect();
        let &[well, site] = ids.as_slice() else {
            return Err(malformed());
        };
        (well, site, kind)
    } else {
        let parts: Vec<&str> = basename.splitn(4, '_').collect();
        let &[plate, well, site, kind] = parts.as_slice() else {
            return Err(malformed());
        };
        if plate != plate_id {
            return Err(Error::identifier_mismatch("Plate", plate_id, plate));
        }
        (well, site, kind)
    };
    if site.is_empty() {
        return Err(malformed());
    }

    Ok(OutlineName {
        well,
        site,
        kind: kind.parse()?,
    })
}

/// Split an analysis folder name into ids without shredding a hyphenated
/// plate id.
pub(crate) fn split_analysis_ids(folder: &str, plate_id: &str) -> Vec<String> {
    folder
        .replacen(plate_id, PLATE_PLACEHOLDER, 1)
        .split('-')
        .map(|piece| piece.replace(PLATE_PLACEHOLDER, plate_id))
        .collect()
}

/// Decide which node owns the CSV files of an analysis folder.
pub(crate) fn csv_target(folder: &str, plate_id: &str) -> Result<CsvTarget> {
    let ids = split_analysis_ids(folder, plate_id);
    match ids.as_slice() {
        [single] if WellId::is_valid(single) => Ok(CsvTarget::Well(single.clone())),
        [single] if single.contains(plate_id) => Ok(CsvTarget::Plate),
        [single] => Err(Error::identifier_mismatch("Plate", plate_id, single.as_str())),
        [_, _] | [_, _, _] if !ids[0].contains(plate_id) => Err(Error::identifier_mismatch(
            "Plate",
            plate_id,
            ids[0].as_str(),
        )),
        [_, well] => Ok(CsvTarget::Well(well.clone())),
        [_, well, site] => Ok(CsvTarget::Site(well.clone(), site.clone())),
        _ => Err(Error::path_format(format!(
            "Invalid format for analysis folder in \"{folder}\""
        ))),
    }
}

fn load_data_kind(path: &str, config: &Config) -> Result<LoadDataKind> {
    const PLAIN: [&str; 2] = ["load_data.csv", "load_data.csv.gz"];
    const WITH_ILLUM: [&str; 4] = [
        "load_data_with_illum.csv",
        "load_data_with_illum.csv.gz",
        "load_data_illum.csv",
        "load_data_illum.csv.gz",
    ];

    if PLAIN.iter().any(|suffix| path.ends_with(suffix)) {
        Ok(LoadDataKind::Plain)
    } else if WITH_ILLUM.iter().any(|suffix| path.ends_with(suffix)) {
        Ok(LoadDataKind::WithIllum)
    } else if config.is_split_load_data(path) {
        Ok(LoadDataKind::Split)
    } else {
        Err(Error::path_format(format!("Invalid load_data file: {path}")))
    }
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(registry: &'a mut HierarchyRegistry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn registry(&self) -> &HierarchyRegistry {
        self.registry
    }

    /// Parse one raw listing line and attach its object.
    ///
    /// Lines carrying a filesystem noise marker are dropped silently.
    pub fn process_line(&mut self, line: &str) -> Result<()> {
        if self.config.is_noise(line) {
            return Ok(());
        }
        let obj = S3Object::parse(line)?;
        self.process_object(obj)
    }

    /// Attach an already parsed object to the node its path addresses.
    pub fn process_object(&mut self, obj: S3Object) -> Result<()> {
        let path = obj.path.clone();
        let segments: Vec<&str> = path.split('/').collect();

        // segments[0] is the bucket prefix, e.g. "jump"
        let dataset_id = segment(&segments, 1, "dataset id", &path)?;
        let root: RootFolder = segment(&segments, 2, "root folder", &path)?.parse()?;
        let payload = &segments[3..];

        match root {
            RootFolder::Images => self.process_image(dataset_id, payload, obj),
            RootFolder::Workspace => self.process_workspace(dataset_id, payload, obj),
        }
    }

    fn process_image(&mut self, dataset_id: &str, payload: &[&str], obj: S3Object) -> Result<()> {
        let batch_id = segment(payload, 0, "batch id", &obj.path)?;
        let folder: ImageFolder = segment(payload, 1, "image folder", &obj.path)?.parse()?;

        match folder {
            ImageFolder::Illum => {
                let plate_id = segment(payload, 2, "plate id", &obj.path)?;
                segment(payload, 3, "illumination file", &obj.path)?;
                let channel = Plate::correction_channel(&obj.path)?;
                debug!(
                    "Illumination {channel} for plate {plate_id}",
                    channel: channel.as_str(),
                    plate_id: plate_id
                );
                self.registry
                    .plate_mut(dataset_id, batch_id, plate_id)?
                    .set_correction(channel, obj)
            }
            ImageFolder::Images => {
                let name = segment(payload, 2, "image name", &obj.path)?;
                let plate_id = image_plate_id(name)?;
                self.registry
                    .plate_mut(dataset_id, batch_id, plate_id)?
                    .add_image(obj);
                Ok(())
            }
        }
    }

    fn process_workspace(
        &mut self,
        dataset_id: &str,
        payload: &[&str],
        obj: S3Object,
    ) -> Result<()> {
        let folder: WorkspaceFolder = segment(payload, 0, "workspace folder", &obj.path)?.parse()?;

        match folder {
            WorkspaceFolder::Analysis => self.process_analysis(dataset_id, payload, obj),
            WorkspaceFolder::Backend => self.process_backend(dataset_id, payload, obj),
            WorkspaceFolder::LoadDataCsv => self.process_load_data(dataset_id, payload, obj),
            WorkspaceFolder::Metadata => self.process_metadata(dataset_id, payload, obj),
            WorkspaceFolder::Profiles => self.process_profile(dataset_id, payload, obj),
            WorkspaceFolder::QualityControl
            | WorkspaceFolder::Qc
            | WorkspaceFolder::AssayDev
            | WorkspaceFolder::Pipelines => {
                let folder = folder.as_str();
                debug!(
                    "Skipping {folder} object in dataset {dataset_id}",
                    folder: folder,
                    dataset_id: dataset_id
                );
                Ok(())
            }
        }
    }

    /// `analysis/<batch>/<plate>/analysis/<folder>/{outlines/<file>|<file>}`
    fn process_analysis(
        &mut self,
        dataset_id: &str,
        payload: &[&str],
        obj: S3Object,
    ) -> Result<()> {
        let batch_id = segment(payload, 1, "batch id", &obj.path)?;
        let plate_id = segment(payload, 2, "plate id", &obj.path)?;
        let literal = segment(payload, 3, "analysis folder", &obj.path)?;
        if literal != "analysis" {
            return Err(Error::path_format(format!(
                "Expected analysis folder, found {literal}: {}",
                obj.path
            )));
        }
        let folder = segment(payload, 4, "analysis subfolder", &obj.path)?;
        let entry = segment(payload, 5, "analysis file", &obj.path)?;

        if entry == "outlines" {
            let filename = segment(payload, 6, "outline file", &obj.path)?;
            self.process_outline(dataset_id, batch_id, plate_id, filename, obj)
        } else {
            self.process_csv_file(dataset_id, batch_id, plate_id, folder, obj)
        }
    }

    fn process_outline(
        &mut self,
        dataset_id: &str,
        batch_id: &str,
        plate_id: &str,
        filename: &str,
        obj: S3Object,
    ) -> Result<()> {
        let outline = parse_outline_name(filename, plate_id)?;
        let well = WellId::parse(outline.well)?;
        self.registry
            .site_mut(dataset_id, batch_id, plate_id, well.as_str(), outline.site)?
            .set_outline(outline.kind, obj)
    }

    fn process_csv_file(
        &mut self,
        dataset_id: &str,
        batch_id: &str,
        plate_id: &str,
        folder: &str,
        obj: S3Object,
    ) -> Result<()> {
        let target = csv_target(folder, plate_id)?;
        if let CsvTarget::Well(well) | CsvTarget::Site(well, _) = &target {
            WellId::parse(well)?;
        }
        let kind = AnalysisCsvFiles::classify(&obj.path, self.config)?;

        let plate = self.registry.plate_mut(dataset_id, batch_id, plate_id)?;
        match target {
            CsvTarget::Plate => plate.add_csv_file(kind, obj),
            CsvTarget::Well(well) => {
                let well = plate.well_mut(&well)?;
                debug!(
                    "Analysis {kind} for well {well_id}",
                    kind: kind,
                    well_id: well.id().as_str()
                );
                well.add_csv_file(kind, obj)
            }
            CsvTarget::Site(well, site) => plate
                .well_mut(&well)?
                .site_mut(&site)
                .add_csv_file(kind, obj),
        }
    }

    fn process_backend(&mut self, dataset_id: &str, payload: &[&str], obj: S3Object) -> Result<()> {
        let batch_id = segment(payload, 1, "batch id", &obj.path)?;
        let plate_id = segment(payload, 2, "plate id", &obj.path)?;
        segment(payload, 3, "backend file", &obj.path)?;

        let sqlite = if obj.path.ends_with(".sqlite") {
            true
        } else if obj.path.ends_with(".csv") {
            false
        } else {
            return Err(Error::path_format(format!(
                "Invalid backend value: {}",
                obj.path
            )));
        };

        let plate = self.registry.plate_mut(dataset_id, batch_id, plate_id)?;
        if sqlite {
            plate.set_backend_sqlite(obj)
        } else {
            plate.set_backend_csv(obj)
        }
    }

    fn process_load_data(
        &mut self,
        dataset_id: &str,
        payload: &[&str],
        obj: S3Object,
    ) -> Result<()> {
        let batch_id = segment(payload, 1, "batch id", &obj.path)?;
        let plate_id = segment(payload, 2, "plate id", &obj.path)?;
        segment(payload, 3, "load_data file", &obj.path)?;

        match load_data_kind(&obj.path, self.config)? {
            LoadDataKind::Plain => self
                .registry
                .plate_mut(dataset_id, batch_id, plate_id)?
                .set_load_data_csv(obj),
            LoadDataKind::WithIllum => self
                .registry
                .plate_mut(dataset_id, batch_id, plate_id)?
                .set_load_data_with_illum(obj),
            LoadDataKind::Split => Ok(()),
        }
    }

    fn process_metadata(
        &mut self,
        dataset_id: &str,
        payload: &[&str],
        obj: S3Object,
    ) -> Result<()> {
        let folder: MetadataFolder = segment(payload, 1, "metadata folder", &obj.path)?.parse()?;

        match folder {
            MetadataFolder::External => {
                self.registry.dataset_mut(dataset_id).add_metadata(obj);
                Ok(())
            }
            MetadataFolder::Platemaps => {
                let batch_id = segment(payload, 2, "batch id", &obj.path)?;
                let entry = segment(payload, 3, "platemap file", &obj.path)?;
                match entry {
                    "platemap" => {
                        segment(payload, 4, "platemap file", &obj.path)?;
                        self.registry.batch_mut(dataset_id, batch_id).add_platemap(obj);
                        Ok(())
                    }
                    "barcode_platemap.csv" => {
                        let batch = self.registry.batch_mut(dataset_id, batch_id);
                        if let Some(previous) = batch.set_barcode_platemap(obj) {
                            let previous = previous.path;
                            warn!(
                                "Replaced barcode platemap {previous} in batch {batch_id}",
                                previous: previous.as_str(),
                                batch_id: batch_id
                            );
                        }
                        Ok(())
                    }
                    _ => Err(Error::path_format(format!(
                        "Invalid platemap file: {}",
                        obj.path
                    ))),
                }
            }
        }
    }

    fn process_profile(&mut self, dataset_id: &str, payload: &[&str], obj: S3Object) -> Result<()> {
        if payload.len() < 4 {
            return Err(Error::path_format(format!(
                "Object is not a profile: {}",
                obj.path
            )));
        }
        let batch_id = segment(payload, 1, "batch id", &obj.path)?;
        let plate_id = segment(payload, 2, "plate id", &obj.path)?;
        let kind = Plate::profile_kind(plate_id, &obj.path)?;

        self.registry
            .plate_mut(dataset_id, batch_id, plate_id)?
            .set_profile(kind, obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_plate_id() {
        assert_eq!(
            image_plate_id("P01_ADMJUM001_A01_T0001F001L01A03Z01C03.tif").unwrap(),
            "ADMJUM001"
        );
        assert_eq!(
            image_plate_id("C13443aW__2021-09-18T06_57_42-Measurement1").unwrap(),
            "C13443aW"
        );
        assert_eq!(
            image_plate_id("LM37-70_1__2021-06-06T16_25_09-Measurement1").unwrap(),
            "LM37-70_1"
        );
        assert!(image_plate_id("P01_A01_B02").is_err());
        // tokens are measured in characters
        assert_eq!(image_plate_id("äöü_ABCDEFG_x.tif").unwrap(), "ABCDEFG");
    }

    #[test]
    fn test_outline_format_a() {
        let name = parse_outline_name("F08_s3--nuclei_outlines.png", "C13451aW").unwrap();
        assert_eq!(
            name,
            OutlineName {
                well: "F08",
                site: "3",
                kind: OutlineKind::Nuclei
            }
        );
        assert!(parse_outline_name("F08_3--nuclei_outlines.png", "X").is_err());
        assert!(parse_outline_name("F08_s3--a--b.png", "X").is_err());
    }

    #[test]
    fn test_outline_format_b() {
        let name =
            parse_outline_name("1086289792_P24_6_nuclei_outlines.png", "1086289792").unwrap();
        assert_eq!(name.well, "P24");
        assert_eq!(name.site, "6");
        assert_eq!(name.kind, OutlineKind::Nuclei);

        let err = parse_outline_name("1086289792_P24_6_nuclei_outlines.png", "1053601756")
            .unwrap_err();
        assert!(matches!(err, Error::IdentifierMismatch { .. }));

        let err = parse_outline_name("1086289792_P24_6_golgi.png", "1086289792").unwrap_err();
        assert!(matches!(err, Error::UnknownCategory { .. }));

        assert!(parse_outline_name("1086289792_P24.png", "1086289792").is_err());
    }

    #[test]
    fn test_split_analysis_ids_keeps_hyphenated_plate() {
        assert_eq!(
            split_analysis_ids("CP1-SC1-01-A01-1", "CP1-SC1-01"),
            vec!["CP1-SC1-01", "A01", "1"]
        );
        assert_eq!(
            split_analysis_ids("EC000157real-A10-3", "EC000157"),
            vec!["EC000157real", "A10", "3"]
        );
        assert_eq!(split_analysis_ids("L24", "Dest210531-152810"), vec!["L24"]);
    }

    #[test]
    fn test_csv_target() {
        assert_eq!(
            csv_target("CP1-SC1-01-A01-1", "CP1-SC1-01").unwrap(),
            CsvTarget::Site("A01".to_string(), "1".to_string())
        );
        assert_eq!(
            csv_target("110000293094-A01", "110000293094").unwrap(),
            CsvTarget::Well("A01".to_string())
        );
        assert_eq!(csv_target("N03", "Dest210531-152945").unwrap(), CsvTarget::Well("N03".to_string()));
        assert_eq!(csv_target("1053601756", "1053601756").unwrap(), CsvTarget::Plate);

        assert!(matches!(
            csv_target("OTHER", "1053601756").unwrap_err(),
            Error::IdentifierMismatch { .. }
        ));
        assert!(matches!(
            csv_target("OTHER-A01-1", "1053601756").unwrap_err(),
            Error::IdentifierMismatch { .. }
        ));
        assert!(matches!(
            csv_target("P1-A01-1-extra", "P1").unwrap_err(),
            Error::PathFormat(_)
        ));
    }

    #[test]
    fn test_load_data_kind() {
        let config = Config::default();
        assert_eq!(load_data_kind("x/load_data.csv.gz", &config).unwrap(), LoadDataKind::Plain);
        assert_eq!(
            load_data_kind("x/load_data_illum.csv", &config).unwrap(),
            LoadDataKind::WithIllum
        );
        assert_eq!(
            load_data_kind("x/load_data_with_illum_split-2.csv", &config).unwrap(),
            LoadDataKind::Split
        );
        assert!(load_data_kind("x/load_data.parquet", &config).is_err());
    }
}
