//! Real listing lines collected from the archive over several releases.

use platetree::{
    Channel, Config, Error, HierarchyBuilder, HierarchyRegistry, OutlineKind, Plate, ProfileKind,
};

fn process(registry: &mut HierarchyRegistry, line: &str) -> platetree::Result<()> {
    let config = Config::default();
    HierarchyBuilder::new(registry, &config).process_line(line)
}

fn plate<'r>(registry: &'r HierarchyRegistry, dataset: &str, batch: &str, plate: &str) -> &'r Plate {
    registry
        .get(dataset)
        .and_then(|d| d.batch(batch))
        .and_then(|b| b.plate(plate))
        .unwrap_or_else(|| panic!("missing plate {dataset}/{batch}/{plate}"))
}

#[test]
fn test_site_csv_file() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-02 18:36:12    5310570 \
         jump/source_6/workspace/analysis/p210830CPU2OS48hw384exp023JUMP/\
         110000293094/analysis/110000293094-A01-1/Cells.csv",
    )
    .unwrap();

    let plate = plate(&registry, "source_6", "p210830CPU2OS48hw384exp023JUMP", "110000293094");
    let site = plate.well("A01").and_then(|w| w.site("1")).unwrap();
    assert_eq!(site.csv_files().get("Cells").unwrap().size, 5310570);
}

#[test]
fn test_profiles_csv_and_gz_share_a_kind() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-03 05:15:47    1639645 \
         jump/source_6/workspace/profiles/p210830CPU2OS48hw384exp023JUMP/\
         110000293094/110000293094_normalized_feature_select_negcon_batch.csv",
    )
    .unwrap();
    let err = process(
        &mut registry,
        "2021-11-03 05:15:47    1481504 \
         jump/source_6/workspace/profiles/p210830CPU2OS48hw384exp023JUMP/\
         110000293094/110000293094_normalized_feature_select_negcon_batch.csv.gz",
    )
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateAssignment { .. }));

    let plate = plate(&registry, "source_6", "p210830CPU2OS48hw384exp023JUMP", "110000293094");
    assert_eq!(
        plate.profile(ProfileKind::FeatureSelectNegconBatch).unwrap().size,
        1639645
    );
}

#[test]
fn test_gz_profile_alone() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-03 05:15:47    1481504 \
         jump/source_6/workspace/profiles/p210830CPU2OS48hw384exp023JUMP/\
         110000293094/110000293094_normalized_feature_select_negcon_batch.csv.gz",
    )
    .unwrap();
}

#[test]
fn test_image_with_double_underscore() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-10 08:07:26    2226012 \
         jump/source_3/images/CP_25_all_Phenix1/images/\
         C13443aW__2021-09-18T06_57_42-Measurement1/Images/r07c21f02p01-ch1sk1fk1fl1.tiff",
    )
    .unwrap();
    assert_eq!(
        plate(&registry, "source_3", "CP_25_all_Phenix1", "C13443aW")
            .images()
            .len(),
        1
    );
}

#[test]
fn test_outline_format_a() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-10 16:03:49      24255 \
         jump/source_3/workspace/analysis/CP_25_all_Phenix1/C13451aW/\
         analysis/C13451aW-F08/outlines/F08_s3--nuclei_outlines.png",
    )
    .unwrap();

    let plate = plate(&registry, "source_3", "CP_25_all_Phenix1", "C13451aW");
    let site = plate.well("F08").and_then(|w| w.site("3")).unwrap();
    assert!(site.outline(OutlineKind::Nuclei).is_some());
    assert!(site.outline(OutlineKind::Cell).is_none());
}

#[test]
fn test_outline_with_hyphenated_plate() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-17 07:48:21      41868 \
         jump/source_10/workspace/analysis/2021_05_31_U2OS_48_hr_run1/\
         Dest210531-152324/analysis/J10/outlines/J10_s1--cell_outlines.png",
    )
    .unwrap();
    let plate = plate(&registry, "source_10", "2021_05_31_U2OS_48_hr_run1", "Dest210531-152324");
    assert!(
        plate
            .well("J10")
            .and_then(|w| w.site("1"))
            .and_then(|s| s.outline(OutlineKind::Cell))
            .is_some()
    );
}

#[test]
fn test_well_csv_from_bare_well_folder() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-17 07:54:37     297017 jump/source_10/workspace/analysis/\
         2021_05_31_U2OS_48_hr_run1/Dest210531-152810/analysis/L24/Image.csv",
    )
    .unwrap();
    process(
        &mut registry,
        "2021-11-17 07:55:16     297634 \
         jump/source_10/workspace/analysis/2021_05_31_U2OS_48_hr_run1/\
         Dest210531-152945/analysis/N03/Image.csv",
    )
    .unwrap();

    let batch = registry
        .get("source_10")
        .and_then(|d| d.batch("2021_05_31_U2OS_48_hr_run1"))
        .unwrap();
    assert_eq!(batch.plates().count(), 2);
    let well = batch.plate("Dest210531-152945").and_then(|p| p.well("N03")).unwrap();
    assert!(well.csv_files().get("Image").is_some());
}

#[test]
fn test_unknown_image_folder_is_rejected() {
    let mut registry = HierarchyRegistry::new();
    let err = process(
        &mut registry,
        "2021-10-23 00:56:59    2063698 jump/source_11/images/Batch4/\
         EC000111__2021-09-20T14_39_07-Measurement1/Images/r14c09f01p01-ch1sk1fk1fl1.tiff",
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownCategory { .. }));
    assert!(registry.get("source_11").is_none());
}

#[test]
fn test_illumination_file() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-09 21:00:16    3984144 \
         jump/source_5/images/JUMPCPE-20210623-Run01_20210624_003152/\
         illum/ADMJUM001/ADMJUM001_IllumAGP.npy",
    )
    .unwrap();
    let plate = plate(
        &registry,
        "source_5",
        "JUMPCPE-20210623-Run01_20210624_003152",
        "ADMJUM001",
    );
    assert_eq!(plate.correction(Channel::Agp).unwrap().size, 3984144);
}

#[test]
fn test_cell_and_nuclei_outlines_share_a_site() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-10 22:59:32      32524 jump/source_3/workspace/\
         analysis/CP_31_all_Phenix1/B040303a/analysis/\
         B040303a-E05/outlines/E05_s4--cell_outlines.png",
    )
    .unwrap();
    process(
        &mut registry,
        "2021-11-10 22:59:32      15205 jump/source_3/workspace/\
         analysis/CP_31_all_Phenix1/B040303a/analysis/\
         B040303a-E05/outlines/E05_s4--nuclei_outlines.png",
    )
    .unwrap();

    let plate = plate(&registry, "source_3", "CP_31_all_Phenix1", "B040303a");
    let site = plate.well("E05").and_then(|w| w.site("4")).unwrap();
    assert_eq!(site.outline(OutlineKind::Cell).unwrap().size, 32524);
    assert_eq!(site.outline(OutlineKind::Nuclei).unwrap().size, 15205);
}

#[test]
fn test_outline_format_b() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-01-14 11:41:28      10758 jump/source_2/workspace/\
         analysis/20211003_Batch_13/1086289792/analysis/\
         1086289792/outlines/1086289792_P24_6_nuclei_outlines.png",
    )
    .unwrap();
    let plate = plate(&registry, "source_2", "20211003_Batch_13", "1086289792");
    assert!(
        plate
            .well("P24")
            .and_then(|w| w.site("6"))
            .and_then(|s| s.outline(OutlineKind::Nuclei))
            .is_some()
    );
}

#[test]
fn test_plate_level_csv() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-01-13 20:45:39 12920465613 jump/source_2/workspace/\
         analysis/20210607_Batch_2/1053601756/analysis/\
         1053601756/Cells.csv",
    )
    .unwrap();
    let plate = plate(&registry, "source_2", "20210607_Batch_2", "1053601756");
    assert_eq!(plate.csv_files().get("Cells").unwrap().size, 12920465613);
    assert_eq!(plate.wells().count(), 0);
}

#[test]
fn test_plate_id_after_short_prefix() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-10-06 00:06:45    1994752 \
         jump/source_5/images/JUMPCPE-20210623-Run01_20210624_003152/\
         images/P01_ADMJUM001/P01_ADMJUM001_A01_T0001F001L01A03Z01C03.tif",
    )
    .unwrap();
    plate(
        &registry,
        "source_5",
        "JUMPCPE-20210623-Run01_20210624_003152",
        "ADMJUM001",
    );
}

#[test]
fn test_site_one_is_detected() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2021-11-17 15:45:43      33689 \
         jump/source_10/workspace/analysis/2021_06_14_U2OS_48_hr_run5/\
         Dest210614-163621/analysis/O09/outlines/O09_s1--cell_outlines.png",
    )
    .unwrap();
    let plate = plate(&registry, "source_10", "2021_06_14_U2OS_48_hr_run5", "Dest210614-163621");
    assert!(plate.well("O09").and_then(|w| w.site("1")).is_some());
}

#[test]
fn test_illumination_requires_npy() {
    let mut registry = HierarchyRegistry::new();
    let err = process(
        &mut registry,
        "2022-03-07 15:18:55    2765104 \
         jump/source_7/images/2021_07_19_JUMP-SC-Run1/illum/IllumAGP.tif\
         /IllumAGP.tif",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid format for Illumination Correction. Expected .npy"
    );
    // the bogus plate was never created
    assert!(registry.get("source_7").is_none());
}

#[test]
fn test_site_csv_with_underscored_hyphenated_plate() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-03-31 04:28:09      72779 \
         jump/source_11/workspace/analysis/Batch2/LM37-70_1/analysis/\
         LM37-70_1-A01-2/Image.csv",
    )
    .unwrap();
    let plate = plate(&registry, "source_11", "Batch2", "LM37-70_1");
    let site = plate.well("A01").and_then(|w| w.site("2")).unwrap();
    assert!(site.csv_files().get("Image").is_some());
}

#[test]
fn test_folder_with_partial_plate_name() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-03-31 01:50:01    3643780 \
         jump/source_11/workspace/analysis/Batch3/EC000157/analysis/EC000157real-A10-3/Nuclei.csv",
    )
    .unwrap();
    let plate = plate(&registry, "source_11", "Batch3", "EC000157");
    assert!(plate.well("A10").and_then(|w| w.site("3")).is_some());
}

#[test]
fn test_non_image_file_in_image_folder() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-03-11 07:45:58     178899 \
         jump/source_11/images/Batch2/images/LM37-70_1__2021-06-06T16_25_09-Measurement1/Assaylayout/Unnamed.xml",
    )
    .unwrap();
    plate(&registry, "source_11", "Batch2", "LM37-70_1");
}

#[test]
fn test_image_plate_with_underscore_and_hyphen() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-03-11 07:45:58    2247103 \
         jump/source_11/images/Batch2/images/LM37-70_1__2021-06-06T16_25_09-Measurement1/Images/r01c01f02p01-ch1sk1fk1fl1.tiff",
    )
    .unwrap();
    assert_eq!(plate(&registry, "source_11", "Batch2", "LM37-70_1").images().len(), 1);
}

#[test]
fn test_cytoplasm_csv() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-03-12 14:48:34    3812564 \
         jump/source_11/workspace/analysis/Batch3/EC000157real/analysis/EC000157real-A01-1/Cytoplasm.csv",
    )
    .unwrap();
    let plate = plate(&registry, "source_11", "Batch3", "EC000157real");
    let site = plate.well("A01").and_then(|w| w.site("1")).unwrap();
    assert!(site.csv_files().get("Cytoplasm").is_some());
}

#[test]
fn test_gzipped_plate_csv() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-05-25 15:33:00 7195492927 \
         jump/source_7/workspace/analysis/20210719_Run1/CP1-SC1-01/analysis/CP1-SC1-01/Cells.csv.gz",
    )
    .unwrap();
    let plate = plate(&registry, "source_7", "20210719_Run1", "CP1-SC1-01");
    assert!(plate.csv_files().get("Cells").is_some());
}

#[test]
fn test_readme_is_not_a_profile() {
    let mut registry = HierarchyRegistry::new();
    let err = process(
        &mut registry,
        "2021-12-06 15:38:47         11 jump/source_8/workspace/profiles/README.md\n",
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("Object is not a profile:"));
}

#[test]
fn test_high_z_brightfield_under_pilot_prefix() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2022-06-21 19:20:22    4665728 cpg0000-jump-pilot/source_4/images/2020_11_04_CPJUMP1/illum/BR00116991/BR00116991_IllumHighZBF.npy",
    )
    .unwrap();
    let plate = plate(&registry, "source_4", "2020_11_04_CPJUMP1", "BR00116991");
    assert!(plate.correction(Channel::HighZBrightfield).is_some());
}

#[test]
fn test_default_profile() {
    let mut registry = HierarchyRegistry::new();
    process(
        &mut registry,
        "2023-02-09 17:47:37   22161878 cpg0000-jump-pilot/source_4/workspace/profiles/2020_11_04_CPJUMP1_DL/BR00116996/BR00116996.csv.gz",
    )
    .unwrap();
    let plate = plate(&registry, "source_4", "2020_11_04_CPJUMP1_DL", "BR00116996");
    assert_eq!(plate.profile(ProfileKind::Default).unwrap().size, 22161878);
}
