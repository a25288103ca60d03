// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Rebuild the dataset → batch → plate → well → site hierarchy of an imaging
//! archive from a flat object listing.
//!
//! A run owns a [`HierarchyRegistry`], hands it to a [`HierarchyBuilder`]
//! together with a [`Config`], and feeds it listing lines through
//! [`ingest_reader`] or [`ingest_str`]. Lines that do not fit the archive
//! conventions are collected in the [`IngestReport`] instead of stopping the
//! run. Each dataset can then be serialized ([`to_full_json`],
//! [`to_summary_json`]) and the full form checked against a JSON schema by
//! [`SchemaRepairer`], which prunes failing plates and batches.

pub mod builder;
pub mod category;
pub mod config;
pub mod display;
mod error;
pub mod ingest;
pub mod listing;
pub mod model;
pub mod registry;
pub mod repair;
pub mod serialize;

pub use builder::{HierarchyBuilder, image_plate_id};
pub use category::{
    Channel, ImageFolder, MetadataFolder, OutlineKind, ProfileKind, RootFolder, WorkspaceFolder,
};
pub use config::Config;
pub use error::{Error, Result, Violation};
pub use ingest::{IngestReport, LineError, ingest_line, ingest_reader, ingest_str};
pub use listing::{S3Object, extract_date};
pub use model::{AnalysisCsvFiles, Batch, Dataset, Plate, Site, Well, WellId};
pub use registry::HierarchyRegistry;
pub use repair::{Removal, RepairReport, SchemaRepairer, ViolationLocation};
pub use serialize::{
    DatasetRecord, PlateImageCount, full_record, image_counts, prune_empty, summarize,
    to_full_json, to_summary_json,
};
