// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Validate a full-form tree against a JSON schema and prune what fails.
//!
//! Repair runs in two passes. Every plate with a violation at or below it is
//! removed first. The pruned tree is then validated again, and a batch with
//! a violation on its own node or its platemap fields is removed. Whatever
//! survives must validate cleanly.

use std::collections::{BTreeMap, BTreeSet};

use diagnostics::*;
use serde_json::Value;

use crate::error::{Error, Result, Violation};

/// Where in the tree a violation sits, as far as pruning is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationLocation {
    /// At or below `/batches/<batch>/plates/<plate>`
    Plate { batch: usize, plate: usize },
    /// At `/batches/<batch>`, its `plates` list, or at or below its
    /// `platemaps` / `barcode_platemap`
    Batch { batch: usize },
    Other,
}

impl ViolationLocation {
    /// Classify a JSON pointer such as `/batches/0/plates/3/wells`.
    pub fn classify(pointer: &str) -> Self {
        let tokens: Vec<String> = pointer
            .split('/')
            .skip(1)
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect();
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();

        let ["batches", batch, rest @ ..] = tokens.as_slice() else {
            return ViolationLocation::Other;
        };
        let Ok(batch) = batch.parse::<usize>() else {
            return ViolationLocation::Other;
        };

        match rest {
            ["plates", plate, ..] => match plate.parse::<usize>() {
                Ok(plate) => ViolationLocation::Plate { batch, plate },
                Err(_) => ViolationLocation::Other,
            },
            [] | ["plates"] => ViolationLocation::Batch { batch },
            ["platemaps" | "barcode_platemap", ..] => ViolationLocation::Batch { batch },
            _ => ViolationLocation::Other,
        }
    }
}

/// A plate or batch removed by repair, with the violation that condemned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// `<batch_id>` or `<batch_id>.<plate_id>`
    pub node: String,
    pub violation: Violation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub plates: Vec<Removal>,
    pub batches: Vec<Removal>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.plates.is_empty() && self.batches.is_empty()
    }

    /// Every `(path, message)` record, plates first.
    pub fn audit(&self) -> impl Iterator<Item = &Violation> {
        self.plates
            .iter()
            .chain(self.batches.iter())
            .map(|removal| &removal.violation)
    }
}

pub struct SchemaRepairer {
    validator: jsonschema::Validator,
}

fn node_id(node: &Value, key: &str) -> String {
    node.get(key)
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string()
}

fn batches_mut(tree: &mut Value) -> Option<&mut Vec<Value>> {
    tree.get_mut("batches").and_then(Value::as_array_mut)
}

/// Keep the elements whose index is not listed, preserving order.
fn remove_indices(items: &mut Vec<Value>, doomed: &BTreeSet<usize>) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !doomed.contains(&index);
        index += 1;
        keep
    });
}

impl SchemaRepairer {
    pub fn new(schema: &Value) -> Result<Self> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| Error::InvalidSchema(e.to_string()))?;
        Ok(Self { validator })
    }

    pub fn is_valid(&self, tree: &Value) -> bool {
        self.validator.is_valid(tree)
    }

    /// Every violation of the schema, in validator order.
    pub fn violations(&self, tree: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(tree)
            .map(|err| Violation {
                path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }

    /// Prune invalid plates, then invalid batches, then require the rest to
    /// validate.
    ///
    /// Fails with [`Error::SchemaViolation`] when batches survive pruning
    /// but the tree still does not conform.
    pub fn repair(&self, tree: &mut Value) -> Result<RepairReport> {
        let mut report = RepairReport::default();
        self.prune_plates(tree, &mut report);
        self.prune_batches(tree, &mut report);

        let has_batches = tree
            .get("batches")
            .and_then(Value::as_array)
            .is_none_or(|batches| !batches.is_empty());
        if has_batches {
            let remaining = self.violations(tree);
            if !remaining.is_empty() {
                let count = remaining.len();
                error!("Tree still violates the schema after repair: {count} violation(s)", count: count);
                return Err(Error::SchemaViolation(remaining));
            }
        }

        let plates = report.plates.len();
        let batches = report.batches.len();
        info!(
            "Repair removed {plates} plate record(s) and {batches} batch record(s)",
            plates: plates,
            batches: batches
        );
        Ok(report)
    }

    fn prune_plates(&self, tree: &mut Value, report: &mut RepairReport) {
        let mut doomed: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for violation in self.violations(tree) {
            let ViolationLocation::Plate { batch, plate } =
                ViolationLocation::classify(&violation.path)
            else {
                continue;
            };
            let batch_node = &tree["batches"][batch];
            let node = format!(
                "{}.{}",
                node_id(batch_node, "batch_id"),
                node_id(&batch_node["plates"][plate], "plate_id")
            );
            let path = violation.path.as_str();
            let message = violation.message.as_str();
            warn!(
                "Deleting invalid plate {node}: {path} {message}",
                node: node.as_str(),
                path: path,
                message: message
            );

            doomed.entry(batch).or_default().insert(plate);
            report.plates.push(Removal { node, violation });
        }

        let Some(batches) = batches_mut(tree) else {
            return;
        };
        for (batch, plates) in doomed {
            if let Some(list) = batches
                .get_mut(batch)
                .and_then(|b| b.get_mut("plates"))
                .and_then(Value::as_array_mut)
            {
                remove_indices(list, &plates);
            }
        }
    }

    fn prune_batches(&self, tree: &mut Value, report: &mut RepairReport) {
        let mut doomed = BTreeSet::new();
        for violation in self.violations(tree) {
            let ViolationLocation::Batch { batch } = ViolationLocation::classify(&violation.path)
            else {
                continue;
            };
            let node = node_id(&tree["batches"][batch], "batch_id");
            let path = violation.path.as_str();
            let message = violation.message.as_str();
            warn!(
                "Deleting invalid batch {node}: {path} {message}",
                node: node.as_str(),
                path: path,
                message: message
            );

            doomed.insert(batch);
            report.batches.push(Removal { node, violation });
        }

        if let Some(batches) = batches_mut(tree) {
            remove_indices(batches, &doomed);
        }
    }
}
