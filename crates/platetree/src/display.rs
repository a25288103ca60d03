//! Box-drawing rendering of a structure file.
//!
//! ```
//! use platetree::display::{TreeNode, format_tree};
//!
//! let root = TreeNode::new("source_4")
//!     .with_child(TreeNode::new("Batch1").with_child(TreeNode::new("P1")))
//!     .with_child(TreeNode::new("Batch2"));
//!
//! assert_eq!(
//!     format_tree(&root),
//!     "source_4\n├─┬ Batch1\n│ └── P1\n└── Batch2\n"
//! );
//! ```

use std::fmt;

use crate::serialize::{BatchRecord, DatasetRecord, PlateRecord};

#[derive(Debug, Clone)]
pub struct TreeNode {
    /// May span several lines
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: TreeNode) {
        self.children.push(child);
    }
}

pub fn format_tree(root: &TreeNode) -> String {
    let mut output = String::new();
    output.push_str(&root.label);
    output.push('\n');
    format_children(&mut output, &root.children, "");
    output
}

fn format_children(output: &mut String, children: &[TreeNode], prefix: &str) {
    let last = children.len().saturating_sub(1);

    for (index, child) in children.iter().enumerate() {
        let is_last = index == last;
        let (connector, continuation) = match (child.children.is_empty(), is_last) {
            (true, true) => ("└──", ' '),
            (true, false) => ("├──", '│'),
            (false, true) => ("└─┬", ' '),
            (false, false) => ("├─┬", '│'),
        };

        for (line_idx, line) in child.label.lines().enumerate() {
            output.push_str(prefix);
            if line_idx == 0 {
                output.push_str(connector);
                output.push(' ');
            } else {
                output.push(continuation);
                output.push_str(&" ".repeat(connector.chars().count()));
            }
            output.push_str(line);
            output.push('\n');
        }

        if !child.children.is_empty() {
            let prefix = format!("{prefix}{continuation} ");
            format_children(output, &child.children, &prefix);
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_tree(self))
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

fn plate_node(plate: &PlateRecord) -> TreeNode {
    let sites: usize = plate.wells.iter().map(|w| w.sites.len()).sum();
    let mut label = format!(
        "{}: {}, {}, {}",
        plate.plate_id,
        plural(plate.wells.len(), "well", "wells"),
        plural(sites, "site", "sites"),
        plural(plate.images.len(), "image", "images"),
    );
    if !plate.profiles.is_empty() {
        let kinds: Vec<&str> = plate.profiles.keys().map(String::as_str).collect();
        label.push_str(&format!("\nprofiles: {}", kinds.join(", ")));
    }
    if !plate.correction_files.is_empty() {
        let channels: Vec<&str> = plate.correction_files.keys().map(String::as_str).collect();
        label.push_str(&format!("\nillum: {}", channels.join(", ")));
    }
    TreeNode::new(label)
}

fn batch_node(batch: &BatchRecord) -> TreeNode {
    let mut label = format!(
        "{} ({}, {})",
        batch.batch_id,
        plural(batch.plates.len(), "plate", "plates"),
        plural(batch.platemaps.len(), "platemap", "platemaps"),
    );
    if batch.barcode_platemap.is_some() {
        label.push_str(" [barcode]");
    }
    let mut node = TreeNode::new(label);
    for plate in &batch.plates {
        node.add_child(plate_node(plate));
    }
    node
}

/// Dataset → batches → plates, with per-plate counts.
pub fn dataset_tree(record: &DatasetRecord) -> TreeNode {
    let mut root = TreeNode::new(format!(
        "{} ({})",
        record.dataset_id,
        plural(record.batches.len(), "batch", "batches")
    ));
    for batch in &record.batches {
        root.add_child(batch_node(batch));
    }
    root
}
