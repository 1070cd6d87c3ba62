//! Canonical builder: walks a record unit against a schema descriptor.

use crate::element::{escape_text, Element, UTF8_BOM};
use crate::identifiers::{FieldPath, ProfileId};
use crate::report::{CanonicalReport, WarningCode};
use crate::schema::{SchemaDescriptor, SchemaEntry};
use crate::validation::ValidationError;

/// Node of a canonical tree. Leaves never carry empty text and groups never
/// carry zero children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalNode {
    /// Normalized field.
    Leaf {
        /// Local element name.
        name: &'static str,
        /// Normalized, non-empty text.
        text: String,
    },
    /// Group with at least one surviving child.
    Group {
        /// Local element name.
        name: &'static str,
        /// Children in schema order.
        children: Vec<CanonicalNode>,
    },
}

impl CanonicalNode {
    /// Element name of the node.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalNode::Leaf { name, .. } | CanonicalNode::Group { name, .. } => name,
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name());
        out.push('>');
        match self {
            CanonicalNode::Leaf { text, .. } => escape_text(text, out),
            CanonicalNode::Group { children, .. } => {
                for child in children {
                    child.write_to(out);
                }
            }
        }
        out.push_str("</");
        out.push_str(self.name());
        out.push('>');
    }

    /// Converts the node back into an element with the same names and text.
    pub fn to_element(&self) -> Element {
        match self {
            CanonicalNode::Leaf { name, text } => Element::with_text(*name, text.clone()),
            CanonicalNode::Group { name, children } => Element {
                children: children.iter().map(CanonicalNode::to_element).collect(),
                ..Element::new(*name)
            },
        }
    }
}

/// Canonical form of one record unit, before serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTree {
    /// Synthetic root tag.
    pub root: &'static str,
    /// Top-level nodes in schema order.
    pub children: Vec<CanonicalNode>,
}

impl CanonicalTree {
    /// Serializes the tree: no declaration, no whitespace, no attributes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push('<');
        out.push_str(self.root);
        if self.children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for child in &self.children {
                child.write_to(&mut out);
            }
            out.push_str("</");
            out.push_str(self.root);
            out.push('>');
        }
        let bytes = out.into_bytes();
        if bytes.starts_with(UTF8_BOM) {
            bytes[UTF8_BOM.len()..].to_vec()
        } else {
            bytes
        }
    }

    /// Element tree shaped like a record unit, carrying the canonical values.
    pub fn to_element(&self, unit: &str) -> Element {
        Element {
            children: self.children.iter().map(CanonicalNode::to_element).collect(),
            ..Element::new(unit)
        }
    }
}

/// Result of canonicalization.
#[derive(Debug, Clone)]
pub struct CanonicalizationResult {
    /// Canonical UTF-8 bytes for the record unit.
    pub bytes: Vec<u8>,
    /// Report describing pruned and unparsed fields.
    pub report: CanonicalReport,
}

/// Canonicalizer that emits deterministic bytes for one schema profile.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    schema: &'static SchemaDescriptor,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(SchemaDescriptor::default_profile())
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer for the provided descriptor.
    pub fn new(schema: &'static SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Creates a canonicalizer for a shipped profile.
    pub fn for_profile(profile: &ProfileId) -> Result<Self, ValidationError> {
        SchemaDescriptor::for_profile(profile).map(Self::new)
    }

    /// Descriptor in use.
    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    /// Builds the canonical tree of a record unit.
    ///
    /// The unit's signature fields are ignored.
    pub fn build_tree(&self, unit: &Element) -> (CanonicalTree, CanonicalReport) {
        let mut working = unit.clone();
        working.remove_children(self.schema.signature);

        let mut report = CanonicalReport::new(self.schema.profile_id());
        let mut path = Vec::new();
        let children = build_nodes(&working, self.schema.entries, &mut path, &mut report);
        let tree = CanonicalTree {
            root: self.schema.canonical_root,
            children,
        };
        (tree, report)
    }

    /// Produces canonical bytes + report.
    pub fn canonicalize(&self, unit: &Element) -> CanonicalizationResult {
        let (tree, report) = self.build_tree(unit);
        CanonicalizationResult {
            bytes: tree.to_bytes(),
            report,
        }
    }
}

fn build_nodes(
    source: &Element,
    entries: &'static [SchemaEntry],
    path: &mut Vec<&'static str>,
    report: &mut CanonicalReport,
) -> Vec<CanonicalNode> {
    let mut nodes = Vec::new();
    for entry in entries {
        let Some(child) = source.find_child(entry.name()) else {
            continue;
        };
        path.push(entry.name());
        match entry {
            SchemaEntry::Field(spec) => {
                let normalized = spec.kind.normalize(child.text());
                if normalized.passed_through {
                    report.warn(WarningCode::UnparsedDecimal, FieldPath::from_segments(path));
                }
                if normalized.text.is_empty() {
                    report.warn(WarningCode::PrunedField, FieldPath::from_segments(path));
                } else {
                    report.bump("emitted_fields");
                    nodes.push(CanonicalNode::Leaf {
                        name: spec.name,
                        text: normalized.text,
                    });
                }
            }
            SchemaEntry::Group(spec) => {
                let children = build_nodes(child, spec.children, path, report);
                if children.is_empty() {
                    report.warn(WarningCode::PrunedGroup, FieldPath::from_segments(path));
                } else {
                    nodes.push(CanonicalNode::Group {
                        name: spec.name,
                        children,
                    });
                }
            }
        }
        path.pop();
    }
    nodes
}
