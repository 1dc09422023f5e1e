//! XML serializer.
//!
//! Repeated child names become repeated sibling elements, which is how XML
//! carries arrays. Scalars are escaped only when the tree marks them so.

use crate::error::Result;
use crate::serialize::{write_text, DocSerializer};
use crate::tree::{DocNode, DocTree};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct XmlSerializer {
    body: String,
    depth: usize,
}

impl XmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoded document, wrapped in its `<root>` element.
    pub fn document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        if self.body.is_empty() {
            out.push_str("<root/>\n");
        } else {
            out.push_str("<root>\n");
            out.push_str(&self.body);
            out.push_str("</root>\n");
        }
        out
    }

    fn indent(&mut self) {
        for _ in 0..=self.depth {
            self.body.push_str("  ");
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Child names come from identifiers and metadata keys; map anything that is
/// not a legal element name character to `_`.
fn element_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

impl DocSerializer for XmlSerializer {
    fn serialize_object(&mut self, tree: &DocTree) {
        for (name, node) in tree.children() {
            let tag = element_name(name);
            self.indent();
            match node {
                DocNode::Tree(child) if child.is_empty() => {
                    self.body.push_str(&format!("<{}/>\n", tag));
                }
                DocNode::Tree(_) => {
                    self.body.push_str(&format!("<{}>\n", tag));
                    self.depth += 1;
                    node.serialize_with(self);
                    self.depth -= 1;
                    self.indent();
                    self.body.push_str(&format!("</{}>\n", tag));
                }
                DocNode::Value(_) => {
                    self.body.push_str(&format!("<{}>", tag));
                    node.serialize_with(self);
                    self.body.push_str(&format!("</{}>\n", tag));
                }
            }
        }
    }

    fn serialize_scalar(&mut self, value: &str, escape: bool) {
        if escape {
            self.body.push_str(&xml_escape(value));
        } else {
            self.body.push_str(value);
        }
    }

    fn file_extension(&self) -> &str {
        "xml"
    }

    fn save_to_file(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        write_text(dir, base_name, self.file_extension(), &self.document())
    }
}
