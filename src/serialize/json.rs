//! JSON serializer, the default encoding and the one consolidation reads back.
//!
//! Empty containers become `null`, repeated names become arrays, everything
//! else becomes an object with keys in first-occurrence order. JSON string
//! escaping is applied uniformly, so the escape flag has no further effect.

use crate::error::{DocGenError, Result, Stage};
use crate::serialize::{write_text, DocSerializer};
use crate::tree::{DocNode, DocTree, Shape};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct JsonSerializer {
    value: Value,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

fn encode(node: &DocNode) -> Value {
    let mut nested = JsonSerializer::new();
    node.serialize_with(&mut nested);
    nested.value
}

fn encode_all(nodes: &[&DocNode]) -> Value {
    Value::Array(nodes.iter().map(|node| encode(node)).collect())
}

impl DocSerializer for JsonSerializer {
    fn serialize_object(&mut self, tree: &DocTree) {
        self.value = match tree.shape() {
            Shape::Empty => Value::Null,
            Shape::Array(items) => encode_all(&items),
            Shape::Object(fields) => {
                let mut map = Map::new();
                for (name, nodes) in fields {
                    let value = match nodes.as_slice() {
                        [single] => encode(single),
                        many => encode_all(many),
                    };
                    map.insert(name.to_string(), value);
                }
                Value::Object(map)
            }
        };
    }

    fn serialize_scalar(&mut self, value: &str, _escape: bool) {
        self.value = Value::String(value.to_string());
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn save_to_file(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        // A document root is always written as an object.
        let root = match &self.value {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        let path = dir.join(format!("{}.{}", base_name, self.file_extension()));
        let text = to_pretty_text(&root, &path)?;
        write_text(dir, base_name, self.file_extension(), &text)
    }
}

/// Pretty JSON with a trailing newline; `path` only names the failed write.
fn to_pretty_text(value: &impl Serialize, path: &Path) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| DocGenError::Write {
        stage: Stage::Generate,
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    text.push('\n');
    Ok(text)
}

/// Convenience for callers that want the encoded value without a file.
pub fn to_value(tree: &DocTree) -> Value {
    let mut serializer = JsonSerializer::new();
    tree.serialize_with(&mut serializer);
    serializer.into_value()
}
