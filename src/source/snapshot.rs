//! Offline object model loaded from a JSON dump of the editor.

use crate::error::{DocGenError, Result, Stage};
use crate::source::{
    ClassDef, EnumDef, FunctionDef, ObjectModel, SignatureDef, SourceObject, StructDef,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelSnapshot {
    pub classes: Vec<ClassDef>,
    pub structs: Vec<StructDef>,
    pub enums: Vec<EnumDef>,
    pub functions: Vec<FunctionDef>,
    pub signatures: Vec<SignatureDef>,
    pub objects: Vec<SourceObject>,
    #[serde(skip)]
    index: NameIndex,
}

#[derive(Debug, Default)]
struct NameIndex {
    classes: HashMap<String, usize>,
    structs: HashMap<String, usize>,
    enums: HashMap<String, usize>,
    functions: HashMap<String, usize>,
    signatures: HashMap<String, usize>,
}

fn index_by<T>(items: &[T], name: impl Fn(&T) -> String) -> HashMap<String, usize> {
    // Later entries win so a merged snapshot can override an earlier one.
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (name(item), i))
        .collect()
}

impl ModelSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| DocGenError::Read {
            stage: Stage::Load,
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }

    /// Parse a snapshot; `path` is only used for error reporting.
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self> {
        let mut snapshot: Self =
            serde_json::from_str(text).map_err(|source| DocGenError::Parse {
                stage: Stage::Load,
                path: path.to_path_buf(),
                source,
            })?;
        snapshot.reindex();
        Ok(snapshot)
    }

    /// Load and merge several snapshot files, in order.
    pub fn load_all(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut merged = Self::default();
        for path in paths {
            merged.merge(Self::load(path.as_ref())?);
        }
        Ok(merged)
    }

    pub fn merge(&mut self, other: ModelSnapshot) {
        self.classes.extend(other.classes);
        self.structs.extend(other.structs);
        self.enums.extend(other.enums);
        self.functions.extend(other.functions);
        self.signatures.extend(other.signatures);
        self.objects.extend(other.objects);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = NameIndex {
            classes: index_by(&self.classes, |c| c.name.clone()),
            structs: index_by(&self.structs, |s| s.name.clone()),
            enums: index_by(&self.enums, |e| e.name.clone()),
            functions: index_by(&self.functions, FunctionDef::key),
            signatures: index_by(&self.signatures, |s| s.name.clone()),
        };
    }
}

impl ObjectModel for ModelSnapshot {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.index.classes.get(name).map(|&i| &self.classes[i])
    }

    fn script_struct(&self, name: &str) -> Option<&StructDef> {
        self.index.structs.get(name).map(|&i| &self.structs[i])
    }

    fn enumeration(&self, name: &str) -> Option<&EnumDef> {
        self.index.enums.get(name).map(|&i| &self.enums[i])
    }

    fn function(&self, key: &str) -> Option<&FunctionDef> {
        self.index.functions.get(key).map(|&i| &self.functions[i])
    }

    fn signature(&self, name: &str) -> Option<&SignatureDef> {
        self.index.signatures.get(name).map(|&i| &self.signatures[i])
    }
}
