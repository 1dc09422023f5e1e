//! Serializer contract and format dispatch.
//!
//! A serializer visits a [`DocTree`] and persists the result. Every
//! implementation must encode a container whose only child name repeats as an
//! array; consolidation depends on that to read id lists back.

pub mod json;
pub mod xml;

use crate::error::{DocGenError, Result, Stage};
use crate::tree::DocTree;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Visitor that turns a document tree into one target encoding.
pub trait DocSerializer {
    /// Encode a container (called for the root and every nested container).
    fn serialize_object(&mut self, tree: &DocTree);
    /// Encode a scalar leaf.
    fn serialize_scalar(&mut self, value: &str, escape: bool);
    fn file_extension(&self) -> &str;
    /// Write the encoded document to `<dir>/<base_name>.<ext>`.
    fn save_to_file(&self, dir: &Path, base_name: &str) -> Result<PathBuf>;
}

/// Output encodings known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xml,
}

impl OutputFormat {
    pub fn serializer(self) -> Box<dyn DocSerializer> {
        match self {
            OutputFormat::Json => Box::new(json::JsonSerializer::new()),
            OutputFormat::Xml => Box::new(xml::XmlSerializer::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = DocGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            _ => Err(DocGenError::UnknownFormat(s.to_string())),
        }
    }
}

/// Create a serializer for the given format name.
pub fn create_serializer(format: &str) -> Result<Box<dyn DocSerializer>> {
    Ok(format.parse::<OutputFormat>()?.serializer())
}

/// Serialize `tree` once per format into `dir`.
pub fn write_document(
    tree: &DocTree,
    dir: &Path,
    base_name: &str,
    formats: &[OutputFormat],
) -> Result<()> {
    for format in formats {
        let mut serializer = format.serializer();
        tree.serialize_with(serializer.as_mut());
        serializer.save_to_file(dir, base_name)?;
    }
    Ok(())
}

/// Shared tail of `save_to_file`: make the directory and write the text.
pub(crate) fn write_text(dir: &Path, base_name: &str, ext: &str, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| DocGenError::Write {
        stage: Stage::Generate,
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{}.{}", base_name, ext));
    fs::write(&path, text).map_err(|source| DocGenError::Write {
        stage: Stage::Generate,
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
