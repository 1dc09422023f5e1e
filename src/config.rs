//! Run settings, read from an optional `nodedocs.toml`.
//!
//! ```toml
//! title = "Node Reference"
//! stage_dir = "Saved/NodeDocs"
//! output_dir = "Saved/NodeDocs/site"
//! formats = ["json", "xml"]
//! content_path = "/Game"
//! threads = 0
//!
//! [render]
//! snapshot_dir = "Saved/Snapshots"
//! max_size = 1024
//!
//! [toolchain]
//! bin_dir = "bin"
//! template = "bin/template/docs.mdx.in"
//! npm = "npm"
//! doc_root = "bin/doc_root"
//! site_template = "Doc/docusaurus"
//! poll_interval_ms = 100
//!
//! [diagnostics]
//! teamcity = false
//! ```

use crate::error::{DocGenError, Result, Stage};
use crate::generate::GeneratorOptions;
use crate::serialize::OutputFormat;
use crate::toolchain::ToolchainConfig;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "nodedocs.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub title: String,
    pub stage_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Format names, checked when converted to [`GeneratorOptions`].
    pub formats: Vec<String>,
    pub content_path: String,
    pub threads: usize,
    pub render: RenderSettings,
    pub toolchain: ToolchainSettings,
    pub diagnostics: DiagnosticSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Node Reference".to_string(),
            stage_dir: PathBuf::from("nodedocs-stage"),
            output_dir: PathBuf::from("nodedocs-site"),
            formats: vec!["json".to_string()],
            content_path: String::new(),
            threads: 0,
            render: RenderSettings::default(),
            toolchain: ToolchainSettings::default(),
            diagnostics: DiagnosticSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Pre-captured snapshots; no images are produced without one.
    pub snapshot_dir: Option<PathBuf>,
    pub max_size: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            max_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
    pub bin_dir: PathBuf,
    pub template: PathBuf,
    pub npm: PathBuf,
    pub doc_root: PathBuf,
    pub site_template: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        let defaults = ToolchainConfig::default();
        Self {
            bin_dir: defaults.bin_dir,
            template: defaults.template,
            npm: defaults.npm,
            doc_root: defaults.doc_root,
            site_template: defaults.site_template,
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticSettings {
    /// Echo diagnostics as TeamCity service messages.
    pub teamcity: bool,
}

impl Settings {
    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(DocGenError::Read {
                stage: Stage::Load,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| DocGenError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        self.formats.iter().map(|f| f.parse()).collect()
    }

    pub fn generator_options(&self) -> Result<GeneratorOptions> {
        Ok(GeneratorOptions {
            title: self.title.clone(),
            formats: self.output_formats()?,
            threads: self.threads,
            max_image_size: self.render.max_size,
            teamcity: self.diagnostics.teamcity,
        })
    }

    pub fn toolchain_config(&self) -> ToolchainConfig {
        let t = &self.toolchain;
        ToolchainConfig {
            bin_dir: t.bin_dir.clone(),
            template: t.template.clone(),
            npm: t.npm.clone(),
            doc_root: t.doc_root.clone(),
            site_template: t.site_template.clone(),
            poll_interval: Duration::from_millis(t.poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(settings.toolchain.template, PathBuf::from("bin/template/docs.mdx.in"));
        assert_eq!(settings.toolchain_config().converter(), ToolchainConfig::default().converter());
        assert_eq!(settings.output_formats().unwrap(), [OutputFormat::Json]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            title = "Game API"
            formats = ["json", "xml"]

            [render]
            snapshot_dir = "shots"

            [toolchain]
            npm = "/usr/bin/npm"
            poll_interval_ms = 250
            "#,
            Path::new("nodedocs.toml"),
        )
        .unwrap();
        assert_eq!(settings.title, "Game API");
        assert_eq!(settings.render.max_size, 1024);
        assert_eq!(settings.render.snapshot_dir, Some(PathBuf::from("shots")));
        let toolchain = settings.toolchain_config();
        assert_eq!(toolchain.npm, PathBuf::from("/usr/bin/npm"));
        assert_eq!(toolchain.poll_interval, Duration::from_millis(250));
        assert_eq!(toolchain.bin_dir, PathBuf::from("bin"));
        let options = settings.generator_options().unwrap();
        assert_eq!(options.formats, [OutputFormat::Json, OutputFormat::Xml]);
    }

    #[test]
    fn unknown_keys_and_formats_are_rejected() {
        let path = Path::new("nodedocs.toml");
        assert!(matches!(
            Settings::from_toml_str("titel = \"x\"", path),
            Err(DocGenError::Config { .. })
        ));
        let settings = Settings::from_toml_str("formats = [\"yaml\"]", path).unwrap();
        assert!(matches!(
            settings.output_formats(),
            Err(DocGenError::UnknownFormat(f)) if f == "yaml"
        ));
    }
}
