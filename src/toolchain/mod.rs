//! External toolchain: the markup converter and the site builder.
//!
//! Both steps run external programs through [`ProcessRunner`] and then copy
//! results into place. Every failure is fatal; output already copied by an
//! earlier, completed step is left where it is.

pub mod process;

use crate::error::{DocGenError, Result, Stage};
use process::ProcessRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Name of the staged site-builder tree under the stage directory.
pub const SITE_DIR: &str = "docusaurus";
const RENDERED_DOC: &str = "docs.mdx";
const PUBLISHED_DOC: &str = "generated-refdocs.mdx";
const PUBLISHED_IMAGES: &str = "generated-refdocs";

#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Directory holding the `convert` executable.
    pub bin_dir: PathBuf,
    pub template: PathBuf,
    pub npm: PathBuf,
    /// Destination tree for converted pages (`en-us/`, `menu/`).
    pub doc_root: PathBuf,
    /// Site-builder project copied into the stage before building.
    pub site_template: PathBuf,
    pub poll_interval: Duration,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from("bin"),
            template: PathBuf::from("bin/template/docs.mdx.in"),
            npm: PathBuf::from("npm"),
            doc_root: PathBuf::from("bin/doc_root"),
            site_template: PathBuf::from("Doc/docusaurus"),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ToolchainConfig {
    pub fn converter(&self) -> PathBuf {
        let name = if cfg!(windows) { "convert.exe" } else { "convert" };
        self.bin_dir.join(name)
    }
}

fn copy_file(from: &Path, to: &Path, stage: Stage) -> Result<()> {
    let copy_err = |source| DocGenError::Copy {
        stage,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(copy_err)?;
    }
    fs::copy(from, to).map_err(copy_err)?;
    Ok(())
}

/// Everything matched by `<dir>/<pattern>`, with `dir` taken literally.
fn glob_under(dir: &Path, pattern: &str, stage: Stage) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let paths = glob::glob(&full).map_err(|source| DocGenError::Glob {
        pattern: full.clone(),
        source,
    })?;
    let mut matched = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| DocGenError::Read {
            stage,
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        matched.push(path);
    }
    Ok(matched)
}

/// Copy the contents of `from` into `to`, keeping relative paths.
pub fn copy_tree(from: &Path, to: &Path, stage: Stage) -> Result<usize> {
    let mut copied = 0;
    for path in glob_under(from, "**/*", stage)? {
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(from).unwrap_or(&path);
        copy_file(&path, &to.join(relative), stage)?;
        copied += 1;
    }
    debug!("copied {} files from {} to {}", copied, from.display(), to.display());
    Ok(copied)
}

/// Remove `dir` and everything under it, if it exists.
pub fn purge(dir: &Path, stage: Stage) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(dir).map_err(|source| DocGenError::Remove {
        stage,
        path: dir.to_path_buf(),
        source,
    })
}

pub struct Toolchain {
    config: ToolchainConfig,
    runner: ProcessRunner,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        let runner = ProcessRunner::new(config.poll_interval);
        Self { config, runner }
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.runner = self.runner.with_cancel(flag);
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    fn published_dir(&self) -> PathBuf {
        self.config.doc_root.join("en-us")
    }

    /// Convert `<stage>/consolidated.json` into the rendered document and
    /// publish it with every staged image into the doc root. Returns the
    /// published document path.
    pub fn convert(&self, stage: &Path) -> Result<PathBuf> {
        let rendered = stage.join(RENDERED_DOC);
        let mut command = Command::new(self.config.converter());
        command
            .arg(&self.config.template)
            .arg(stage.join("consolidated.json"))
            .arg(&rendered)
            .arg("markdown");
        self.runner.run("convert", &mut command)?;

        let published = self.published_dir().join(PUBLISHED_DOC);
        copy_file(&rendered, &published, Stage::Convert)?;

        let image_dest = self.published_dir().join("img").join(PUBLISHED_IMAGES);
        purge(&image_dest, Stage::Convert)?;
        fs::create_dir_all(&image_dest).map_err(|source| DocGenError::Write {
            stage: Stage::Convert,
            path: image_dest.clone(),
            source,
        })?;

        let site = stage.join(SITE_DIR);
        let mut images = 0;
        for dir in glob_under(stage, "**/img", Stage::Convert)? {
            if !dir.is_dir() || dir.starts_with(&site) {
                continue;
            }
            for file in glob_under(&dir, "*", Stage::Convert)? {
                let Some(name) = file.file_name() else { continue };
                if file.is_file() {
                    copy_file(&file, &image_dest.join(name), Stage::Convert)?;
                    images += 1;
                }
            }
        }
        info!("Published {} and {} images", published.display(), images);
        Ok(published)
    }

    /// Stage the site template, merge the doc root into it, install and build,
    /// then copy the build output to `output`.
    pub fn build_site(&self, stage: &Path, output: &Path) -> Result<()> {
        let staging = stage.join(SITE_DIR);
        purge(&staging, Stage::SiteBuild)?;
        copy_tree(&self.config.site_template, &staging, Stage::SiteBuild)?;
        copy_tree(
            &self.published_dir(),
            &staging.join("public").join("en-us"),
            Stage::SiteBuild,
        )?;
        let sidebars = self.config.doc_root.join("menu").join("sidebars.js");
        if sidebars.is_file() {
            copy_file(
                &sidebars,
                &staging.join("public").join("menu").join("sidebars.js"),
                Stage::SiteBuild,
            )?;
        }

        for args in [&["install"][..], &["run", "build"]] {
            let mut command = Command::new(&self.config.npm);
            command.args(args).current_dir(&staging);
            self.runner.run(&format!("npm {}", args.join(" ")), &mut command)?;
        }

        let copied = copy_tree(&staging.join("build"), output, Stage::SiteBuild)?;
        info!("Copied {} site files to {}", copied, output.display());
        Ok(())
    }
}
