//! Error type for every fatal condition in the pipeline.
//!
//! Skippable conditions (excluded items, unresolved backing functions, failed
//! snapshots) and diagnostics never surface here; they are logged and the run
//! continues. Everything in [`DocGenError`] aborts the current phase and names
//! the stage and path that failed.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline phase a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Generate,
    Consolidate,
    Convert,
    SiteBuild,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Generate => "generate",
            Stage::Consolidate => "consolidate",
            Stage::Convert => "convert",
            Stage::SiteBuild => "site build",
        })
    }
}

#[derive(Debug, Error)]
pub enum DocGenError {
    #[error("{stage}: failed to read {}", .path.display())]
    Read {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: failed to write {}", .path.display())]
    Write {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: failed to remove {}", .path.display())]
    Remove {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: failed to parse {}", .path.display())]
    Parse {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage}: malformed document {}: {reason}", .path.display())]
    Malformed {
        stage: Stage,
        path: PathBuf,
        reason: String,
    },

    #[error("{stage}: failed to copy {} to {}", .from.display(), .to.display())]
    Copy {
        stage: Stage,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{step}: failed to start {}", .program.display())]
    Spawn {
        step: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{step}: failed while waiting for {}", .program.display())]
    Wait {
        step: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{step}: process exited with {}", .code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    ExitStatus { step: String, code: Option<i32> },

    #[error("{step}: cancelled")]
    Cancelled { step: String },

    #[error("invalid config {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid glob pattern: {pattern}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("unknown output format: {0}. Use json or xml")]
    UnknownFormat(String),

    #[error("document has no child named `{0}`")]
    MissingChild(String),

    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T, E = DocGenError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_message_names_code() {
        let err = DocGenError::ExitStatus {
            step: "convert".to_string(),
            code: Some(3),
        };
        assert_eq!(err.to_string(), "convert: process exited with code 3");
    }

    #[test]
    fn exit_status_message_without_code() {
        let err = DocGenError::ExitStatus {
            step: "npm install".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "npm install: process exited with a signal");
    }

    #[test]
    fn copy_message_names_stage_and_paths() {
        let err = DocGenError::Copy {
            stage: Stage::Consolidate,
            from: PathBuf::from("stage/Foo/img/a.png"),
            to: PathBuf::from("out/img/a.png"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "consolidate: failed to copy stage/Foo/img/a.png to out/img/a.png"
        );
    }
}
