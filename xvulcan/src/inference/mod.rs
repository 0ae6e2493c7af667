//! Damage-classification launch
//!
//! The classifier itself is an opaque external program. This module only
//! describes a request (input mosaics, footprints, output path) and hands it
//! to an [`InferenceLauncher`].

use crate::store::JobId;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Inputs and output destination of one classification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub job_id: JobId,
    pub pre_mosaic: PathBuf,
    pub post_mosaic: PathBuf,
    pub footprints: PathBuf,
    pub output: PathBuf,
}

/// Errors that can occur while launching inference.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Inference launcher unavailable: {0}")]
    Unavailable(String),
}

/// Starts a classification run and waits for it to finish.
pub trait InferenceLauncher: Send + Sync {
    fn launch<'a>(
        &'a self,
        request: &'a InferenceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), InferenceError>> + Send + 'a>>;
}

/// Runs a local program with the classifier's command-line contract:
///
/// ```text
/// <program> <args...> --pre_directory <dir> --post_directory <dir>
///           --bldg_polys <file> --output_file <file>
/// ```
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Leading arguments placed before the request arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument list for `request`.
    pub fn arguments(&self, request: &InferenceRequest) -> Vec<String> {
        let dir_of = |path: &PathBuf| {
            path.parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        let mut args = self.args.clone();
        args.extend([
            "--pre_directory".to_string(),
            dir_of(&request.pre_mosaic),
            "--post_directory".to_string(),
            dir_of(&request.post_mosaic),
            "--bldg_polys".to_string(),
            request.footprints.display().to_string(),
            "--output_file".to_string(),
            request.output.display().to_string(),
        ]);
        args
    }

    async fn run(&self, request: &InferenceRequest) -> Result<(), InferenceError> {
        let args = self.arguments(request);
        info!(job_id = %request.job_id, program = %self.program, "Launching inference");
        debug!(?args, "Inference arguments");

        if let Some(parent) = request.output.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %parent.display(), error = %e, "Could not create output directory");
            }
        }

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| InferenceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InferenceError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(job_id = %request.job_id, "Inference finished");
        Ok(())
    }
}

impl InferenceLauncher for CommandLauncher {
    fn launch<'a>(
        &'a self,
        request: &'a InferenceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), InferenceError>> + Send + 'a>> {
        Box::pin(self.run(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(root: &std::path::Path) -> InferenceRequest {
        InferenceRequest {
            job_id: JobId::new("j1"),
            pre_mosaic: root.join("j1/pre/j1_pre_merged.tif"),
            post_mosaic: root.join("j1/post/j1_post_merged.tif"),
            footprints: root.join("j1/in_polys/j1_polys.geojson"),
            output: root.join("j1/output/j1_damage.geojson"),
        }
    }

    #[test]
    fn test_arguments_follow_classifier_contract() {
        let launcher = CommandLauncher::new("python").with_args(["handler.py"]);
        let args = launcher.arguments(&request(std::path::Path::new("/data")));

        assert_eq!(
            args,
            vec![
                "handler.py",
                "--pre_directory",
                "/data/j1/pre",
                "--post_directory",
                "/data/j1/post",
                "--bldg_polys",
                "/data/j1/in_polys/j1_polys.geojson",
                "--output_file",
                "/data/j1/output/j1_damage.geojson",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_program() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = CommandLauncher::new("true");
        launcher.launch(&request(dir.path())).await.unwrap();
        assert!(dir.path().join("j1/output").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = CommandLauncher::new("false");
        let err = launcher.launch(&request(dir.path())).await.unwrap_err();
        assert!(matches!(err, InferenceError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = CommandLauncher::new("xvulcan-no-such-classifier");
        let err = launcher.launch(&request(dir.path())).await.unwrap_err();
        assert!(matches!(err, InferenceError::Spawn { .. }));
    }
}
