use crate::config::RunConfig;
use crate::model::Job;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Step subtree layout, one set per configured step.
const STEP_SUBDIRS: &[&str] = &["input", "output", "finished", "failed"];

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to create directory '{path}': {source}", path = path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source does not exist: '{path}'", path = path.display())]
    MissingSource { path: PathBuf },

    #[error(
        "Destination already exists: '{path}' (enable overwrite to replace it)",
        path = path.display()
    )]
    DestinationExists { path: PathBuf },

    #[error(
        "Failed to {action} '{src}' -> '{dst}': {source}",
        src = src.display(),
        dst = dst.display()
    )]
    FileOp {
        action: &'static str,
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list directory '{path}': {source}", path = path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How [`move_file`] treats its source and destination. Both knobs are
/// explicit: nothing is ever silently replaced, and the source is only
/// consumed when `copy` is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Leave the source in place and copy instead of moving.
    pub copy: bool,
    /// Replace an existing destination file. Without this flag an existing
    /// destination is an error.
    pub overwrite: bool,
}

/// Owner of the working-directory tree rooted at `main.output-dir`:
///
/// ```text
/// <root>/working/<step>/{input,output,finished,failed}/<mol_id>/
/// <root>/finished/raw_results/<mol_id>/
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Working directory of one step: `<root>/working/<step>`.
    pub fn step_dir(&self, step_name: &str) -> PathBuf {
        self.root.join("working").join(step_name)
    }

    pub fn raw_results_dir(&self) -> PathBuf {
        self.root.join("finished").join("raw_results")
    }

    /// Creates the full working tree: per step the four stage directories,
    /// plus one input and output subfolder per job id, plus the final
    /// results area. Idempotent; an existing tree is left as it is, only a
    /// warning is logged when the root is already populated.
    pub fn scaffold(&self, config: &RunConfig, job_ids: &[String]) -> Result<(), WorkspaceError> {
        if self.root.exists() && self.root.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false)
        {
            warn!(
                "Output directory {:?} is not empty; existing files are kept",
                self.root
            );
        }

        for step in &config.steps {
            let step_dir = self.step_dir(&step.name);
            for subdir in STEP_SUBDIRS {
                create_dir_all(&step_dir.join(subdir))?;
            }
            for job_id in job_ids {
                create_dir_all(&step_dir.join("input").join(job_id))?;
                create_dir_all(&step_dir.join("output").join(job_id))?;
            }
        }
        create_dir_all(&self.raw_results_dir())?;

        info!(
            "Scaffolded working tree under {:?} ({} steps, {} jobs)",
            self.root,
            config.steps.len(),
            job_ids.len()
        );
        Ok(())
    }

    /// Moves everything in a job's output directory into
    /// `finished/raw_results/<mol_id>/` and returns the collected paths.
    pub fn collect_outputs(
        &self,
        job: &Job,
        options: MoveOptions,
    ) -> Result<Vec<PathBuf>, WorkspaceError> {
        let target_dir = self.raw_results_dir().join(&job.mol_id);
        create_dir_all(&target_dir)?;

        let entries = job
            .output_dir
            .read_dir()
            .map_err(|source| WorkspaceError::ReadDir {
                path: job.output_dir.clone(),
                source,
            })?;

        let mut collected = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| WorkspaceError::ReadDir {
                path: job.output_dir.clone(),
                source,
            })?;
            let src = entry.path();
            if !src.is_file() {
                continue;
            }
            let dst = target_dir.join(entry.file_name());
            move_file(&src, &dst, options)?;
            collected.push(dst);
        }

        info!(
            "Collected {} output file(s) for job '{}' into {:?}",
            collected.len(),
            job.mol_id,
            target_dir
        );
        Ok(collected)
    }
}

/// Moves (or copies) a single file with the explicit policy of
/// [`MoveOptions`]. Parent directories of the destination are created as
/// needed. Falls back to copy-and-delete when a rename crosses filesystems.
pub fn move_file(src: &Path, dst: &Path, options: MoveOptions) -> Result<(), WorkspaceError> {
    if !src.is_file() {
        return Err(WorkspaceError::MissingSource {
            path: src.to_path_buf(),
        });
    }
    if dst.exists() && !options.overwrite {
        return Err(WorkspaceError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }
    if let Some(parent) = dst.parent() {
        create_dir_all(parent)?;
    }

    if options.copy {
        debug!("Copying {:?} -> {:?}", src, dst);
        fs::copy(src, dst).map_err(|source| WorkspaceError::FileOp {
            action: "copy",
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source,
        })?;
        return Ok(());
    }

    debug!("Moving {:?} -> {:?}", src, dst);
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    // Rename fails across mount points; stage through a copy instead.
    fs::copy(src, dst).map_err(|source| WorkspaceError::FileOp {
        action: "move",
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })?;
    fs::remove_file(src).map_err(|source| WorkspaceError::FileOp {
        action: "move",
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })
}

fn create_dir_all(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|source| WorkspaceError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
