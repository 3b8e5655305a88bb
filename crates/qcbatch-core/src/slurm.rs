use crate::config::SchedulerSection;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Batch script not found: '{path}'", path = path.display())]
    MissingScript { path: PathBuf },

    #[error(
        "Submit command '{command}' could not be run: {source}",
        command = command.display()
    )]
    Spawn {
        command: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Submission of '{script}' was rejected ({status}): {stderr}",
        script = script.display()
    )]
    Rejected {
        script: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Per-job deviations from the global `[scheduler]` section. Steps override
/// core counts, memory, and wall time; everything else comes from the
/// filtered scheduler config unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOverrides {
    pub job_name: String,
    pub ntasks: Option<u32>,
    pub memory_per_core_mb: Option<u32>,
    pub walltime: Option<String>,
    /// Where the scheduler writes the job's own log (`#SBATCH --output`).
    pub log_path: Option<PathBuf>,
}

/// The scheduler-relevant view of the configuration: exactly the keys that
/// end up as `#SBATCH` directives, nothing else. Built by filtering the
/// `[scheduler]` section and merging per-job overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlurmHeader {
    pub job_name: String,
    pub partition: String,
    pub nodes: u32,
    pub ntasks: u32,
    pub memory_per_core_mb: u32,
    pub walltime: String,
    pub scratch_size_mb: Option<u32>,
    pub log_path: Option<PathBuf>,
}

impl SlurmHeader {
    pub fn from_config(scheduler: &SchedulerSection, overrides: &JobOverrides) -> Self {
        Self {
            job_name: overrides.job_name.clone(),
            partition: scheduler.partition.clone(),
            nodes: scheduler.nodes,
            ntasks: overrides.ntasks.unwrap_or(scheduler.ntasks),
            memory_per_core_mb: overrides
                .memory_per_core_mb
                .unwrap_or(scheduler.memory_per_core_mb),
            walltime: overrides
                .walltime
                .clone()
                .unwrap_or_else(|| scheduler.walltime.clone()),
            scratch_size_mb: scheduler.scratch_size_mb,
            log_path: overrides.log_path.clone(),
        }
    }

    /// Renders the `#SBATCH` directive block.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("#SBATCH --job-name={}", self.job_name),
            format!("#SBATCH --partition={}", self.partition),
            format!("#SBATCH --nodes={}", self.nodes),
            format!("#SBATCH --ntasks={}", self.ntasks),
            format!("#SBATCH --mem-per-cpu={}M", self.memory_per_core_mb),
            format!("#SBATCH --time={}", self.walltime),
        ];
        if let Some(scratch) = self.scratch_size_mb {
            lines.push(format!("#SBATCH --tmp={scratch}M"));
        }
        if let Some(log_path) = &self.log_path {
            lines.push(format!("#SBATCH --output={}", log_path.display()));
        }
        lines.join("\n")
    }
}

/// What a batch script stages and runs: inputs are copied from the job's
/// input directory to node-local scratch, the command runs there, and every
/// scratch file is copied back to the job's output directory.
#[derive(Debug, Clone)]
pub struct Staging {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File names (relative to `input_dir`) copied to scratch before the run.
    pub stage_in: Vec<String>,
    /// Shell lines executed inside the scratch directory.
    pub commands: Vec<String>,
}

/// Composes a complete batch script from a header and a staging plan.
pub fn render_batch_script(header: &SlurmHeader, staging: &Staging) -> String {
    let mut script = String::from("#!/usr/bin/env bash\n");
    script.push_str(&header.render());
    script.push_str("\n\nset -euo pipefail\n\n");

    script.push_str(&format!("INPUT_DIR=\"{}\"\n", staging.input_dir.display()));
    script.push_str(&format!(
        "OUTPUT_DIR=\"{}\"\n",
        staging.output_dir.display()
    ));
    script.push_str("SCRATCH_DIR=\"${TMPDIR:-/tmp}/${SLURM_JOB_ID:-$$}\"\n\n");

    script.push_str("mkdir -p \"$SCRATCH_DIR\" \"$OUTPUT_DIR\"\n");
    for file in &staging.stage_in {
        script.push_str(&format!("cp \"$INPUT_DIR/{file}\" \"$SCRATCH_DIR/\"\n"));
    }
    script.push_str("cd \"$SCRATCH_DIR\"\n\n");

    for command in &staging.commands {
        script.push_str(command);
        script.push('\n');
    }

    script.push_str("\ncp -r \"$SCRATCH_DIR\"/. \"$OUTPUT_DIR/\"\n");
    script.push_str("rm -rf \"$SCRATCH_DIR\"\n");
    script
}

/// The submission boundary. Wraps the configured submit executable
/// (`sbatch` unless overridden) and blocks until it returns.
#[derive(Debug, Clone)]
pub struct SlurmClient {
    submit_command: PathBuf,
}

impl SlurmClient {
    pub fn new(scheduler: &SchedulerSection) -> Self {
        Self {
            submit_command: scheduler.submit_command.clone(),
        }
    }

    /// Submits one batch script. A non-zero exit status is an error carrying
    /// the scheduler's stderr; on success the trimmed stdout (the
    /// `Submitted batch job N` line) is returned.
    pub fn submit(&self, script: &Path) -> Result<String, SubmitError> {
        if !script.is_file() {
            return Err(SubmitError::MissingScript {
                path: script.to_path_buf(),
            });
        }

        debug!("Running {:?} {:?}", self.submit_command, script);
        let output = Command::new(&self.submit_command)
            .arg(script)
            .output()
            .map_err(|source| SubmitError::Spawn {
                command: self.submit_command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SubmitError::Rejected {
                script: script.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Submitted {:?}: {}", script, stdout);
        Ok(stdout)
    }
}
