use crate::config::{ConfigError, RunConfig};
use crate::error::PipelineError;
use crate::model::{Job, Molecule, SubmissionOutcome};
use crate::progress::{Progress, ProgressReporter};
use crate::slurm::{self, JobOverrides, SlurmClient, SlurmHeader, Staging, SubmitError};
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fraction of the allocated per-core RAM handed to ORCA via `%maxcore`.
/// ORCA routinely exceeds its nominal memory estimate, so the batch slot is
/// kept larger than what ORCA is told it may use.
pub const ORCA_RAM_SCALING: f64 = 0.65;

/// The configuration of one ORCA calculation step, filtered down to the
/// keys an ORCA input file and its batch wrapper need. Building this view
/// is the only place where step keys are required, so a broken step fails
/// here, before any file is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OrcaStep {
    pub name: String,
    pub method: String,
    pub basis_set: String,
    pub additional_keywords: Option<String>,
    pub ram_per_core_mb: u32,
    pub cores_per_calculation: u32,
    pub walltime: Option<String>,
    pub blocks: BTreeMap<String, Vec<String>>,
    pub orca_version: String,
}

impl OrcaStep {
    pub fn from_config(config: &RunConfig, step_name: &str) -> Result<Self, ConfigError> {
        let step = config.step(step_name)?;
        if step.kind != "orca" {
            return Err(ConfigError::UnknownCalculation {
                step: step.name.clone(),
                kind: step.kind.clone(),
            });
        }

        Ok(Self {
            name: step.name.clone(),
            method: step
                .method
                .clone()
                .ok_or(ConfigError::MissingParameter("step.method"))?,
            basis_set: step
                .basis_set
                .clone()
                .ok_or(ConfigError::MissingParameter("step.basis-set"))?,
            additional_keywords: step.additional_keywords.clone(),
            ram_per_core_mb: step
                .ram_per_core_mb
                .ok_or(ConfigError::MissingParameter("step.ram-per-core-mb"))?,
            cores_per_calculation: step
                .cores_per_calculation
                .ok_or(ConfigError::MissingParameter("step.cores-per-calculation"))?,
            walltime: step.walltime.clone(),
            blocks: step.blocks.clone(),
            orca_version: config
                .main
                .orca_version
                .clone()
                .ok_or(ConfigError::MissingParameter("main.orca-version"))?,
        })
    }

    /// Amount of RAM ORCA is told to use per core.
    pub fn maxcore_mb(&self) -> u32 {
        (f64::from(self.ram_per_core_mb) * ORCA_RAM_SCALING) as u32
    }

    /// Renders the complete ORCA input file for one molecule: the keyword
    /// line of this step (and only this step), resource directives, the
    /// configured `%block` sections, and the inline geometry.
    pub fn render_input(&self, molecule: &Molecule) -> String {
        let mut lines = Vec::new();

        let mut keywords = format!("! {} {}", self.method, self.basis_set);
        if let Some(extra) = &self.additional_keywords {
            if !extra.is_empty() {
                keywords.push(' ');
                keywords.push_str(extra);
            }
        }
        lines.push(keywords);

        lines.push(format!("%maxcore {}", self.maxcore_mb()));
        lines.push(format!("%pal nprocs {} end", self.cores_per_calculation));
        for (block, args) in &self.blocks {
            lines.push(format!("%{block}"));
            for arg in args {
                lines.push(arg.clone());
            }
            lines.push("end".to_string());
        }
        lines.push("%output XYZFILE 1 end".to_string());

        lines.push(format!("* xyz {} {}", molecule.charge, molecule.multiplicity));
        lines.extend(molecule.coordinate_lines());
        lines.push("*".to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Writes the per-job artifacts for this step: a geometry copy, the
    /// ORCA input file, and the SLURM batch script. Artifacts are
    /// overwritten on rerun; their paths are deterministic per job.
    pub fn prepare_jobs(
        &self,
        config: &RunConfig,
        workspace: &Workspace,
        molecules: &[Molecule],
    ) -> Result<Vec<Job>, PipelineError> {
        let step_dir = workspace.step_dir(&self.name);
        let mut jobs = Vec::with_capacity(molecules.len());

        for molecule in molecules {
            let job = Job::new(&molecule.id, &self.name, &step_dir);

            write_artifact(&job.geometry_file(), &molecule.to_xyz())?;
            write_artifact(&job.orca_input_file(), &self.render_input(molecule))?;

            let header = SlurmHeader::from_config(
                &config.scheduler,
                &JobOverrides {
                    job_name: job.name(),
                    ntasks: Some(self.cores_per_calculation),
                    memory_per_core_mb: Some(self.ram_per_core_mb),
                    walltime: self.walltime.clone(),
                    log_path: Some(job.output_dir.join("slurm-%j.out")),
                },
            );
            let staging = Staging {
                input_dir: job.input_dir.clone(),
                output_dir: job.output_dir.clone(),
                stage_in: vec![format!("{}.inp", molecule.id)],
                commands: vec![
                    format!("module load chem/orca/{}", self.orca_version),
                    // ORCA demands its own absolute path for parallel runs.
                    format!(
                        "\"$(command -v orca)\" \"{id}.inp\" > \"{id}.out\"",
                        id = molecule.id
                    ),
                ],
            };
            write_artifact(&job.batch_script(), &slurm::render_batch_script(&header, &staging))?;

            debug!("Prepared ORCA job '{}' in {:?}", job.name(), job.input_dir);
            jobs.push(job);
        }

        info!(
            "Rendered {} ORCA input file(s) for step '{}'",
            jobs.len(),
            self.name
        );
        Ok(jobs)
    }

    /// Submits every prepared job, one after the other. A rejected
    /// submission is recorded in its outcome and the loop moves on; there
    /// is no retry.
    pub fn run_jobs(
        &self,
        client: &SlurmClient,
        jobs: &[Job],
        reporter: &ProgressReporter,
    ) -> Vec<SubmissionOutcome> {
        submit_sequentially(client, jobs, reporter, |job| {
            if !job.orca_input_file().is_file() {
                return Some(SubmitError::MissingScript {
                    path: job.orca_input_file(),
                });
            }
            None
        })
    }
}

/// Shared sequential submission loop for ORCA and CREST steps. The
/// `precheck` hook lets a step require extra artifacts beyond the batch
/// script itself.
pub(crate) fn submit_sequentially(
    client: &SlurmClient,
    jobs: &[Job],
    reporter: &ProgressReporter,
    precheck: impl Fn(&Job) -> Option<SubmitError>,
) -> Vec<SubmissionOutcome> {
    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        let result = match precheck(job) {
            Some(err) => Err(err),
            None => client.submit(&job.batch_script()),
        };
        if let Err(err) = &result {
            warn!("Submission failed for job '{}': {}", job.name(), err);
        }
        reporter.report(Progress::JobDone {
            mol_id: job.mol_id.clone(),
            success: result.is_ok(),
        });
        outcomes.push(SubmissionOutcome {
            job: job.clone(),
            result,
        });
    }
    outcomes
}

pub(crate) fn write_artifact(path: &Path, content: &str) -> Result<(), PipelineError> {
    fs::write(path, content).map_err(|source| PipelineError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    })
}
