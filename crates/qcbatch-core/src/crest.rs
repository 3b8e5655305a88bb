use crate::config::{ConfigError, RunConfig};
use crate::error::PipelineError;
use crate::model::{Job, Molecule, SubmissionOutcome};
use crate::orca::{submit_sequentially, write_artifact};
use crate::progress::ProgressReporter;
use crate::slurm::{self, JobOverrides, SlurmClient, SlurmHeader, Staging, SubmitError};
use crate::workspace::Workspace;
use tracing::{debug, info};

/// The configuration of one CREST conformer-search step. CREST takes no
/// input file of its own; the whole calculation is a command line over the
/// staged XYZ geometry, so one SLURM script per molecule is the only
/// artifact besides the geometry itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CrestStep {
    pub name: String,
    pub cores: u32,
    pub solvent: Option<String>,
    pub energy_window: Option<f64>,
    pub walltime: Option<String>,
}

impl CrestStep {
    pub fn from_config(config: &RunConfig, step_name: &str) -> Result<Self, ConfigError> {
        let step = config.step(step_name)?;
        if step.kind != "crest" {
            return Err(ConfigError::UnknownCalculation {
                step: step.name.clone(),
                kind: step.kind.clone(),
            });
        }

        Ok(Self {
            name: step.name.clone(),
            cores: step
                .cores
                .ok_or(ConfigError::MissingParameter("step.cores"))?,
            solvent: step.solvent.clone(),
            energy_window: step.energy_window,
            walltime: step.walltime.clone(),
        })
    }

    /// The CREST invocation for one molecule. Charge and spin are passed on
    /// the command line; CREST wants unpaired electrons, not the
    /// multiplicity.
    pub fn command_line(&self, molecule: &Molecule) -> String {
        let mut command = format!(
            "crest \"{id}.xyz\" --chrg {charge} --uhf {uhf} -T {cores}",
            id = molecule.id,
            charge = molecule.charge,
            uhf = molecule.unpaired_electrons(),
            cores = self.cores,
        );
        if let Some(solvent) = &self.solvent {
            command.push_str(&format!(" --alpb {solvent}"));
        }
        if let Some(window) = self.energy_window {
            command.push_str(&format!(" --ewin {window}"));
        }
        command.push_str(&format!(" > \"{}.out\"", molecule.id));
        command
    }

    /// Writes per-job artifacts: the staged geometry and the batch script
    /// wrapping the CREST command. No batching across molecules.
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

            let header = SlurmHeader::from_config(
                &config.scheduler,
                &JobOverrides {
                    job_name: job.name(),
                    ntasks: Some(self.cores),
                    memory_per_core_mb: None,
                    walltime: self.walltime.clone(),
                    log_path: Some(job.output_dir.join("slurm-%j.out")),
                },
            );
            let staging = Staging {
                input_dir: job.input_dir.clone(),
                output_dir: job.output_dir.clone(),
                stage_in: vec![format!("{}.xyz", molecule.id)],
                commands: vec![self.command_line(molecule)],
            };
            write_artifact(&job.batch_script(), &slurm::render_batch_script(&header, &staging))?;

            debug!("Prepared CREST job '{}' in {:?}", job.name(), job.input_dir);
            jobs.push(job);
        }

        info!(
            "Rendered {} CREST script(s) for step '{}'",
            jobs.len(),
            self.name
        );
        Ok(jobs)
    }

    /// Sequential submission, mirroring the ORCA step: failures are
    /// per-job data, never a reason to stop.
    pub fn run_jobs(
        &self,
        client: &SlurmClient,
        jobs: &[Job],
        reporter: &ProgressReporter,
    ) -> Vec<SubmissionOutcome> {
        submit_sequentially(client, jobs, reporter, |job| {
            if !job.geometry_file().is_file() {
                return Some(SubmitError::MissingScript {
                    path: job.geometry_file(),
                });
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Atom;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn crest_config(root: &Path) -> RunConfig {
        toml::from_str(&format!(
            r#"
            [main]
            output-dir = "{}"
            input-manifest = "molecules.csv"

            [scheduler]
            partition = "compute"
            ntasks = 4
            memory-per-core-mb = 4000
            walltime = "24:00:00"

            [[step]]
            name = "conformers"
            type = "crest"
            cores = 8
            solvent = "water"
            energy-window = 6.0
            walltime = "12:00:00"
            "#,
            root.display()
        ))
        .unwrap()
    }

    fn radical() -> Molecule {
        Molecule {
            id: "methyl".to_string(),
            atoms: vec![Atom {
                element: "C".to_string(),
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }],
            charge: 0,
            multiplicity: 2,
        }
    }

    #[test]
    fn command_line_carries_charge_spin_and_options() {
        let dir = tempdir().unwrap();
        let config = crest_config(dir.path());
        let step = CrestStep::from_config(&config, "conformers").unwrap();

        let command = step.command_line(&radical());
        assert!(command.starts_with("crest \"methyl.xyz\""));
        assert!(command.contains("--chrg 0"));
        assert!(command.contains("--uhf 1"));
        assert!(command.contains("-T 8"));
        assert!(command.contains("--alpb water"));
        assert!(command.contains("--ewin 6"));
        assert!(command.ends_with("> \"methyl.out\""));
    }

    #[test]
    fn optional_flags_are_omitted_when_unset() {
        let dir = tempdir().unwrap();
        let mut config = crest_config(dir.path());
        config.steps[0].solvent = None;
        config.steps[0].energy_window = None;
        let step = CrestStep::from_config(&config, "conformers").unwrap();

        let command = step.command_line(&radical());
        assert!(!command.contains("--alpb"));
        assert!(!command.contains("--ewin"));
    }

    #[test]
    fn orca_step_is_rejected() {
        let dir = tempdir().unwrap();
        let mut config = crest_config(dir.path());
        config.steps[0].kind = "orca".to_string();
        config.steps[0].name = "opt".to_string();

        assert!(matches!(
            CrestStep::from_config(&config, "opt"),
            Err(ConfigError::UnknownCalculation { kind, .. }) if kind == "orca"
        ));
    }

    #[test]
    fn missing_cores_is_reported() {
        let dir = tempdir().unwrap();
        let mut config = crest_config(dir.path());
        config.steps[0].cores = None;

        assert!(matches!(
            CrestStep::from_config(&config, "conformers"),
            Err(ConfigError::MissingParameter("step.cores"))
        ));
    }

    #[test]
    fn prepare_jobs_writes_geometry_and_script_only() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run");
        let config = crest_config(&root);
        let workspace = Workspace::new(&root);
        workspace.scaffold(&config, &["methyl".to_string()]).unwrap();

        let step = CrestStep::from_config(&config, "conformers").unwrap();
        let jobs = step
            .prepare_jobs(&config, &workspace, &[radical()])
            .unwrap();

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(job.geometry_file().is_file());
        assert!(job.batch_script().is_file());
        assert!(!job.orca_input_file().exists());

        let script = fs::read_to_string(job.batch_script()).unwrap();
        assert!(script.contains("#SBATCH --job-name=conformers_methyl"));
        assert!(script.contains("#SBATCH --ntasks=8"));
        assert!(script.contains("#SBATCH --time=12:00:00"));
        assert!(script.contains("cp \"$INPUT_DIR/methyl.xyz\" \"$SCRATCH_DIR/\""));
        assert!(script.contains("crest \"methyl.xyz\""));
    }
}
