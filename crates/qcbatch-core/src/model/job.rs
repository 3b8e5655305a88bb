use crate::slurm::SubmitError;
use std::path::{Path, PathBuf};

/// A per-molecule unit of work within one pipeline step.
///
/// A job owns its subfolders under the step's working directory and the
/// deterministic paths of every artifact generated for it. It has no
/// lifecycle beyond script submission; the pipeline does not track what the
/// scheduler does with it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub mol_id: String,
    pub step_name: String,
    /// `<output-dir>/working/<step>/input/<mol_id>`
    pub input_dir: PathBuf,
    /// `<output-dir>/working/<step>/output/<mol_id>`
    pub output_dir: PathBuf,
}

impl Job {
    /// `step_dir` is the step's working directory,
    /// `<output-dir>/working/<step>`.
    pub fn new(mol_id: &str, step_name: &str, step_dir: &Path) -> Self {
        Self {
            mol_id: mol_id.to_string(),
            step_name: step_name.to_string(),
            input_dir: step_dir.join("input").join(mol_id),
            output_dir: step_dir.join("output").join(mol_id),
        }
    }

    /// Scheduler job name, unique per step/molecule pair.
    pub fn name(&self) -> String {
        format!("{}_{}", self.step_name, self.mol_id)
    }

    pub fn geometry_file(&self) -> PathBuf {
        self.input_dir.join(format!("{}.xyz", self.mol_id))
    }

    pub fn orca_input_file(&self) -> PathBuf {
        self.input_dir.join(format!("{}.inp", self.mol_id))
    }

    pub fn batch_script(&self) -> PathBuf {
        self.input_dir.join(format!("{}.sbatch", self.mol_id))
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(format!("{}.out", self.mol_id))
    }
}

/// The result of one submission attempt. Failures are carried, not raised,
/// so that one rejected job never prevents the remaining submissions.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub job: Job,
    /// On success, the scheduler's stdout (the `Submitted batch job N` line).
    pub result: Result<String, SubmitError>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
