use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Step types the pipeline knows how to build.
pub const SUPPORTED_STEP_TYPES: &[&str] = &["orca", "crest"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error(
        "Unknown calculation type '{kind}' for step '{step}' (supported: {})",
        SUPPORTED_STEP_TYPES.join(", ")
    )]
    UnknownCalculation { step: String, kind: String },

    #[error("Step '{0}' is not defined in the configuration")]
    UnknownStep(String),

    #[error("Duplicate step name: '{0}'")]
    DuplicateStep(String),
}

/// The full run configuration, loaded once per invocation and read-only
/// afterwards. Steps are an ordered array (`[[step]]`) because the pipeline
/// executes them in declaration order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub main: MainSection,
    pub scheduler: SchedulerSection,
    #[serde(rename = "step", default)]
    pub steps: Vec<StepSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct MainSection {
    /// Root of the working-directory tree. Everything the pipeline writes
    /// lives under this path.
    pub output_dir: PathBuf,

    /// CSV manifest with `filename,charge,multiplicity` columns, one row per
    /// molecule. Geometry paths are resolved relative to the manifest.
    pub input_manifest: PathBuf,

    /// Required as soon as any ORCA step is configured; selects the module
    /// loaded in the generated batch scripts.
    pub orca_version: Option<String>,

    /// Allow file moves to replace existing destination files.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SchedulerSection {
    pub partition: String,

    #[serde(default = "default_nodes")]
    pub nodes: u32,

    /// Default task count per job; steps may override it with their own core
    /// counts.
    pub ntasks: u32,

    pub memory_per_core_mb: u32,

    /// Wall time in SLURM notation, e.g. `24:00:00` or `1-12:00:00`.
    pub walltime: String,

    /// Local scratch request per job, rendered as `#SBATCH --tmp`.
    pub scratch_size_mb: Option<u32>,

    /// The submission executable. Overridable so tests can point it at a
    /// stub instead of a real scheduler.
    #[serde(default = "default_submit_command")]
    pub submit_command: PathBuf,
}

fn default_nodes() -> u32 {
    1
}

fn default_submit_command() -> PathBuf {
    PathBuf::from("sbatch")
}

/// One pipeline step as written in the config file. Fields are optional here
/// because ORCA and CREST steps share this table; the typed views in
/// [`crate::orca`] and [`crate::crest`] extract the keys relevant to their
/// calculation type and reject everything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StepSection {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Wall-time override for this step only.
    pub walltime: Option<String>,

    // ORCA keys.
    pub method: Option<String>,
    pub basis_set: Option<String>,
    pub additional_keywords: Option<String>,
    pub ram_per_core_mb: Option<u32>,
    pub cores_per_calculation: Option<u32>,
    /// Extra `%block ... end` sections, e.g. `scf = ["MAXITER 150"]`.
    #[serde(default)]
    pub blocks: BTreeMap<String, Vec<String>>,

    // CREST keys.
    pub cores: Option<u32>,
    pub solvent: Option<String>,
    pub energy_window: Option<f64>,
}

impl RunConfig {
    /// Reads and validates a run configuration. Any failure here is fatal
    /// and happens before a single job is touched.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::MissingParameter("step"));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.is_empty() {
                return Err(ConfigError::MissingParameter("step.name"));
            }
            // Step names become directory names; a duplicate would collapse
            // two steps into one working subtree.
            if !seen.insert(step.name.as_str()) {
                return Err(ConfigError::DuplicateStep(step.name.clone()));
            }
            match step.kind.as_str() {
                "orca" => {
                    if self.main.orca_version.is_none() {
                        return Err(ConfigError::MissingParameter("main.orca-version"));
                    }
                }
                "crest" => {}
                other => {
                    return Err(ConfigError::UnknownCalculation {
                        step: step.name.clone(),
                        kind: other.to_string(),
                    });
                }
            }
        }

        if self.scheduler.walltime.is_empty() {
            return Err(ConfigError::MissingParameter("scheduler.walltime"));
        }

        Ok(())
    }

    pub fn step(&self, name: &str) -> Result<&StepSection, ConfigError> {
        self.steps
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownStep(name.to_string()))
    }
}
