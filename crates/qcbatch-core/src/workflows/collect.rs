use crate::config::{ConfigError, RunConfig};
use crate::error::PipelineError;
use crate::model::Job;
use crate::workspace::{MoveOptions, Workspace, WorkspaceError};
use std::path::PathBuf;
use tracing::info;

/// Gathers whatever the final step's jobs have produced into
/// `finished/raw_results/<mol_id>/`.
///
/// The pipeline does not poll the scheduler, so collection is an explicit
/// second invocation once the cluster jobs are done. Only the last step is
/// collected; intermediate steps feed the ones after them and stay where
/// they are.
pub fn run(config: &RunConfig, options: MoveOptions) -> Result<Vec<PathBuf>, PipelineError> {
    let last_step = config
        .steps
        .last()
        .ok_or(ConfigError::MissingParameter("step"))?;

    let workspace = Workspace::new(&config.main.output_dir);
    let step_dir = workspace.step_dir(&last_step.name);
    let output_root = step_dir.join("output");

    let entries = output_root
        .read_dir()
        .map_err(|source| WorkspaceError::ReadDir {
            path: output_root.clone(),
            source,
        })?;

    let mut collected = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| WorkspaceError::ReadDir {
            path: output_root.clone(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let mol_id = entry.file_name().to_string_lossy().into_owned();
        let job = Job::new(&mol_id, &last_step.name, &step_dir);
        collected.extend(workspace.collect_outputs(&job, options)?);
    }

    info!(
        "Collected {} file(s) from step '{}' into {:?}",
        collected.len(),
        last_step.name,
        workspace.raw_results_dir()
    );
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_with_root(root: &Path) -> RunConfig {
        toml::from_str(&format!(
            r#"
            [main]
            output-dir = "{}"
            input-manifest = "molecules.csv"
            orca-version = "5.0.4"

            [scheduler]
            partition = "compute"
            ntasks = 4
            memory-per-core-mb = 4000
            walltime = "24:00:00"

            [[step]]
            name = "opt"
            type = "orca"

            [[step]]
            name = "sp"
            type = "orca"
            "#,
            root.display()
        ))
        .unwrap()
    }

    #[test]
    fn collects_only_the_final_steps_outputs() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run");
        let config = config_with_root(&root);
        let workspace = Workspace::new(&root);
        workspace
            .scaffold(&config, &["water".to_string()])
            .unwrap();

        let opt_out = workspace
            .step_dir("opt")
            .join("output")
            .join("water")
            .join("water.out");
        let sp_out = workspace
            .step_dir("sp")
            .join("output")
            .join("water")
            .join("water.out");
        fs::write(&opt_out, "intermediate").unwrap();
        fs::write(&sp_out, "final").unwrap();

        let collected = run(&config, MoveOptions::default()).unwrap();

        assert_eq!(collected.len(), 1);
        let target = workspace.raw_results_dir().join("water").join("water.out");
        assert_eq!(fs::read_to_string(&target).unwrap(), "final");
        // The intermediate step is untouched.
        assert!(opt_out.is_file());
        assert!(!sp_out.exists());
    }

    #[test]
    fn copy_mode_leaves_outputs_in_place() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run");
        let config = config_with_root(&root);
        let workspace = Workspace::new(&root);
        workspace
            .scaffold(&config, &["water".to_string()])
            .unwrap();

        let sp_out = workspace
            .step_dir("sp")
            .join("output")
            .join("water")
            .join("water.out");
        fs::write(&sp_out, "final").unwrap();

        run(
            &config,
            MoveOptions {
                copy: true,
                overwrite: false,
            },
        )
        .unwrap();

        assert!(sp_out.is_file());
        assert!(
            workspace
                .raw_results_dir()
                .join("water")
                .join("water.out")
                .is_file()
        );
    }

    #[test]
    fn missing_output_tree_is_surfaced() {
        let dir = tempdir().unwrap();
        let config = config_with_root(&dir.path().join("never-scaffolded"));

        let result = run(&config, MoveOptions::default());
        assert!(matches!(
            result,
            Err(PipelineError::Workspace(WorkspaceError::ReadDir { .. }))
        ));
    }
}
