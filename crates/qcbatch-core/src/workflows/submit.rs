use crate::config::{ConfigError, RunConfig};
use crate::crest::CrestStep;
use crate::error::PipelineError;
use crate::io::manifest;
use crate::model::SubmissionOutcome;
use crate::orca::OrcaStep;
use crate::progress::{Progress, ProgressReporter};
use crate::slurm::SlurmClient;
use crate::workspace::Workspace;
use tracing::info;

/// Runs the whole pipeline: scaffold the working tree, read the molecule
/// manifest and geometries, then for every configured step render all
/// scripts and submit them one at a time.
///
/// The returned list carries one outcome per (step, molecule) pair, in
/// submission order. Submission failures live inside the outcomes; an `Err`
/// from this function always means the run failed before or during script
/// generation, with nothing submitted for the failing step.
pub fn run(
    config: &RunConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<SubmissionOutcome>, PipelineError> {
    config.validate()?;

    info!("Reading molecule manifest {:?}", config.main.input_manifest);
    let entries = manifest::read_manifest(&config.main.input_manifest)?;
    let molecules = manifest::load_molecules(&entries)?;
    let job_ids: Vec<String> = molecules.iter().map(|m| m.id.clone()).collect();

    let workspace = Workspace::new(&config.main.output_dir);
    workspace.scaffold(config, &job_ids)?;

    let client = SlurmClient::new(&config.scheduler);
    let mut outcomes = Vec::new();

    for step in &config.steps {
        reporter.report(Progress::StepStart {
            name: step.name.clone(),
            jobs: molecules.len() as u64,
        });

        match step.kind.as_str() {
            "orca" => {
                let orca = OrcaStep::from_config(config, &step.name)?;
                let jobs = orca.prepare_jobs(config, &workspace, &molecules)?;
                outcomes.extend(orca.run_jobs(&client, &jobs, reporter));
            }
            "crest" => {
                let crest = CrestStep::from_config(config, &step.name)?;
                let jobs = crest.prepare_jobs(config, &workspace, &molecules)?;
                outcomes.extend(crest.run_jobs(&client, &jobs, reporter));
            }
            // validate() has already vetted the step types; this only fires
            // when a caller skips load() and builds the config by hand.
            other => {
                return Err(ConfigError::UnknownCalculation {
                    step: step.name.clone(),
                    kind: other.to_string(),
                }
                .into());
            }
        }

        reporter.report(Progress::StepFinish);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(
        "Pipeline finished: {} submission(s), {} failed",
        outcomes.len(),
        failed
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_pipeline_fixture(dir: &Path, submit_command: &Path) -> RunConfig {
        for id in ["water", "benzene"] {
            fs::write(
                dir.join(format!("{id}.xyz")),
                "1\ncomment\nH 0.0 0.0 0.0\n",
            )
            .unwrap();
        }
        fs::write(
            dir.join("molecules.csv"),
            "filename,charge,multiplicity\nwater.xyz,0,1\nbenzene.xyz,0,1\n",
        )
        .unwrap();

        toml::from_str(&format!(
            r#"
            [main]
            output-dir = "{root}"
            input-manifest = "{manifest}"
            orca-version = "5.0.4"

            [scheduler]
            partition = "compute"
            ntasks = 4
            memory-per-core-mb = 4000
            walltime = "24:00:00"
            submit-command = "{submit}"

            [[step]]
            name = "opt"
            type = "orca"
            method = "B3LYP"
            basis-set = "def2-SVP"
            ram-per-core-mb = 4000
            cores-per-calculation = 4

            [[step]]
            name = "conformers"
            type = "crest"
            cores = 2
            "#,
            root = dir.join("run").display(),
            manifest = dir.join("molecules.csv").display(),
            submit = submit_command.display(),
        ))
        .unwrap()
    }

    #[cfg(unix)]
    fn write_stub_submitter(dir: &Path, fail_on: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("sbatch-stub");
        fs::write(
            &path,
            format!(
                "#!/bin/sh\ncase \"$1\" in *{fail_on}*) echo 'submission denied' >&2; exit 1;; esac\necho \"Submitted batch job $$\"\n"
            ),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    #[cfg(unix)]
    fn full_pipeline_scaffolds_renders_and_submits_every_job() {
        let dir = tempdir().unwrap();
        let stub = write_stub_submitter(dir.path(), "no-such-molecule");
        let config = write_pipeline_fixture(dir.path(), &stub);

        let outcomes = run(&config, &ProgressReporter::new()).unwrap();

        // Two steps times two molecules, all submitted.
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(SubmissionOutcome::is_success));

        // One subfolder per declared job, per step.
        let workspace = Workspace::new(&config.main.output_dir);
        for step in ["opt", "conformers"] {
            let input_dir = workspace.step_dir(step).join("input");
            let mut names: Vec<_> = input_dir
                .read_dir()
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            names.sort();
            assert_eq!(names, vec!["benzene", "water"]);
        }

        // ORCA jobs carry input + script + geometry, CREST only geometry + script.
        let opt_water = workspace.step_dir("opt").join("input").join("water");
        assert!(opt_water.join("water.inp").is_file());
        assert!(opt_water.join("water.sbatch").is_file());
        let crest_water = workspace
            .step_dir("conformers")
            .join("input")
            .join("water");
        assert!(crest_water.join("water.xyz").is_file());
        assert!(!crest_water.join("water.inp").exists());
    }

    #[test]
    #[cfg(unix)]
    fn failed_submission_does_not_abort_remaining_jobs() {
        let dir = tempdir().unwrap();
        let stub = write_stub_submitter(dir.path(), "benzene");
        let config = write_pipeline_fixture(dir.path(), &stub);

        let outcomes = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(outcomes.len(), 4);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|o| o.job.mol_id == "benzene"));
        // Water was still submitted in both steps, after each benzene failure.
        assert!(
            outcomes
                .iter()
                .filter(|o| o.job.mol_id == "water")
                .all(SubmissionOutcome::is_success)
        );
    }

    #[test]
    fn manifest_errors_stop_the_run_before_any_submission() {
        let dir = tempdir().unwrap();
        let config = write_pipeline_fixture(dir.path(), Path::new("sbatch"));
        fs::remove_file(dir.path().join("molecules.csv")).unwrap();

        let result = run(&config, &ProgressReporter::new());
        assert!(matches!(result, Err(PipelineError::Manifest(_))));
    }

    #[test]
    #[cfg(unix)]
    fn progress_events_cover_every_step_and_job() {
        use std::sync::Mutex;

        let dir = tempdir().unwrap();
        let stub = write_stub_submitter(dir.path(), "no-such-molecule");
        let config = write_pipeline_fixture(dir.path(), &stub);

        let events: Mutex<Vec<Progress>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));

        run(&config, &reporter).unwrap();

        let events = events.lock().unwrap();
        let starts = events
            .iter()
            .filter(|e| matches!(e, Progress::StepStart { .. }))
            .count();
        let jobs = events
            .iter()
            .filter(|e| matches!(e, Progress::JobDone { .. }))
            .count();
        assert_eq!(starts, 2);
        assert_eq!(jobs, 4);
    }
}
