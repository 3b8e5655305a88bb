use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::overrides;
use crate::progress::CliProgressHandler;
use qcbatch::progress::ProgressReporter;
use qcbatch::workflows;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let config = overrides::load_run_config(&args)?;
    info!(
        "Configuration loaded: {} step(s), output under {:?}",
        config.steps.len(),
        config.main.output_dir
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting submission pipeline...");
    let outcomes = workflows::submit::run(&config, &reporter)?;

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(stdout) => {
                println!("✓ {}: {}", outcome.job.name(), stdout);
            }
            Err(err) => {
                eprintln!("✗ {}: {}", outcome.job.name(), err);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::SubmissionsFailed {
            failed,
            total: outcomes.len(),
        });
    }

    println!("All {} job(s) submitted.", outcomes.len());
    Ok(())
}
