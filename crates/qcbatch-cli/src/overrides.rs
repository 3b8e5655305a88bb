use crate::cli::RunArgs;
use crate::error::Result;
use qcbatch::config::RunConfig;
use tracing::debug;

/// Loads the run configuration and applies the CLI overrides on top of the
/// file values. CLI flags always win; the merged config is re-validated so
/// an override cannot smuggle in an inconsistent state.
pub fn load_run_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = RunConfig::load(&args.config)?;

    if let Some(output_dir) = &args.output_dir {
        debug!("Overriding main.output-dir with {:?}", output_dir);
        config.main.output_dir = output_dir.clone();
    }
    if let Some(submit_command) = &args.submit_command {
        debug!("Overriding scheduler.submit-command with {:?}", submit_command);
        config.scheduler.submit_command = submit_command.clone();
    }

    config.validate()?;
    Ok(config)
}
