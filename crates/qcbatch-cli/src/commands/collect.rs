use crate::cli::CollectArgs;
use crate::error::Result;
use qcbatch::config::RunConfig;
use qcbatch::workflows;
use qcbatch::workspace::MoveOptions;

pub fn run(args: CollectArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)?;
    let options = MoveOptions {
        copy: args.keep_originals,
        overwrite: args.overwrite || config.main.overwrite,
    };

    let collected = workflows::collect::run(&config, options)?;

    if collected.is_empty() {
        println!("No output files found to collect.");
    } else {
        println!("Collected {} file(s):", collected.len());
        for path in &collected {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
