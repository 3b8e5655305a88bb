use crate::cli::CheckArgs;
use crate::error::Result;
use qcbatch::config::RunConfig;
use qcbatch::io::manifest;
use tracing::info;

/// Validates the configuration and manifest and prints the resolved plan.
/// Nothing is written and nothing is submitted.
pub fn run(args: CheckArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)?;
    let entries = manifest::read_manifest(&config.main.input_manifest)?;
    let molecules = manifest::load_molecules(&entries)?;
    info!("Configuration and manifest are valid");

    println!("Configuration: {}", args.config.display());
    println!("Output tree:   {}", config.main.output_dir.display());
    println!(
        "Scheduler:     partition={}, walltime={}, submit via {}",
        config.scheduler.partition,
        config.scheduler.walltime,
        config.scheduler.submit_command.display()
    );
    println!();

    println!("Steps ({}):", config.steps.len());
    for step in &config.steps {
        println!("  {:<16} [{}]", step.name, step.kind);
    }
    println!();

    println!("Molecules ({}):", molecules.len());
    for molecule in &molecules {
        println!(
            "  {:<16} {} atom(s), charge {}, multiplicity {}",
            molecule.id,
            molecule.atoms.len(),
            molecule.charge,
            molecule.multiplicity
        );
    }
    println!();
    println!(
        "Plan: {} script(s) would be generated and submitted.",
        config.steps.len() * molecules.len()
    );

    Ok(())
}
