use clap::Parser;
use tracing_subscriber::EnvFilter;

use autofill_harness::cli::commands::{
    cmd_check, cmd_list, cmd_run, cmd_seed, cmd_sync_flags, load_pages,
};
use autofill_harness::cli::config::{
    Cli, Commands, build_harness_config, load_config, page_sources,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the default level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let file = load_config(cli.config.as_deref())?;
    let config = build_harness_config(&cli, &file);

    // Flag syncing needs no descriptors
    if let Commands::SyncFlags { file: flags_file } = &cli.command {
        cmd_sync_flags(&config, flags_file.as_deref())?;
        return Ok(());
    }

    let pages = load_pages(&config, &page_sources(&cli, &file), !cli.no_builtin)?;

    match cli.command {
        Commands::Run {
            kinds,
            format,
            output,
            skip_setup,
            ..
        } => {
            let format = format.unwrap_or_else(|| file.run.format.clone());
            let output = output.or_else(|| file.run.output.clone());
            let all_passed = cmd_run(
                &config,
                &pages,
                &kinds,
                skip_setup,
                &format,
                output.as_deref(),
            )?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::List => print!("{}", cmd_list(&config, &pages)),
        Commands::Check => print!("{}", cmd_check(&config, &pages)),
        Commands::Seed { folder, output } => {
            cmd_seed(&pages, &folder, output.as_deref())?;
        }
        Commands::SyncFlags { .. } => {}
    }

    Ok(())
}
