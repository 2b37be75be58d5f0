//! bundlepath - bundle resolution for versioned content packages
//!
//! Command line front end over the `bundlepath` library: validate manifests,
//! resolve addresses, and drive integrity checks, downloads and unpacking for
//! the package described by `bundlepath.yaml`.

use clap::Parser;

use bundlepath::cli::{Cli, Commands};
use bundlepath::{commands, logging};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match &cli.command {
        Commands::Validate(args) => commands::manifest::run_validate(args),
        Commands::Resolve(args) => commands::manifest::run_resolve(&cli.config, args),
        Commands::Tags(args) => commands::manifest::run_tags(&cli.config, args),
        Commands::Verify => commands::verify::run(&cli.config),
        Commands::Update => commands::update::run(&cli.config),
        Commands::Download(args) => commands::acquire::run_download(&cli.config, args),
        Commands::Unpack(args) => commands::acquire::run_unpack(&cli.config, args),
        Commands::Cache(args) => commands::cache::run(&cli.config, args),
        Commands::Version => commands::version::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
