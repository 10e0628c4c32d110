//! stc compiler CLI entry point.

mod cli;

use clap::Parser;
use cli::{BuildArgs, Cli, Command};
use stc::{BuildOptions, Config};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Build(args) => run_build(args),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise warnings, or more with `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_build(args: BuildArgs) -> stc::Result<()> {
    let mut config = Config::discover(args.config.as_deref(), &args.input)?;
    if let Some(target) = args.target {
        config.build.target = Some(target);
    }
    if let Some(dir) = args.output_dir {
        config.build.output_dir = dir;
    }

    let artifacts = stc::build(&BuildOptions {
        input: args.input,
        config,
        print_ir: args.print_ir,
        emit_ir: args.emit_ir,
        link: !args.no_link,
    })?;

    if let Some(executable) = &artifacts.executable {
        eprintln!("Successfully compiled to: {}", executable.display());
    } else {
        eprintln!("Successfully compiled to: {}", artifacts.object.display());
    }
    Ok(())
}
