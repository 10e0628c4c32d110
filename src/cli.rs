//! Command-line interface for the stc compiler.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stc")]
#[command(about = "Native compiler for a statically typed TypeScript subset", long_about = None)]
pub struct Cli {
    /// Log compiler internals (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a type-checked source document to a native executable
    Build(BuildArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source document (JSON AST with types) produced by the front end
    pub input: PathBuf,

    /// Target triple, e.g. `x86_64-unknown-linux-gnu` (defaults to the host)
    #[arg(long)]
    pub target: Option<String>,

    /// Print the module IR to stdout instead of linking
    #[arg(long)]
    pub print_ir: bool,

    /// Write the module IR next to the object file instead of linking
    #[arg(long)]
    pub emit_ir: bool,

    /// Only write the object file
    #[arg(long)]
    pub no_link: bool,

    /// Directory for the object file and executable
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Config file (defaults to `stc.toml` next to the input)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
