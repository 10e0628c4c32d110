//! Common test utilities for driver tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use stc::{BuildArtifacts, BuildOptions, Config};
use tempfile::TempDir;

/// Path of a program under lang-examples/.
pub fn example(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("lang-examples")
        .join(name)
}

/// Build options writing into `out_dir`, without linking.
pub fn object_only(input: PathBuf, out_dir: &Path) -> BuildOptions {
    let mut config = Config::default();
    config.build.output_dir = out_dir.to_path_buf();
    BuildOptions {
        input,
        config,
        print_ir: false,
        emit_ir: false,
        link: false,
    }
}

/// Compile, link with the default configuration, and run an example.
#[allow(dead_code)]
pub fn compile_and_run_native(name: &str) -> Output {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut options = object_only(example(name), dir.path());
    options.link = true;

    let BuildArtifacts { executable, .. } = stc::build(&options).expect("Failed to build");
    let executable = executable.expect("No executable was linked");
    Command::new(&executable)
        .output()
        .expect("Failed to execute native binary")
}
