//! Executable linking through the system C compiler driver.
//!
//! The driver takes care of the C runtime, libc and the dynamic loader, and
//! compiles the runtime sources that provide the stdlib entry points.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, error, instrument};

use crate::config::LinkConfig;
use crate::error::{Error, Result};

/// Arguments for `cc`: output, runtime sources, objects, then extra args.
pub fn link_args(config: &LinkConfig, objects: &[PathBuf], output: &Path) -> Vec<String> {
    let mut args = vec!["-o".to_string(), output.display().to_string()];
    args.extend(
        config
            .runtime_sources
            .iter()
            .map(|source| source.display().to_string()),
    );
    args.extend(objects.iter().map(|object| object.display().to_string()));
    args.extend(config.args.iter().cloned());
    args
}

#[instrument(level = "debug", skip(config))]
pub fn link_executable(config: &LinkConfig, objects: &[PathBuf], output: &Path) -> Result<()> {
    let args = link_args(config, objects, output);
    debug!(cc = %config.cc, ?args, "invoking linker");

    let result = Command::new(&config.cc)
        .args(&args)
        .output()
        .map_err(Error::io(&config.cc))?;
    debug!("Linker result ok: {}", result.status.success());

    if result.status.success() {
        return Ok(());
    }

    // Rerun verbosely so the error shows the full driver command line.
    let verbose = Command::new(&config.cc)
        .arg("-v")
        .args(&args)
        .output()
        .map_err(Error::io(&config.cc))?;
    let stderr = String::from_utf8_lossy(&verbose.stderr).into_owned();
    error!("Linker error:\n{stderr}");
    Err(Error::LinkFailed {
        status: result.status,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_args_order() {
        let config = LinkConfig {
            cc: "cc".into(),
            runtime_sources: vec![PathBuf::from("runtime/console.c")],
            args: vec!["-O2".into()],
            ..LinkConfig::default()
        };
        let args = link_args(&config, &[PathBuf::from("out/hello.o")], Path::new("out/hello"));
        assert_eq!(
            args,
            vec!["-o", "out/hello", "runtime/console.c", "out/hello.o", "-O2"]
        );
    }

    #[test]
    fn test_missing_driver_is_an_io_error() {
        let config = LinkConfig {
            cc: "stc-no-such-cc".into(),
            ..LinkConfig::default()
        };
        let err = link_executable(&config, &[], Path::new("a.out")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
