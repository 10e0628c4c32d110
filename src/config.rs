//! Build configuration, read from `stc.toml`.
//!
//! ```toml
//! [build]
//! target = "x86_64-unknown-linux-gnu"
//! output_dir = "build"
//! pic = true
//!
//! [link]
//! cc = "clang"
//! bundled_runtime = true
//! runtime_sources = ["extra/rt.c"]
//! args = ["-O2"]
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "stc.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub build: BuildConfig,
    pub link: LinkConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Target triple; the host when unset.
    pub target: Option<String>,
    pub output_dir: PathBuf,
    /// Overrides the module name recorded in the source document.
    pub module_name: Option<String>,
    /// Emit position-independent code.
    pub pic: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            target: None,
            output_dir: PathBuf::from("."),
            module_name: None,
            pic: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// C compiler driver used as the linker.
    pub cc: String,
    /// Link the runtime embedded in the driver.
    pub bundled_runtime: bool,
    /// Additional runtime sources compiled into every executable.
    pub runtime_sources: Vec<PathBuf>,
    /// Extra arguments passed to the driver.
    pub args: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            cc: "cc".to_string(),
            bundled_runtime: true,
            runtime_sources: Vec::new(),
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(Error::io(path))?;
        let mut config = Self::parse(&text)?;
        // Relative runtime sources are relative to the config file.
        if let Some(dir) = path.parent() {
            for source in &mut config.link.runtime_sources {
                if source.is_relative() {
                    *source = dir.join(&*source);
                }
            }
        }
        Ok(config)
    }

    /// The file named on the command line, else `stc.toml` next to the
    /// input if there is one, else the defaults.
    pub fn discover(explicit: Option<&Path>, input: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = input
            .parent()
            .map(|dir| dir.join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.build.pic);
        assert_eq!(config.link.cc, "cc");
        assert!(config.link.bundled_runtime);
        assert_eq!(config.build.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [build]
            target = "aarch64-apple-darwin"
            output_dir = "out"
            module_name = "app"
            pic = false

            [link]
            cc = "clang"
            bundled_runtime = false
            runtime_sources = ["runtime/console.c"]
            args = ["-O2", "-g"]
            "#,
        )
        .unwrap();

        assert_eq!(config.build.target.as_deref(), Some("aarch64-apple-darwin"));
        assert_eq!(config.build.output_dir, PathBuf::from("out"));
        assert_eq!(config.build.module_name.as_deref(), Some("app"));
        assert!(!config.build.pic);
        assert_eq!(config.link.cc, "clang");
        assert!(!config.link.bundled_runtime);
        assert_eq!(config.link.runtime_sources, vec![PathBuf::from("runtime/console.c")]);
        assert_eq!(config.link.args, vec!["-O2", "-g"]);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = Config::parse("[build]\noptimize = true\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_resolves_runtime_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[link]\nruntime_sources = [\"rt/console.c\"]\n").unwrap();

        let config = Config::discover(None, &dir.path().join("main.json")).unwrap();
        assert_eq!(config.link.runtime_sources, vec![dir.path().join("rt/console.c")]);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let err = Config::discover(Some(Path::new("/nonexistent/stc.toml")), Path::new("a.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
