//! Driver errors.

use std::path::PathBuf;
use std::process::ExitStatus;

use derive_more::{Display, From};
use stc_cranelift::CompilationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{}: {source}", path.display())]
    #[from(skip)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("invalid source document: {_0}")]
    Json(serde_json::Error),

    #[display("invalid config: {_0}")]
    Config(toml::de::Error),

    #[display("{_0}")]
    Compilation(CompilationError),

    #[display("invalid target `{triple}`: {reason}")]
    #[from(skip)]
    InvalidTarget { triple: String, reason: String },

    #[display("linker exited with {status}\n{stderr}")]
    #[from(skip)]
    LinkFailed { status: ExitStatus, stderr: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Json(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Compilation(e) => Some(e),
            Error::InvalidTarget { .. } | Error::LinkFailed { .. } => None,
        }
    }
}
