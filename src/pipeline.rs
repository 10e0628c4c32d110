//! Build pipeline: load a source document, compile it, write the artifacts
//! and link.
//!
//! ```text
//! <input>.json ──load──▶ Program + TypeTable ──compile──▶ CompiledModule
//!                                                        │
//!                              <name>.clif ◀─emit IR─────┤
//!                              <name>.o    ◀─emit object─┘──link──▶ <name>
//! ```

use std::path::{Path, PathBuf};

use stc_ast::{Program, SourceDocument, TypeTable};
use stc_cranelift::{CompiledModule, CompilerOptions, StcCompiler};
use target_lexicon::Triple;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::{linker, runtime};

/// Everything a build needs, after merging the CLI over the config file.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub input: PathBuf,
    pub config: Config,
    /// Print the module dump to stdout.
    pub print_ir: bool,
    /// Write the module dump next to the object file.
    pub emit_ir: bool,
    /// Link an executable after writing the object file. Printing or
    /// emitting IR stops the build before linking.
    pub link: bool,
}

impl BuildOptions {
    pub fn should_link(&self) -> bool {
        self.link && !self.print_ir && !self.emit_ir
    }
}

/// Paths written by a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildArtifacts {
    pub object: PathBuf,
    pub ir: Option<PathBuf>,
    pub executable: Option<PathBuf>,
}

#[instrument(level = "debug")]
pub fn load_document(path: &Path) -> Result<(Program, TypeTable)> {
    let json = std::fs::read_to_string(path).map_err(Error::io(path))?;
    let document = SourceDocument::from_json(&json)?;
    Ok(document.into_parts())
}

pub fn parse_target(triple: &str) -> Result<Triple> {
    triple.parse().map_err(|e: target_lexicon::ParseError| Error::InvalidTarget {
        triple: triple.to_string(),
        reason: e.to_string(),
    })
}

#[instrument(level = "debug", skip_all, fields(module = %program.name))]
pub fn compile(program: &Program, types: &TypeTable, config: &Config) -> Result<CompiledModule> {
    let target = config.build.target.as_deref().map(parse_target).transpose()?;
    let compiler = StcCompiler::new(CompilerOptions {
        name: program.name.clone(),
        target,
        pic: config.build.pic,
    })?;
    Ok(compiler.compile_program(program, types)?)
}

/// Run a whole build.
#[instrument(level = "debug", skip_all, fields(input = %options.input.display()))]
pub fn build(options: &BuildOptions) -> Result<BuildArtifacts> {
    let config = &options.config;
    let (mut program, types) = load_document(&options.input)?;
    if let Some(name) = &config.build.module_name {
        program.name = name.clone();
    }
    if program.name.is_empty() {
        program.name = module_name_from_path(&options.input);
    }

    let module = compile(&program, &types, config)?;
    if options.print_ir {
        println!("{module}");
    }

    let out_dir = &config.build.output_dir;
    std::fs::create_dir_all(out_dir).map_err(Error::io(out_dir))?;

    let mut artifacts = BuildArtifacts {
        object: out_dir.join(format!("{}.o", program.name)),
        ..BuildArtifacts::default()
    };
    if options.emit_ir {
        let path = out_dir.join(format!("{}.clif", program.name));
        std::fs::write(&path, module.to_string()).map_err(Error::io(&path))?;
        artifacts.ir = Some(path);
    }

    let object = module.emit_object()?;
    std::fs::write(&artifacts.object, &object).map_err(Error::io(&artifacts.object))?;
    info!(path = %artifacts.object.display(), bytes = object.len(), "wrote object");

    if options.should_link() {
        let executable = out_dir.join(&program.name);
        let mut link = config.link.clone();
        if link.bundled_runtime {
            let mut sources = runtime::write_sources(&out_dir.join("runtime"))?;
            sources.append(&mut link.runtime_sources);
            link.runtime_sources = sources;
        }
        linker::link_executable(&link, std::slice::from_ref(&artifacts.object), &executable)?;
        info!(path = %executable.display(), "linked executable");
        artifacts.executable = Some(executable);
    }
    Ok(artifacts)
}

fn module_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}
