//! Main compiler interface
//!
//! This module provides the high-level interface for compiling a program
//! to a native object file using Cranelift.

use std::collections::HashMap;
use std::fmt::Write as _;

use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::ir::{self as cl_ir, AbiParam, ExternalName, InstructionData, Signature, UserFuncName};
use cranelift_codegen::isa::TargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, Linkage, Module};
use cranelift_object::{ObjectBuilder, ObjectModule, ObjectProduct};
use stc_ast::{Program, TypeQuery};
use target_lexicon::Triple;
use tracing::{debug, instrument};

use crate::codegen::CodeGenerator;
use crate::constants::Constant;
use crate::context::CompilationContext;
use crate::errors::{CompilationErrorKind, CompilationResult};
use crate::target::TargetInfo;

/// Name of the implicit entry function.
pub const ENTRY_NAME: &str = "main";

#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// Module name, recorded in the object file.
    pub name: String,
    /// Target triple; the host when `None`.
    pub target: Option<Triple>,
    /// Emit position-independent code.
    pub pic: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            target: None,
            pic: true,
        }
    }
}

/// Compiler for one module. Consumed by [`StcCompiler::compile_program`].
pub struct StcCompiler {
    name: String,
    target: TargetInfo,
    module: ObjectModule,
    context: CompilationContext,
}

impl StcCompiler {
    /// Create a new compiler for the given target
    pub fn new(options: CompilerOptions) -> CompilationResult<Self> {
        let target = TargetInfo::from_triple(options.target.unwrap_or_else(Triple::host));

        let mut flag_builder = settings::builder();
        flag_builder.set("use_colocated_libcalls", "false")?;
        flag_builder.set("is_pic", if options.pic { "true" } else { "false" })?;

        let isa_builder = cranelift_codegen::isa::lookup(target.triple.clone())?;
        let isa = isa_builder.finish(settings::Flags::new(flag_builder))?;

        let object_builder = ObjectBuilder::new(
            isa,
            options.name.clone(),
            cranelift_module::default_libcall_names(),
        )?;
        let module = ObjectModule::new(object_builder);

        Ok(StcCompiler {
            name: options.name,
            target,
            module,
            context: CompilationContext::new()?,
        })
    }

    pub fn target(&self) -> &TargetInfo {
        &self.target
    }

    /// Compile a program into a verified module.
    #[instrument(skip_all, fields(module = %self.name))]
    pub fn compile_program(
        self,
        program: &Program,
        types: &dyn TypeQuery,
    ) -> CompilationResult<CompiledModule> {
        let StcCompiler {
            name,
            target,
            mut module,
            mut context,
        } = self;

        let mut sig = module.make_signature();
        sig.returns.push(AbiParam::new(cl_types::I32));
        let main_id = module.declare_function(ENTRY_NAME, Linkage::Export, &sig)?;

        let mut ctx = module.make_context();
        ctx.func.signature = sig;
        ctx.func.name = UserFuncName::testcase(ENTRY_NAME);

        let mut function_map = HashMap::new();
        let mut func_ctx = FunctionBuilderContext::new();
        {
            let builder = FunctionBuilder::new(&mut ctx.func, &mut func_ctx);
            let mut codegen =
                CodeGenerator::new(&mut module, builder, &mut context, types, &mut function_map);
            codegen.compile_program(program)?;
            codegen.finish();
        }

        let imports = collect_imports(&module, &function_map);
        let constants: Vec<Constant> = context.constants.into_vec();
        let layout = ModuleLayout {
            name: &name,
            target: &target,
            constants: &constants,
            imports: &imports,
        };
        verify(&ctx.func, module.isa(), &layout)?;

        let entry = ctx.func.clone();
        module.define_function(main_id, &mut ctx)?;
        debug!(
            constants = constants.len(),
            imports = imports.len(),
            "module verified and defined"
        );

        Ok(CompiledModule {
            name,
            target,
            entry,
            imports,
            constants,
            product: module.finish(),
        })
    }
}

/// A function declared but not defined by the module.
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    pub name: String,
    pub id: FuncId,
    pub signature: Signature,
}

fn collect_imports(module: &ObjectModule, function_map: &HashMap<String, FuncId>) -> Vec<Import> {
    let mut imports: Vec<Import> = function_map
        .iter()
        .map(|(name, id)| Import {
            name: name.clone(),
            id: *id,
            signature: module.declarations().get_function_decl(*id).signature.clone(),
        })
        .collect();
    imports.sort_by_key(|import| import.id.as_u32());
    imports
}

/// Structural verification of the entry function. On failure the error
/// carries the verifier output and the whole module rendered as text.
fn verify(func: &cl_ir::Function, isa: &dyn TargetIsa, layout: &ModuleLayout<'_>) -> CompilationResult<()> {
    cranelift_codegen::verify_function(func, isa).map_err(|errors| {
        CompilationErrorKind::VerificationFailed {
            errors: errors.to_string(),
            module: layout.render(func),
        }
        .into()
    })
}

/// Everything the textual module dump needs besides the entry function.
struct ModuleLayout<'m> {
    name: &'m str,
    target: &'m TargetInfo,
    constants: &'m [Constant],
    imports: &'m [Import],
}

impl ModuleLayout<'_> {
    fn render(&self, entry: &cl_ir::Function) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "; module {}", self.name);
        let _ = writeln!(out, "; target {}", self.target.triple);
        let _ = writeln!(out, "; data-layout {}", self.target.data_layout());
        if !self.constants.is_empty() {
            out.push('\n');
        }
        for constant in self.constants {
            let _ = writeln!(
                out,
                "data {} = \"{}\\0\" ; {}",
                constant.name,
                constant.source.escape_default(),
                constant.ty
            );
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }
        for import in self.imports {
            let _ = writeln!(out, "declare {}{}", import.name, import.signature);
        }
        out.push('\n');
        let _ = write!(out, "{}", entry.display());
        out
    }
}

/// A verified module and its native object.
pub struct CompiledModule {
    name: String,
    target: TargetInfo,
    entry: cl_ir::Function,
    imports: Vec<Import>,
    constants: Vec<Constant>,
    product: ObjectProduct,
}

impl CompiledModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triple(&self) -> &Triple {
        &self.target.triple
    }

    pub fn data_layout(&self) -> String {
        self.target.data_layout()
    }

    /// IR of the entry function, before lowering to machine code.
    pub fn entry_function(&self) -> &cl_ir::Function {
        &self.entry
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Symbols called from the entry function, in instruction order.
    pub fn callees(&self) -> Vec<&str> {
        let func = &self.entry;
        let mut callees = Vec::new();
        for block in func.layout.blocks() {
            for inst in func.layout.block_insts(block) {
                let InstructionData::Call { func_ref, .. } = func.dfg.insts[inst] else {
                    continue;
                };
                let ExternalName::User(name_ref) = &func.dfg.ext_funcs[func_ref].name else {
                    continue;
                };
                let index = func.params.user_named_funcs()[*name_ref].index;
                if let Some(import) = self.imports.iter().find(|i| i.id.as_u32() == index) {
                    callees.push(import.name.as_str());
                }
            }
        }
        callees
    }

    /// Emit the native object file.
    pub fn emit_object(self) -> CompilationResult<Vec<u8>> {
        Ok(self.product.emit()?)
    }
}

impl std::fmt::Display for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layout = ModuleLayout {
            name: &self.name,
            target: &self.target,
            constants: &self.constants,
            imports: &self.imports,
        };
        f.write_str(&layout.render(&self.entry))
    }
}
