//! End-to-end tests for the Cranelift compiler

use std::collections::HashMap;

use cranelift_codegen::ir::{self as cl_ir, AbiParam, Block, InstructionData, Opcode, UserFuncName};
use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::Module;
use cranelift_object::{ObjectBuilder, ObjectModule};
use stc_ast::{BinaryOp, ForInit, Program, ProgramBuilder, TypeTable, UnaryOp};
use target_lexicon::Triple;

use crate::codegen::CodeGenerator;
use crate::context::CompilationContext;
use crate::errors::{CompilationError, CompilationErrorKind};
use crate::{CompiledModule, compile_to_module};

fn compile(program: &Program, types: &TypeTable) -> Result<CompiledModule, CompilationError> {
    compile_to_module(program, types, None)
}

fn kind_of(result: Result<CompiledModule, CompilationError>) -> CompilationErrorKind {
    match result {
        Ok(module) => panic!("expected an error, got:\n{module}"),
        Err(err) => err.into_kind(),
    }
}

/// `console.log(<text>)` as a statement.
fn log_stmt(b: &ProgramBuilder, text: &str) -> stc_ast::Stmt {
    let call = b.call(b.path("console.log"), vec![b.string(text)]);
    b.expr_stmt(call)
}

/// `for (let i<: annotation> = 0; i < 10; i++) {}`
fn counting_loop(b: &ProgramBuilder, annotation: Option<&str>) -> stc_ast::Stmt {
    let init = ForInit::Variables(vec![b.var("i", annotation, Some(b.number(0)))]);
    let condition = b.binary(BinaryOp::Lt, b.ident("i"), b.number(10));
    let increment = b.postfix(UnaryOp::Increment, b.ident("i"));
    b.for_loop(Some(init), Some(condition), Some(increment), b.block(vec![]))
}

fn jump_target(func: &cl_ir::Function, block: Block) -> Block {
    let inst = func.layout.last_inst(block).unwrap();
    match &func.dfg.insts[inst] {
        InstructionData::Jump { destination, .. } => destination.block(&func.dfg.value_lists),
        other => panic!("expected a jump, found {:?}", other.opcode()),
    }
}

fn brif_targets(func: &cl_ir::Function, block: Block) -> (Block, Block) {
    let inst = func.layout.last_inst(block).unwrap();
    match &func.dfg.insts[inst] {
        InstructionData::Brif { blocks, .. } => (
            blocks[0].block(&func.dfg.value_lists),
            blocks[1].block(&func.dfg.value_lists),
        ),
        other => panic!("expected a brif, found {:?}", other.opcode()),
    }
}

pub(crate) fn host_module() -> ObjectModule {
    let mut flag_builder = settings::builder();
    flag_builder.set("is_pic", "true").unwrap();
    let isa = cranelift_codegen::isa::lookup(Triple::host())
        .unwrap()
        .finish(settings::Flags::new(flag_builder))
        .unwrap();
    ObjectModule::new(
        ObjectBuilder::new(isa, "test", cranelift_module::default_libcall_names()).unwrap(),
    )
}

#[test]
fn test_hello_world() {
    let mut b = ProgramBuilder::new("hello");
    let stmt = log_stmt(&b, "hello");
    b.push(stmt);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();

    assert_eq!(module.constants().len(), 1);
    let constant = &module.constants()[0];
    assert_eq!(constant.name, ".str.0");
    assert_eq!(constant.source, "hello");
    assert_eq!(module.callees(), vec!["console__log"]);

    let imports = module.imports();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].name, "console__log");
    assert_eq!(imports[0].signature.params.len(), 2);
    assert_eq!(imports[0].signature.params[1], AbiParam::new(cl_types::I64));
    assert_eq!(imports[0].signature.returns, vec![AbiParam::new(cl_types::I32)]);

    let dump = module.to_string();
    assert!(dump.contains("data .str.0 = \"hello\\0\""));
    assert!(dump.contains("declare console__log"));
}

#[test]
fn test_console_error() {
    let mut b = ProgramBuilder::new("stderr");
    let call = b.call(b.path("console.error"), vec![b.string("oops")]);
    let stmt = b.expr_stmt(call);
    b.push(stmt);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    assert_eq!(module.callees(), vec!["console__error"]);
}

#[test]
fn test_identical_literals_share_a_constant() {
    let mut b = ProgramBuilder::new("dedup");
    for text in ["same", "same", "other"] {
        let stmt = log_stmt(&b, text);
        b.push(stmt);
    }
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();

    let names: Vec<_> = module
        .constants()
        .iter()
        .map(|c| (c.name.as_str(), c.source.as_str()))
        .collect();
    assert_eq!(names, vec![(".str.0", "same"), (".str.1", "other")]);
    assert_eq!(module.callees(), vec!["console__log"; 3]);
    // One declaration serves every call.
    assert_eq!(module.imports().len(), 1);
}

#[test]
fn test_number_passed_to_console_log() {
    let mut b = ProgramBuilder::new("number");
    let call = b.call(b.path("console.log"), vec![b.number(42)]);
    let stmt = b.expr_stmt(call);
    b.push(stmt);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    assert_eq!(module.constants()[0].source, "42");
}

#[test]
fn test_string_variable_passed_to_console_log() {
    let mut b = ProgramBuilder::new("logvar");
    let decl = b.var("s", None, Some(b.string("hi")));
    let var = b.var_stmt(vec![decl]);
    let call = b.call(b.path("console.log"), vec![b.ident("s")]);
    let call = b.expr_stmt(call);
    b.push(var).push(call);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    assert_eq!(module.callees(), vec!["console__log"]);
    assert_eq!(module.constants().len(), 1);
    assert_eq!(module.imports()[0].signature.params.len(), 2);
    let text = module.entry_function().display().to_string();
    assert!(text.contains("stack_load"));
}

#[test]
fn test_numeric_variable_passed_to_console_log() {
    let mut b = ProgramBuilder::new("lognum");
    let decl = b.var("n", Some("i32"), Some(b.number(3)));
    let var = b.var_stmt(vec![decl]);
    let call = b.call(b.path("console.log"), vec![b.ident("n")]);
    let call = b.expr_stmt(call);
    b.push(var).push(call);
    let (program, types) = b.finish();

    match kind_of(compile(&program, &types)) {
        CompilationErrorKind::UnsupportedVariableType { name, .. } => assert_eq!(name, "n"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_console_log_arity() {
    let mut b = ProgramBuilder::new("arity");
    let call = b.call(b.path("console.log"), vec![b.string("a"), b.string("b")]);
    let stmt = b.expr_stmt(call);
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::TypeMismatch(_)
    ));
}

#[test]
fn test_undeclared_stdlib_member() {
    let mut b = ProgramBuilder::new("missing");
    let call = b.call(b.path("console.missing"), vec![b.string("x")]);
    let stmt = b.expr_stmt(call);
    b.push(stmt);
    let (program, types) = b.finish();

    match kind_of(compile(&program, &types)) {
        CompilationErrorKind::UndeclaredStdlibCall(path) => assert_eq!(path, "console.missing"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_for_loop_block_structure() {
    let mut b = ProgramBuilder::new("loop");
    let stmt = counting_loop(&b, Some("i32"));
    b.push(stmt);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    let func = module.entry_function();

    let blocks: Vec<Block> = func.layout.blocks().collect();
    assert_eq!(blocks.len(), 6);
    let [entry, init, condition, body, after, end] = blocks[..] else {
        unreachable!()
    };

    assert_eq!(jump_target(func, entry), init);
    assert_eq!(jump_target(func, init), condition);
    assert_eq!(brif_targets(func, condition), (body, end));
    assert_eq!(jump_target(func, body), after);
    assert_eq!(jump_target(func, after), condition);

    let last = func.layout.last_inst(end).unwrap();
    assert_eq!(func.dfg.insts[last].opcode(), Opcode::Return);

    let text = func.display().to_string();
    assert!(text.contains("icmp slt"));
    assert!(text.contains("iadd"));
}

#[test]
fn test_for_loop_number_variable_is_float() {
    let mut b = ProgramBuilder::new("loop");
    let stmt = counting_loop(&b, None);
    b.push(stmt);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    let text = module.entry_function().display().to_string();
    assert!(text.contains("fcmp lt"));
    assert!(text.contains("fadd"));
}

#[test]
fn test_statements_after_loop_continue_in_end_block() {
    let mut b = ProgramBuilder::new("after");
    let first = counting_loop(&b, Some("i64"));
    let second = counting_loop(&b, Some("i64"));
    let log = log_stmt(&b, "done");
    b.push(first).push(second).push(log);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    let func = module.entry_function();
    assert_eq!(func.layout.blocks().count(), 11);

    let last_block = func.layout.last_block().unwrap();
    let has_call = func
        .layout
        .block_insts(last_block)
        .any(|inst| func.dfg.insts[inst].opcode() == Opcode::Call);
    assert!(has_call);
}

#[test]
fn test_loop_variable_scoped_to_loop() {
    let mut b = ProgramBuilder::new("scoped");
    let first = counting_loop(&b, Some("i32"));
    // A second `i` is fine once the first loop's scope is gone.
    let second = counting_loop(&b, Some("i32"));
    b.push(first).push(second);
    let (program, types) = b.finish();

    assert!(compile(&program, &types).is_ok());
}

#[test]
fn test_for_loop_with_body_is_unsupported() {
    let mut b = ProgramBuilder::new("body");
    let init = ForInit::Variables(vec![b.var("i", None, Some(b.number(0)))]);
    let condition = b.binary(BinaryOp::Lt, b.ident("i"), b.number(3));
    let body = b.block(vec![log_stmt(&b, "tick")]);
    let stmt = b.for_loop(Some(init), Some(condition), None, body);
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::UnsupportedFeature(_)
    ));
}

#[test]
fn test_for_loop_condition_must_compare() {
    let mut b = ProgramBuilder::new("cond");
    let init = ForInit::Variables(vec![b.var("i", None, Some(b.number(0)))]);
    let condition = b.binary(BinaryOp::Add, b.ident("i"), b.number(1));
    let stmt = b.for_loop(Some(init), Some(condition), None, b.block(vec![]));
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::ConditionGenerationFailed(_)
    ));
}

#[test]
fn test_for_loop_without_condition() {
    let mut b = ProgramBuilder::new("forever");
    let stmt = b.for_loop(None, None, None, b.block(vec![]));
    b.push(stmt);
    let (program, types) = b.finish();

    let err = compile(&program, &types).err().unwrap();
    assert!(err.to_string().starts_with("Condition didn't generate"));
}

#[test]
fn test_comparing_different_types() {
    let mut b = ProgramBuilder::new("mismatch");
    let init = ForInit::Variables(vec![
        b.var("i", Some("i32"), Some(b.number(0))),
        b.var("x", None, Some(b.number(1.5))),
    ]);
    let condition = b.binary(BinaryOp::Lt, b.ident("i"), b.ident("x"));
    let stmt = b.for_loop(Some(init), Some(condition), None, b.block(vec![]));
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::TypeMismatch(_)
    ));
}

#[test]
fn test_string_loop_variable_is_rejected() {
    let mut b = ProgramBuilder::new("strloop");
    let init = ForInit::Variables(vec![b.var("s", None, Some(b.string("a")))]);
    let condition = b.binary(BinaryOp::Lt, b.ident("s"), b.number(1));
    let stmt = b.for_loop(Some(init), Some(condition), None, b.block(vec![]));
    b.push(stmt);
    let (program, types) = b.finish();

    match kind_of(compile(&program, &types)) {
        CompilationErrorKind::UnsupportedVariableType { name, ty } => {
            assert_eq!(name, "s");
            assert_eq!(ty, "string");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_integer_literal_out_of_range() {
    let mut b = ProgramBuilder::new("range");
    let decl = b.var("c", Some("i8"), Some(b.number(300)));
    let stmt = b.var_stmt(vec![decl]);
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::TypeMismatch(_)
    ));
}

#[test]
fn test_unhandled_statements_are_skipped() {
    let mut b = ProgramBuilder::new("skip");
    let first = b.other_stmt("IfStatement");
    let second = b.return_stmt(None);
    let third = b.expr_stmt(b.other_expr("ArrowFunction"));
    let log = log_stmt(&b, "still here");
    let eof = b.end_of_file();
    b.push(first).push(second).push(third).push(log).push(eof);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    assert_eq!(module.callees(), vec!["console__log"]);
}

#[test]
fn test_string_variable_passed_to_external_function() {
    let mut b = ProgramBuilder::new("greet");
    let decl = b.var("name", None, Some(b.string("world")));
    let var = b.var_stmt(vec![decl]);
    let call = b.call(b.ident("greet"), vec![b.ident("name")]);
    let call = b.expr_stmt(call);
    b.push(var).push(call);
    let (program, types) = b.finish();

    let module = compile(&program, &types).unwrap();
    assert_eq!(module.callees(), vec!["greet"]);
    let greet = &module.imports()[0];
    assert_eq!(greet.signature.params.len(), 2);
    assert!(greet.signature.returns.is_empty());

    let text = module.entry_function().display().to_string();
    assert!(text.contains("stack_store"));
    assert!(text.contains("stack_load"));
}

#[test]
fn test_external_function_called_with_different_arguments() {
    let mut b = ProgramBuilder::new("arity");
    let first = b.call(b.ident("greet"), vec![b.string("a")]);
    let second = b.call(b.ident("greet"), vec![b.number(1)]);
    let first = b.expr_stmt(first);
    let second = b.expr_stmt(second);
    b.push(first).push(second);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::TypeMismatch(_)
    ));
}

#[test]
fn test_duplicate_variable() {
    let mut b = ProgramBuilder::new("dup");
    let first = b.var("a", None, Some(b.number(1)));
    let second = b.var("a", None, Some(b.number(2)));
    let stmt = b.var_stmt(vec![first, second]);
    b.push(stmt);
    let (program, types) = b.finish();

    assert!(matches!(
        kind_of(compile(&program, &types)),
        CompilationErrorKind::DuplicateBinding(_)
    ));
}

#[test]
fn test_block_variable_not_visible_outside() {
    let mut b = ProgramBuilder::new("block");
    let decl = b.var("s", None, Some(b.string("inner")));
    let block = b.block(vec![b.var_stmt(vec![decl])]);
    let call = b.call(b.ident("greet"), vec![b.ident("s")]);
    let call = b.expr_stmt(call);
    b.push(block).push(call);
    let (program, types) = b.finish();

    match kind_of(compile(&program, &types)) {
        CompilationErrorKind::UnknownIdentifier(name) => assert_eq!(name, "s"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scope_is_popped_when_lowering_fails() {
    let mut b = ProgramBuilder::new("pop");
    let init = ForInit::Variables(vec![b.var("i", None, Some(b.number(0)))]);
    let stmt = b.for_loop(Some(init), None, None, b.block(vec![]));
    b.push(stmt);
    let (program, types) = b.finish();

    let mut module = host_module();
    let mut ctx = CompilationContext::new().unwrap();
    let mut function_map = HashMap::new();

    let mut sig = module.make_signature();
    sig.returns.push(AbiParam::new(cl_types::I32));
    let mut func = cl_ir::Function::with_name_signature(UserFuncName::testcase("main"), sig);
    let mut func_ctx = FunctionBuilderContext::new();
    let builder = FunctionBuilder::new(&mut func, &mut func_ctx);

    let mut codegen = CodeGenerator::new(&mut module, builder, &mut ctx, &types, &mut function_map);
    assert!(codegen.compile_program(&program).is_err());
    drop(codegen);

    assert!(ctx.scopes.is_global());
    assert!(ctx.scopes.get("i").is_err());
}
