//! Vela compiler library.
//!
//! Compiles Vela source text to x86-64 GNU-assembler text (AT&T syntax) in
//! five stages: tokenize, parse, type-check, lower to three-address IR, and
//! emit assembly. The emitted code links against a C runtime exporting
//! `print_int`, `print_bool` and `read_int`.
//!
//! ```rust
//! let assembly = velac::compile_to_assembly("print_int(1 + 2)", "demo.vela").unwrap();
//! assert!(assembly.contains("callq print_int"));
//! ```

pub mod assembly_generator;
pub mod ast;
pub mod error;
pub mod interpreter;
pub mod intrinsics;
pub mod ir;
pub mod ir_generator;
pub mod parser;
pub mod symtab;
pub mod tokenizer;
pub mod typechecker;
pub mod types;

pub use assembly_generator::generate_assembly;
pub use ast::{Ast, Expr, ExprKind, FuncDef, Literal, Module, ModuleItem};
pub use error::CompileError;
pub use interpreter::{Interpreter, RuntimeError, Value};
pub use ir::{IRVar, Instruction, Label};
pub use ir_generator::{IrMap, generate_ir, root_types};
pub use parser::Parser;
pub use symtab::SymTab;
pub use tokenizer::{Location, Token, TokenKind, tokenize};
pub use typechecker::typecheck;
pub use types::Type;

use std::fs;
use std::path::Path;

/// Tokenize and parse `source` into an AST.
pub fn parse_source(source: &str, file_name: &str) -> Result<Ast, CompileError> {
    let tokens = tokenize(source, file_name)?;
    Parser::new(tokens).parse()
}

/// Run the pipeline up to IR generation.
pub fn compile_to_ir(source: &str, file_name: &str) -> Result<IrMap, CompileError> {
    let mut ast = parse_source(source, file_name)?;
    let (_, table) = typecheck(&mut ast)?;
    generate_ir(&root_types(&table), &ast)
}

/// Render per-function IR as a listing, one instruction per line, functions
/// in emission order.
pub fn ir_to_string(functions: &IrMap) -> String {
    functions
        .values()
        .flat_map(|instructions| instructions.iter().map(|ins| ins.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the whole pipeline: source text in, assembly text out.
pub fn compile_to_assembly(source: &str, file_name: &str) -> Result<String, CompileError> {
    generate_assembly(&compile_to_ir(source, file_name)?)
}

/// Compile a source file to an assembly file. The output is the emitter's
/// text, written verbatim.
pub fn compile_file(input: &Path, output: &Path) -> Result<(), String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("Failed to read source file: {}", e))?;
    let assembly = compile_to_assembly(&source, &input.display().to_string())
        .map_err(|e| e.to_string())?;
    fs::write(output, assembly).map_err(|e| format!("Failed to write output file: {}", e))
}

/// Parse, type-check and interpret a program, printing an Int or Bool
/// result the way the compiled binary would. Backs `velac run`.
pub fn run_program(
    source: &str,
    file_name: &str,
    input: &mut dyn std::io::BufRead,
    output: &mut dyn std::io::Write,
) -> Result<Value, String> {
    let mut ast = parse_source(source, file_name).map_err(|e| e.to_string())?;
    typecheck(&mut ast).map_err(|e| e.to_string())?;
    let mut interpreter = Interpreter::new(input, output);
    interpreter.run(&ast).map_err(|e| e.to_string())
}
