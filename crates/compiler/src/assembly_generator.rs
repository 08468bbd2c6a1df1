//! x86-64 assembly emission.
//!
//! Translates the per-function IR into GNU-assembler text (AT&T syntax).
//! Every IR temporary gets a fixed stack slot relative to `%rbp`; `%rax` is
//! the single scratch register. Calls follow the System V ABI, so the
//! emitted code links directly against the C runtime that provides
//! `print_int`, `print_bool` and `read_int`.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::CompileError;
use crate::intrinsics::{IntrinsicArgs, intrinsic};
use crate::ir::{IRVar, Instruction};
use crate::ir_generator::IrMap;

const ARGUMENT_REGISTERS: [&str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

/// Stack slot assignment for one function: slot `i` (1-based) lives at
/// `-8*i(%rbp)`.
struct Locals {
    var_to_location: HashMap<IRVar, String>,
    stack_used: usize,
}

impl Locals {
    fn new(variables: Vec<IRVar>) -> Self {
        let var_to_location = variables
            .iter()
            .enumerate()
            .map(|(i, var)| (var.clone(), format!("-{}(%rbp)", (i + 1) * 8)))
            .collect();
        Locals {
            stack_used: variables.len(),
            var_to_location,
        }
    }

    fn get_ref(&self, var: &IRVar) -> Option<&str> {
        self.var_to_location.get(var).map(String::as_str)
    }

    fn stack_used(&self) -> usize {
        self.stack_used
    }
}

/// Names that never get a stack slot: the built-ins, the operators, the
/// unit sentinel, and (added by the caller) every function name.
fn reserved_names() -> HashSet<String> {
    [
        "print_int",
        "print_bool",
        "read_int",
        "+",
        "-",
        "*",
        "/",
        "%",
        "<",
        "<=",
        ">",
        ">=",
        "==",
        "!=",
        "and",
        "or",
        "unary_-",
        "unary_not",
        "unit",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// The ordered, deduplicated set of slot-worthy variables a function
/// references, parameters included (they come from the `FunctionDef` head).
fn collect_variables(instructions: &[Instruction], reserved: &HashSet<String>) -> Vec<IRVar> {
    let mut result = Vec::new();
    let mut seen: HashSet<IRVar> = HashSet::new();
    let add = |var: &IRVar, result: &mut Vec<IRVar>, seen: &mut HashSet<IRVar>| {
        if !reserved.contains(&var.name) && seen.insert(var.clone()) {
            result.push(var.clone());
        }
    };
    for instruction in instructions {
        match instruction {
            Instruction::LoadIntConst { dest, .. } | Instruction::LoadBoolConst { dest, .. } => {
                add(dest, &mut result, &mut seen);
            }
            Instruction::Copy { source, dest, .. } => {
                add(source, &mut result, &mut seen);
                add(dest, &mut result, &mut seen);
            }
            Instruction::Call {
                fun, args, dest, ..
            } => {
                add(fun, &mut result, &mut seen);
                for arg in args {
                    add(arg, &mut result, &mut seen);
                }
                add(dest, &mut result, &mut seen);
            }
            Instruction::CondJump { cond, .. } => add(cond, &mut result, &mut seen),
            Instruction::Return { result: value, .. } => add(value, &mut result, &mut seen),
            Instruction::FunctionDef { params, .. } => {
                for param in params {
                    add(param, &mut result, &mut seen);
                }
            }
            Instruction::Jump { .. } | Instruction::Label(_) => {}
        }
    }
    result
}

/// Emit the whole program: a preamble declaring the runtime symbols, then
/// one block per function in map order.
pub fn generate_assembly(functions: &IrMap) -> Result<String, CompileError> {
    let mut reserved = reserved_names();
    // Pre-reserve every function name so a call to a later-defined function
    // never claims a stack slot for the callee.
    for name in functions.keys() {
        reserved.insert(name.clone());
    }

    let mut output = String::new();
    writeln!(output, ".extern print_int")?;
    writeln!(output, ".extern print_bool")?;
    writeln!(output, ".extern read_int")?;
    writeln!(output, ".section .text")?;
    for (name, instructions) in functions {
        writeln!(output)?;
        emit_function(&mut output, name, instructions, &reserved)?;
    }
    Ok(output)
}

fn emit_function(
    out: &mut String,
    func: &str,
    instructions: &[Instruction],
    reserved: &HashSet<String>,
) -> Result<(), CompileError> {
    let variables = collect_variables(instructions, reserved);

    let params_list = match instructions.first() {
        Some(Instruction::FunctionDef { params, .. }) => params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    };
    writeln!(out, "# {}({})", func, params_list)?;
    writeln!(out, "    .global {}", func)?;
    writeln!(out, "    .type {}, @function", func)?;
    writeln!(out, "{}:", func)?;
    for (i, var) in variables.iter().enumerate() {
        writeln!(out, "    # {} in -{}(%rbp)", var.name, (i + 1) * 8)?;
    }
    let locals = Locals::new(variables);

    // A read of a variable with no slot can only be the unit sentinel;
    // it reads as zero. Writes always target slotted temporaries.
    let read_ref = |var: &IRVar| locals.get_ref(var).unwrap_or("$0").to_string();
    let slot = |var: &IRVar| {
        locals.get_ref(var).ok_or_else(|| {
            CompileError::Codegen(format!("no stack slot for variable '{}'", var.name))
        })
    };

    writeln!(out, "    pushq %rbp")?;
    writeln!(out, "    movq %rsp, %rbp")?;

    if let Some(Instruction::FunctionDef { params, .. }) = instructions.first() {
        for (param, register) in params.iter().zip(ARGUMENT_REGISTERS) {
            if let Some(param_slot) = locals.get_ref(param) {
                writeln!(out, "    movq {}, {}", register, param_slot)?;
            }
        }
    }
    writeln!(out, "    subq ${}, %rsp", locals.stack_used().max(1) * 8)?;

    for instruction in instructions {
        if matches!(instruction, Instruction::FunctionDef { .. }) {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "    # {}", instruction)?;
        match instruction {
            Instruction::Label(label) => writeln!(out, ".L{}_{}:", func, label.name)?,

            Instruction::LoadIntConst { value, dest, .. } => {
                if i32::try_from(*value).is_ok() {
                    writeln!(out, "    movq ${}, {}", value, slot(dest)?)?;
                } else {
                    // Immediates outside the signed 32-bit range need the
                    // 64-bit move through a register.
                    writeln!(out, "    movabsq ${}, %rax", value)?;
                    writeln!(out, "    movq %rax, {}", slot(dest)?)?;
                }
            }

            Instruction::LoadBoolConst { value, dest, .. } => {
                writeln!(out, "    movq ${}, {}", i64::from(*value), slot(dest)?)?;
            }

            Instruction::Jump { label, .. } => {
                writeln!(out, "    jmp .L{}_{}", func, label.name)?;
            }

            Instruction::Copy { source, dest, .. } => {
                writeln!(out, "    movq {}, %rax", read_ref(source))?;
                writeln!(out, "    movq %rax, {}", slot(dest)?)?;
            }

            Instruction::CondJump {
                cond,
                then_label,
                else_label,
                ..
            } => {
                writeln!(out, "    cmpq $0, {}", read_ref(cond))?;
                writeln!(out, "    jne .L{}_{}", func, then_label.name)?;
                writeln!(out, "    jmp .L{}_{}", func, else_label.name)?;
            }

            Instruction::Call {
                fun, args, dest, ..
            } => {
                let arg_refs: Vec<String> = args.iter().map(&read_ref).collect();
                if let Some(emit) = intrinsic(&fun.name) {
                    let lines = emit(&IntrinsicArgs {
                        arg_refs: &arg_refs,
                        result_register: "%rax",
                    });
                    for line in lines {
                        writeln!(out, "    {}", line)?;
                    }
                    writeln!(out, "    movq %rax, {}", slot(dest)?)?;
                } else {
                    // C-ABI call. %rsp must be 16-byte aligned at the call:
                    // the prologue offsets it by 8 (return address) plus the
                    // slot area, so pad by 8 exactly when the slots alone
                    // leave it misaligned.
                    let needs_alignment_pad = locals.stack_used() * 8 % 16 != 0;
                    if needs_alignment_pad {
                        writeln!(out, "    subq $8, %rsp")?;
                    }
                    for (arg_ref, register) in arg_refs.iter().zip(ARGUMENT_REGISTERS) {
                        writeln!(out, "    movq {}, {}", arg_ref, register)?;
                    }
                    writeln!(out, "    callq {}", fun.name)?;
                    writeln!(out, "    movq %rax, {}", slot(dest)?)?;
                    if needs_alignment_pad {
                        writeln!(out, "    addq $8, %rsp")?;
                    }
                }
            }

            Instruction::Return { result, .. } => {
                writeln!(out, "    movq {}, %rax", read_ref(result))?;
                writeln!(out, "    movq %rbp, %rsp")?;
                writeln!(out, "    popq %rbp")?;
                writeln!(out, "    ret")?;
            }

            Instruction::FunctionDef { .. } => {}
        }
    }
    Ok(())
}
