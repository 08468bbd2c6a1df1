//! Property-based tests over the whole pipeline.
//!
//! Generates random well-formed programs and checks the properties every
//! stage promises: re-tokenization is stable, well-typed inputs compile,
//! the IR is internally consistent (unique labels, defined jump targets,
//! every read reaches a written or reserved variable) and the assembly
//! references only labels it defines.

use std::collections::HashSet;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use velac::{Instruction, Type, tokenize};

// -- source generation strategies --

fn int_expr() -> impl Strategy<Value = String> {
    let leaf = (0i64..1000).prop_map(|n| n.to_string());
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")],
                inner.clone()
            )
                .prop_map(|(a, op, b)| format!("({} {} {})", a, op, b)),
            inner.prop_map(|a| format!("- {}", a)),
        ]
    })
}

fn bool_expr() -> impl Strategy<Value = String> {
    let comparison = (
        int_expr(),
        prop_oneof![Just("<"), Just("<="), Just(">"), Just(">="), Just("=="), Just("!=")],
        int_expr(),
    )
        .prop_map(|(a, op, b)| format!("({} {} {})", a, op, b));
    let leaf = prop_oneof![
        Just("true".to_string()),
        Just("false".to_string()),
        comparison,
    ];
    leaf.prop_recursive(2, 16, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("and"), Just("or")],
                inner.clone()
            )
                .prop_map(|(a, op, b)| format!("({} {} {})", a, op, b)),
            inner.prop_map(|b| format!("not {}", b)),
        ]
    })
}

/// A complete well-formed program.
fn program() -> impl Strategy<Value = String> {
    prop_oneof![
        int_expr(),
        bool_expr(),
        (bool_expr(), int_expr(), int_expr())
            .prop_map(|(c, a, b)| format!("if {} then {} else {}", c, a, b)),
        (int_expr(), bool_expr(), int_expr()).prop_map(|(init, cond, step)| {
            format!(
                "var x = {}; while {} do {{ x = x + {}; break }}",
                init, cond, step
            )
        }),
        int_expr().prop_map(|e| format!("print_int({})", e)),
        (bool_expr(), int_expr()).prop_map(|(c, e)| format!("{{ print_bool({}); {} }}", c, e)),
        (int_expr(), int_expr()).prop_map(|(a, b)| {
            format!("fun f(n: Int): Int {{ return (n + {}) }} f({})", a, b)
        }),
    ]
}

// -- IR consistency helpers --

fn reserved_or_function(name: &str, function_names: &HashSet<&str>) -> bool {
    matches!(
        name,
        "print_int"
            | "print_bool"
            | "read_int"
            | "+"
            | "-"
            | "*"
            | "/"
            | "%"
            | "<"
            | "<="
            | ">"
            | ">="
            | "=="
            | "!="
            | "and"
            | "or"
            | "unary_-"
            | "unary_not"
            | "unit"
    ) || function_names.contains(name)
}

fn check_function_ir(
    name: &str,
    instructions: &[Instruction],
    function_names: &HashSet<&str>,
) -> Result<(), TestCaseError> {
    // The FunctionDef pseudo-instruction heads the list and appears nowhere
    // else.
    prop_assert!(
        matches!(instructions.first(), Some(Instruction::FunctionDef { .. })),
        "{}: missing FunctionDef head",
        name
    );
    let heads = instructions
        .iter()
        .filter(|ins| matches!(ins, Instruction::FunctionDef { .. }))
        .count();
    prop_assert_eq!(heads, 1, "{}: FunctionDef count", name);

    // Labels are unique, and every jump target is defined in this list.
    let mut labels: HashSet<&str> = HashSet::new();
    for ins in instructions {
        if let Instruction::Label(label) = ins {
            prop_assert!(
                labels.insert(label.name.as_str()),
                "{}: duplicate label {}",
                name,
                label.name
            );
        }
    }
    let mut written: HashSet<&str> = HashSet::new();
    if let Some(Instruction::FunctionDef { params, .. }) = instructions.first() {
        for param in params {
            written.insert(&param.name);
        }
    }
    for ins in instructions {
        match ins {
            Instruction::LoadIntConst { dest, .. }
            | Instruction::LoadBoolConst { dest, .. }
            | Instruction::Copy { dest, .. }
            | Instruction::Call { dest, .. } => {
                written.insert(&dest.name);
            }
            _ => {}
        }
    }
    let check_read = |var_name: &str| -> Result<(), TestCaseError> {
        prop_assert!(
            reserved_or_function(var_name, function_names) || written.contains(var_name),
            "{}: read of never-written variable {}",
            name,
            var_name
        );
        Ok(())
    };
    for ins in instructions {
        match ins {
            Instruction::Copy { source, .. } => check_read(&source.name)?,
            Instruction::Call { fun, args, .. } => {
                check_read(&fun.name)?;
                for arg in args {
                    check_read(&arg.name)?;
                }
            }
            Instruction::CondJump {
                cond,
                then_label,
                else_label,
                ..
            } => {
                check_read(&cond.name)?;
                prop_assert!(labels.contains(then_label.name.as_str()));
                prop_assert!(labels.contains(else_label.name.as_str()));
            }
            Instruction::Jump { label, .. } => {
                prop_assert!(labels.contains(label.name.as_str()));
            }
            Instruction::Return { result, .. } => check_read(&result.name)?,
            _ => {}
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn retokenizing_token_text_is_stable(source in program()) {
        let tokens = tokenize(&source, "no file").unwrap();
        let joined = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let again = tokenize(&joined, "no file").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        let again_kinds: Vec<_> = again.iter().map(|t| t.kind).collect();
        prop_assert_eq!(kinds, again_kinds);
    }

    #[test]
    fn int_expressions_type_as_int(source in int_expr()) {
        let mut ast = velac::parse_source(&source, "no file").unwrap();
        let (ty, _) = velac::typecheck(&mut ast).unwrap();
        prop_assert_eq!(ty, Type::Int);
    }

    #[test]
    fn bool_expressions_type_as_bool(source in bool_expr()) {
        let mut ast = velac::parse_source(&source, "no file").unwrap();
        let (ty, _) = velac::typecheck(&mut ast).unwrap();
        prop_assert_eq!(ty, Type::Bool);
    }

    #[test]
    fn generated_ir_is_well_formed(source in program()) {
        let functions = velac::compile_to_ir(&source, "no file").unwrap();
        prop_assert!(functions.contains_key("main"));
        let function_names: HashSet<&str> =
            functions.keys().map(String::as_str).collect();
        for (name, instructions) in &functions {
            check_function_ir(name, instructions, &function_names)?;
        }
    }

    #[test]
    fn assembly_references_only_defined_labels(source in program()) {
        let assembly = velac::compile_to_assembly(&source, "no file").unwrap();
        let defined: HashSet<&str> = assembly
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(".L") && line.ends_with(':'))
            .map(|line| line.trim_end_matches(':'))
            .collect();
        for line in assembly.lines().map(str::trim) {
            if let Some(target) = line
                .strip_prefix("jmp ")
                .or_else(|| line.strip_prefix("jne "))
            {
                prop_assert!(defined.contains(target), "undefined label {}", target);
            }
        }
    }

    #[test]
    fn alignment_pads_are_balanced(source in program()) {
        // Pads appear only between labels (the prologue's frame allocation
        // comes before the first label and may also be $8).
        let assembly = velac::compile_to_assembly(&source, "no file").unwrap();
        let mut in_body = false;
        let mut pads = 0i64;
        for line in assembly.lines().map(str::trim) {
            if line == "pushq %rbp" {
                in_body = false;
            } else if line.starts_with(".L") {
                in_body = true;
            } else if in_body && line == "subq $8, %rsp" {
                pads += 1;
            } else if in_body && line == "addq $8, %rsp" {
                pads -= 1;
                prop_assert!(pads >= 0, "unmatched addq");
            }
        }
        prop_assert_eq!(pads, 0);
    }
}
