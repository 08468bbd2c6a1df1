//! Three-address intermediate representation.
//!
//! Each function lowers to a flat instruction list headed by a `FunctionDef`
//! pseudo-instruction. Control flow is labels and jumps only; every value
//! lives in a named temporary ([`IRVar`]). The `Display` impls render the
//! diagnostic listing printed by `velac ir` and compared by tests.

use crate::tokenizer::Location;

/// A named IR temporary. User-named (function parameters, built-ins, the
/// `unit` sentinel) or minted by the generator (`x1`, `x2`, ...). Identity
/// is the name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IRVar {
    pub name: String,
}

impl IRVar {
    pub fn new(name: impl Into<String>) -> Self {
        IRVar { name: name.into() }
    }

    /// The shared sentinel for unit-valued positions. Never assigned a
    /// stack slot; reads of it produce a literal zero.
    pub fn unit() -> Self {
        IRVar::new("unit")
    }
}

impl std::fmt::Display for IRVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A jump target. Names are unique within one function's list.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub location: Location,
    pub name: String,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Label({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    LoadIntConst {
        location: Location,
        value: i64,
        dest: IRVar,
    },
    LoadBoolConst {
        location: Location,
        value: bool,
        dest: IRVar,
    },
    Copy {
        location: Location,
        source: IRVar,
        dest: IRVar,
    },
    Call {
        location: Location,
        fun: IRVar,
        args: Vec<IRVar>,
        dest: IRVar,
    },
    Jump {
        location: Location,
        label: Label,
    },
    CondJump {
        location: Location,
        cond: IRVar,
        then_label: Label,
        else_label: Label,
    },
    Label(Label),
    /// Pseudo-instruction heading every function's list.
    FunctionDef {
        location: Location,
        name: String,
        params: Vec<IRVar>,
    },
    Return {
        location: Location,
        result: IRVar,
    },
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::LoadIntConst { value, dest, .. } => {
                write!(f, "LoadIntConst({}, {})", value, dest)
            }
            Instruction::LoadBoolConst { value, dest, .. } => {
                write!(f, "LoadBoolConst({}, {})", value, dest)
            }
            Instruction::Copy { source, dest, .. } => write!(f, "Copy({}, {})", source, dest),
            Instruction::Call {
                fun, args, dest, ..
            } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "Call({}, [{}], {})", fun, args.join(", "), dest)
            }
            Instruction::Jump { label, .. } => write!(f, "Jump({})", label),
            Instruction::CondJump {
                cond,
                then_label,
                else_label,
                ..
            } => write!(f, "CondJump({}, {}, {})", cond, then_label, else_label),
            Instruction::Label(label) => write!(f, "{}", label),
            Instruction::FunctionDef { name, params, .. } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "FunctionDef({}, [{}])", name, params.join(", "))
            }
            Instruction::Return { result, .. } => write!(f, "Return({})", result),
        }
    }
}
