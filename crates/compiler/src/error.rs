//! Compiler diagnostics.
//!
//! Every pipeline stage fails with a [`CompileError`] carrying the source
//! location of the offending construct. Diagnostics are fatal; no stage
//! attempts recovery.

use crate::tokenizer::Location;

/// A classified, location-bearing compiler diagnostic.
///
/// The `Emit` and `Codegen` variants allow proper error propagation with `?`
/// from the assembly generator, for both formatting failures and logical
/// errors (an instruction referencing a variable with no stack slot).
#[derive(Debug)]
pub enum CompileError {
    /// Lexical, grammatical, or control-flow error (unrecognized character,
    /// missing token, `break` outside a loop, `return` outside a function).
    Syntax { location: Location, message: String },
    /// Operand or annotation type mismatch, unknown type name.
    Type { location: Location, message: String },
    /// Unbound identifier, duplicate declaration, duplicate function.
    Name { location: Location, message: String },
    /// A logical error in assembly generation.
    Codegen(String),
    /// A formatting error when writing assembly text.
    Emit(std::fmt::Error),
}

impl CompileError {
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            location,
            message: message.into(),
        }
    }

    pub fn type_error(location: Location, message: impl Into<String>) -> Self {
        CompileError::Type {
            location,
            message: message.into(),
        }
    }

    pub fn name(location: Location, message: impl Into<String>) -> Self {
        CompileError::Name {
            location,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax { location, message } => {
                write!(f, "SyntaxError: {}: {}", location, message)
            }
            CompileError::Type { location, message } => {
                write!(f, "TypeError: {}: {}", location, message)
            }
            CompileError::Name { location, message } => {
                write!(f, "NameError: {}: {}", location, message)
            }
            CompileError::Codegen(message) => write!(f, "code generation error: {}", message),
            CompileError::Emit(e) => write!(f, "assembly formatting error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Emit(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_location() {
        let err = CompileError::syntax(
            Location::new("prog.vela", 3, 7),
            "Unrecognized character: @",
        );
        assert_eq!(
            err.to_string(),
            "SyntaxError: prog.vela:3:7: Unrecognized character: @"
        );
    }

    #[test]
    fn test_name_error_display() {
        let err = CompileError::name(
            Location::new("prog.vela", 1, 1),
            "Variable \"x\" is not defined",
        );
        assert!(err.to_string().starts_with("NameError: "));
    }
}
