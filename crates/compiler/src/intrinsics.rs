//! Inline emitters for the built-in operators.
//!
//! Every operator the IR can `Call` has a fixed emitter here; the assembly
//! generator dispatches on the callee name and falls back to a C-ABI call
//! when the name is not an intrinsic. Emitters read their operands from the
//! caller-provided stack references and leave the result in the result
//! register (`%rax`).

/// Operand references and result register for one intrinsic expansion.
pub struct IntrinsicArgs<'a> {
    /// Stack references of the arguments, e.g. `-8(%rbp)`.
    pub arg_refs: &'a [String],
    /// Register the result must end up in. Always `%rax` today.
    pub result_register: &'a str,
}

pub type IntrinsicEmitter = fn(&IntrinsicArgs) -> Vec<String>;

/// Look up the emitter for an operator name.
pub fn intrinsic(name: &str) -> Option<IntrinsicEmitter> {
    Some(match name {
        "+" => add,
        "-" => sub,
        "*" => mul,
        "/" => div,
        "%" => rem,
        "<" => less_than,
        "<=" => less_or_equal,
        ">" => greater_than,
        ">=" => greater_or_equal,
        "==" => equals,
        "!=" => not_equals,
        "unary_-" => unary_minus,
        "unary_not" => unary_not,
        _ => return None,
    })
}

fn add(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        format!("addq {}, {}", args.arg_refs[1], args.result_register),
    ]
}

fn sub(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        format!("subq {}, {}", args.arg_refs[1], args.result_register),
    ]
}

fn mul(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        format!("imulq {}, {}", args.arg_refs[1], args.result_register),
    ]
}

// Signed division: cqto sign-extends %rax into %rdx:%rax, idivq leaves the
// quotient in %rax and the remainder in %rdx.
fn div(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        "cqto".to_string(),
        format!("idivq {}", args.arg_refs[1]),
    ]
}

fn rem(args: &IntrinsicArgs) -> Vec<String> {
    let mut lines = div(args);
    lines.push(format!("movq %rdx, {}", args.result_register));
    lines
}

/// Comparisons zero the result register, compare through `%rdx` and set the
/// low result byte from the flags.
fn comparison(args: &IntrinsicArgs, set_instruction: &str) -> Vec<String> {
    vec![
        format!("xor {}, {}", args.result_register, args.result_register),
        format!("movq {}, %rdx", args.arg_refs[0]),
        format!("cmpq {}, %rdx", args.arg_refs[1]),
        format!("{} %al", set_instruction),
    ]
}

fn less_than(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "setl")
}

fn less_or_equal(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "setle")
}

fn greater_than(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "setg")
}

fn greater_or_equal(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "setge")
}

fn equals(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "sete")
}

fn not_equals(args: &IntrinsicArgs) -> Vec<String> {
    comparison(args, "setne")
}

fn unary_minus(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        format!("negq {}", args.result_register),
    ]
}

fn unary_not(args: &IntrinsicArgs) -> Vec<String> {
    vec![
        format!("movq {}, {}", args.arg_refs[0], args.result_register),
        format!("xorq $1, {}", args.result_register),
    ]
}
