//! Tree-walking interpreter for Vela.
//!
//! Evaluates the AST directly, with the same observable behavior as the
//! compiled program: truncated signed division (what `idivq` computes),
//! short-circuit `and`/`or`, unit-valued `if` without `else`, and an Int or
//! Bool top-level result printed like `main` does. `velac run` uses this to
//! execute programs without an assembler.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::ast::{Ast, Expr, ExprKind, FuncDef, Literal, ModuleItem};
use crate::symtab::SymTab;
use crate::tokenizer::Location;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Unit,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Unit => write!(f, "unit"),
        }
    }
}

/// An error raised during evaluation: unbound names, division by zero,
/// invalid `read_int` input, I/O failures.
#[derive(Debug)]
pub struct RuntimeError {
    pub location: Location,
    pub message: String,
}

impl RuntimeError {
    fn new(location: Location, message: impl Into<String>) -> Self {
        RuntimeError {
            location,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuntimeError: {}: {}", self.location, self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// How evaluation of one expression left the surrounding control flow.
enum Flow {
    Value(Value),
    Break(Location),
    Continue(Location),
    Return(Value),
}

/// Unwrap a value-producing evaluation, passing any break/continue/return
/// through to the caller.
macro_rules! eval_value {
    ($self:expr, $expr:expr) => {
        match $self.eval($expr)? {
            Flow::Value(value) => value,
            flow => return Ok(flow),
        }
    };
}

pub struct Interpreter<'a> {
    table: SymTab<Value>,
    functions: HashMap<String, FuncDef>,
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Interpreter {
            table: SymTab::new(),
            functions: HashMap::new(),
            input,
            output,
        }
    }

    /// Evaluate a program and return its final value. Function definitions
    /// register first so they may call each other regardless of order.
    pub fn interpret(&mut self, root: &Ast) -> Result<Value, RuntimeError> {
        match root {
            Ast::Expression(expr) => self.eval_top(expr),
            Ast::Module(module) => {
                for item in &module.body {
                    if let ModuleItem::Func(func) = item {
                        self.functions.insert(func.name.clone(), func.clone());
                    }
                }
                let mut value = Value::Unit;
                for item in &module.body {
                    if let ModuleItem::Expr(expr) = item {
                        value = self.eval_top(expr)?;
                    }
                }
                Ok(value)
            }
        }
    }

    /// Evaluate a program the way the compiled binary behaves: an Int or
    /// Bool result is printed with the matching built-in.
    pub fn run(&mut self, root: &Ast) -> Result<Value, RuntimeError> {
        let location = match root {
            Ast::Expression(expr) => expr.location.clone(),
            Ast::Module(_) => Location::none(),
        };
        let value = self.interpret(root)?;
        match &value {
            Value::Int(_) | Value::Bool(_) => self.write_line(&value, &location)?,
            Value::Unit => {}
        }
        Ok(value)
    }

    fn eval_top(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match self.eval(expr)? {
            Flow::Value(value) => Ok(value),
            Flow::Break(location) => {
                Err(RuntimeError::new(location, "\"break\" outside of loop"))
            }
            Flow::Continue(location) => {
                Err(RuntimeError::new(location, "\"continue\" outside of loop"))
            }
            Flow::Return(_) => Err(RuntimeError::new(
                expr.location.clone(),
                "\"return\" outside function",
            )),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Flow, RuntimeError> {
        let loc = expr.location.clone();
        match &expr.kind {
            ExprKind::Literal(Literal::Int(value)) => Ok(Flow::Value(Value::Int(*value))),
            ExprKind::Literal(Literal::Bool(value)) => Ok(Flow::Value(Value::Bool(*value))),
            ExprKind::Literal(Literal::Unit) => Ok(Flow::Value(Value::Unit)),

            ExprKind::Identifier { name } => {
                let value = self.table.lookup(name).cloned().ok_or_else(|| {
                    RuntimeError::new(loc, format!("Variable \"{}\" is not defined", name))
                })?;
                Ok(Flow::Value(value))
            }

            ExprKind::UnaryOp { op, operand } => {
                let value = eval_value!(self, operand);
                let result = match op.as_str() {
                    "-" => Value::Int(as_int(value, &loc, op)?.wrapping_neg()),
                    "not" => Value::Bool(!as_bool(value, &loc, op)?),
                    _ => {
                        return Err(RuntimeError::new(
                            loc,
                            format!("unknown operator \"{}\"", op),
                        ));
                    }
                };
                Ok(Flow::Value(result))
            }

            ExprKind::BinaryOp { left, op, right } => match op.as_str() {
                "=" => {
                    let ExprKind::Identifier { name } = &left.kind else {
                        return Err(RuntimeError::new(
                            loc,
                            "the left side of '=' must be a variable",
                        ));
                    };
                    let value = eval_value!(self, right);
                    if !self.table.assign(name, value.clone()) {
                        return Err(RuntimeError::new(
                            loc,
                            format!("Variable \"{}\" is not defined", name),
                        ));
                    }
                    Ok(Flow::Value(value))
                }
                "and" => {
                    if !as_bool(eval_value!(self, left), &loc, op)? {
                        return Ok(Flow::Value(Value::Bool(false)));
                    }
                    let right_value = as_bool(eval_value!(self, right), &loc, op)?;
                    Ok(Flow::Value(Value::Bool(right_value)))
                }
                "or" => {
                    if as_bool(eval_value!(self, left), &loc, op)? {
                        return Ok(Flow::Value(Value::Bool(true)));
                    }
                    let right_value = as_bool(eval_value!(self, right), &loc, op)?;
                    Ok(Flow::Value(Value::Bool(right_value)))
                }
                _ => {
                    let left_value = eval_value!(self, left);
                    let right_value = eval_value!(self, right);
                    Ok(Flow::Value(apply_binary(op, left_value, right_value, &loc)?))
                }
            },

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = as_bool(eval_value!(self, condition), &loc, "if")?;
                match else_branch {
                    // Without an else the whole expression is unit, whatever
                    // the then-branch evaluates to.
                    None => {
                        if condition {
                            eval_value!(self, then_branch);
                        }
                        Ok(Flow::Value(Value::Unit))
                    }
                    Some(else_expr) => {
                        if condition {
                            self.eval(then_branch)
                        } else {
                            self.eval(else_expr)
                        }
                    }
                }
            }

            ExprKind::While { condition, body } => {
                loop {
                    if !as_bool(eval_value!(self, condition), &loc, "while")? {
                        break;
                    }
                    match self.eval(body)? {
                        Flow::Value(_) | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Value(Value::Unit))
            }

            ExprKind::Break => Ok(Flow::Break(loc)),
            ExprKind::Continue => Ok(Flow::Continue(loc)),

            ExprKind::Block { body } => {
                self.table.push_scope();
                let mut value = Value::Unit;
                for statement in body {
                    match self.eval(statement) {
                        Ok(Flow::Value(statement_value)) => value = statement_value,
                        other => {
                            self.table.pop_scope();
                            return other;
                        }
                    }
                }
                self.table.pop_scope();
                Ok(Flow::Value(value))
            }

            ExprKind::Declaration { name, value, .. } => {
                let value = eval_value!(self, value);
                self.table.bind(name, value);
                Ok(Flow::Value(Value::Unit))
            }

            ExprKind::Call { callee, args } => {
                let mut arg_values = Vec::new();
                for arg in args {
                    arg_values.push(eval_value!(self, arg));
                }
                self.call(callee, arg_values, &loc)
            }

            ExprKind::Return { result } => {
                let value = match result {
                    Some(result) => eval_value!(self, result),
                    None => Value::Unit,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn call(
        &mut self,
        callee: &str,
        args: Vec<Value>,
        loc: &Location,
    ) -> Result<Flow, RuntimeError> {
        match callee {
            "print_int" | "print_bool" => {
                let [value] = args.as_slice() else {
                    return Err(RuntimeError::new(
                        loc.clone(),
                        format!("{} takes 1 argument, got {}", callee, args.len()),
                    ));
                };
                let int_expected = callee == "print_int";
                if int_expected != matches!(value, Value::Int(_)) {
                    return Err(RuntimeError::new(
                        loc.clone(),
                        format!("{} got a {:?} argument", callee, value),
                    ));
                }
                self.write_line(value, loc)?;
                Ok(Flow::Value(Value::Unit))
            }
            "read_int" => {
                let mut line = String::new();
                let read = self.input.read_line(&mut line).map_err(|e| {
                    RuntimeError::new(loc.clone(), format!("read_int failed: {}", e))
                })?;
                if read == 0 {
                    return Err(RuntimeError::new(
                        loc.clone(),
                        "read_int: unexpected end of input",
                    ));
                }
                let value: i64 = line.trim().parse().map_err(|_| {
                    RuntimeError::new(
                        loc.clone(),
                        format!("read_int: invalid input {:?}", line.trim()),
                    )
                })?;
                Ok(Flow::Value(Value::Int(value)))
            }
            _ => {
                let Some(func) = self.functions.get(callee).cloned() else {
                    return Err(RuntimeError::new(
                        loc.clone(),
                        format!("Variable not found: \"{}\"", callee),
                    ));
                };
                if args.len() != func.params.len() {
                    return Err(RuntimeError::new(
                        loc.clone(),
                        format!(
                            "function \"{}\" expects {} argument(s), got {}",
                            callee,
                            func.params.len(),
                            args.len()
                        ),
                    ));
                }
                // Function bodies see only their parameters, never the
                // caller's locals.
                let saved = std::mem::take(&mut self.table);
                for (param, value) in func.params.iter().zip(args) {
                    self.table.bind(&param.name, value);
                }
                let flow = self.eval(&func.body);
                self.table = saved;
                match flow? {
                    Flow::Return(value) => Ok(Flow::Value(value)),
                    // Falling off the end of a function returns unit.
                    Flow::Value(_) => Ok(Flow::Value(Value::Unit)),
                    Flow::Break(location) => {
                        Err(RuntimeError::new(location, "\"break\" outside of loop"))
                    }
                    Flow::Continue(location) => {
                        Err(RuntimeError::new(location, "\"continue\" outside of loop"))
                    }
                }
            }
        }
    }

    fn write_line(&mut self, value: &Value, loc: &Location) -> Result<(), RuntimeError> {
        writeln!(self.output, "{}", value)
            .map_err(|e| RuntimeError::new(loc.clone(), format!("write failed: {}", e)))
    }
}

fn as_int(value: Value, location: &Location, op: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(value) => Ok(value),
        other => Err(RuntimeError::new(
            location.clone(),
            format!("\"{}\" expected an Int, got {}", op, other),
        )),
    }
}

fn as_bool(value: Value, location: &Location, op: &str) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(value) => Ok(value),
        other => Err(RuntimeError::new(
            location.clone(),
            format!("\"{}\" expected a Bool, got {}", op, other),
        )),
    }
}

/// Integer arithmetic follows the emitted code: wrapping two's-complement
/// operations and truncated signed division, with explicit zero checks where
/// the hardware would fault.
fn apply_binary(
    op: &str,
    left: Value,
    right: Value,
    location: &Location,
) -> Result<Value, RuntimeError> {
    match op {
        "==" => return Ok(Value::Bool(left == right)),
        "!=" => return Ok(Value::Bool(left != right)),
        _ => {}
    }
    let a = as_int(left, location, op)?;
    let b = as_int(right, location, op)?;
    match op {
        "+" => Ok(Value::Int(a.wrapping_add(b))),
        "-" => Ok(Value::Int(a.wrapping_sub(b))),
        "*" => Ok(Value::Int(a.wrapping_mul(b))),
        "/" => {
            if b == 0 {
                return Err(RuntimeError::new(location.clone(), "division by zero"));
            }
            Ok(Value::Int(a.wrapping_div(b)))
        }
        "%" => {
            if b == 0 {
                return Err(RuntimeError::new(location.clone(), "modulo by zero"));
            }
            Ok(Value::Int(a.wrapping_rem(b)))
        }
        "<" => Ok(Value::Bool(a < b)),
        "<=" => Ok(Value::Bool(a <= b)),
        ">" => Ok(Value::Bool(a > b)),
        ">=" => Ok(Value::Bool(a >= b)),
        _ => Err(RuntimeError::new(
            location.clone(),
            format!("unknown operator \"{}\"", op),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::tokenizer::tokenize;
    use crate::typechecker::typecheck;

    fn eval_with_io(source: &str, stdin: &str) -> Result<(Value, String), RuntimeError> {
        let mut ast = Parser::new(tokenize(source, "no file").unwrap())
            .parse()
            .unwrap();
        typecheck(&mut ast).unwrap();
        let mut input = stdin.as_bytes();
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut input, &mut output);
        let value = interpreter.interpret(&ast)?;
        Ok((value, String::from_utf8(output).unwrap()))
    }

    fn eval(source: &str) -> Value {
        eval_with_io(source, "").unwrap().0
    }

    fn eval_err(source: &str) -> String {
        eval_with_io(source, "").unwrap_err().to_string()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("9001"), Value::Int(9001));
        assert_eq!(eval("true"), Value::Bool(true));
        assert_eq!(eval("false"), Value::Bool(false));
        assert_eq!(eval("{ }"), Value::Unit);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("-9001"), Value::Int(-9001));
        assert_eq!(eval("--9001"), Value::Int(9001));
        assert_eq!(eval("not false"), Value::Bool(true));
        assert_eq!(eval("not not false"), Value::Bool(false));
    }

    #[test]
    fn test_simple_arithmetic() {
        assert_eq!(eval("2 + 3"), Value::Int(5));
        assert_eq!(eval("2 - 1"), Value::Int(1));
        assert_eq!(eval("2 * 3"), Value::Int(6));
        assert_eq!(eval("4 / 2"), Value::Int(2));
        assert_eq!(eval("4 / 3"), Value::Int(1));
        assert_eq!(eval("5 % 3"), Value::Int(2));
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        // The same results idivq produces, not floor division.
        assert_eq!(eval("-7 / 2"), Value::Int(-3));
        assert_eq!(eval("-7 % 2"), Value::Int(-1));
        assert_eq!(eval("7 / -2"), Value::Int(-3));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(eval_err("1 / 0").contains("division by zero"));
        assert!(eval_err("1 % 0").contains("modulo by zero"));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("2 == 3"), Value::Bool(false));
        assert_eq!(eval("2 != 1"), Value::Bool(true));
        assert_eq!(eval("2 <= 2"), Value::Bool(true));
        assert_eq!(eval("2 < 2"), Value::Bool(false));
        assert_eq!(eval("4 >= 4"), Value::Bool(true));
        assert_eq!(eval("4 > 4"), Value::Bool(false));
    }

    #[test]
    fn test_short_circuit_skips_the_right_side() {
        // The right-hand read_int must not run, so empty stdin is fine.
        assert_eq!(
            eval("false and read_int() == 1"),
            Value::Bool(false)
        );
        assert_eq!(eval("true or read_int() == 1"), Value::Bool(true));
    }

    #[test]
    fn test_declaration_and_assignment() {
        assert_eq!(eval("var x = 4; x = 3; x"), Value::Int(3));
        assert_eq!(eval("var k = true; k"), Value::Bool(true));
        assert_eq!(eval("var x = 3; var y = 3; x + y"), Value::Int(6));
    }

    #[test]
    fn test_assignment_writes_through_inner_scopes() {
        assert_eq!(eval("{ var x = 3; { { x } x = 2 } x }"), Value::Int(2));
    }

    #[test]
    fn test_if_without_else_is_unit() {
        assert_eq!(eval("if 1 < 2 then 3"), Value::Unit);
        assert_eq!(eval("if 2 < 1 then 3"), Value::Unit);
    }

    #[test]
    fn test_if_else_picks_a_branch() {
        assert_eq!(eval("if 3 < 2 then 3 else 5"), Value::Int(5));
        assert_eq!(eval("if 1 < 2 then 3 else 5"), Value::Int(3));
    }

    #[test]
    fn test_blocks() {
        assert_eq!(eval("{}{2}"), Value::Unit);
        assert_eq!(eval("{}{}2"), Value::Int(2));
        assert_eq!(eval("var x = 3; {}{} x"), Value::Int(3));
        assert_eq!(eval("{ var x = 3; { { x } } }"), Value::Int(3));
    }

    #[test]
    fn test_while_loop() {
        let source = "
        var x = 3;
        while x > 0 do {
            x = x - 1;
        }
        x
        ";
        assert_eq!(eval(source), Value::Int(0));
    }

    #[test]
    fn test_break_leaves_the_innermost_loop() {
        let source = "
        var x = 0;
        while true do {
            x = x + 1;
            if x >= 5 then { break }
        }
        x
        ";
        assert_eq!(eval(source), Value::Int(5));
    }

    #[test]
    fn test_continue_skips_the_rest_of_the_body() {
        let source = "
        var i = 0;
        var sum = 0;
        while i < 10 do {
            i = i + 1;
            if i % 2 == 0 then { continue };
            sum = sum + i;
        }
        sum
        ";
        // 1 + 3 + 5 + 7 + 9
        assert_eq!(eval(source), Value::Int(25));
    }

    #[test]
    fn test_break_outside_loop_is_an_error() {
        assert!(eval_err("break").contains("outside of loop"));
    }

    #[test]
    fn test_print_builtins_write_lines() {
        let (_, output) = eval_with_io("print_int(42); print_bool(1 < 2);", "").unwrap();
        assert_eq!(output, "42\ntrue\n");
    }

    #[test]
    fn test_read_int_reads_lines() {
        let (value, output) =
            eval_with_io("var x = read_int(); print_int(x + 1); x", "41\n").unwrap();
        assert_eq!(value, Value::Int(41));
        assert_eq!(output, "42\n");
    }

    #[test]
    fn test_read_int_rejects_garbage() {
        let err = eval_with_io("read_int()", "not a number\n").unwrap_err();
        assert!(err.to_string().contains("invalid input"), "{}", err);
    }

    #[test]
    fn test_read_int_at_end_of_input() {
        let err = eval_with_io("read_int()", "").unwrap_err();
        assert!(err.to_string().contains("end of input"), "{}", err);
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            eval("fun inc(x: Int): Int { return x + 1 } inc(41)"),
            Value::Int(42)
        );
    }

    #[test]
    fn test_function_without_return_yields_unit() {
        assert_eq!(eval("fun f() { 1 + 1; } f()"), Value::Unit);
    }

    #[test]
    fn test_functions_do_not_see_caller_locals() {
        // The type checker rejects this statically; even an unchecked AST
        // must not leak caller locals into a callee at runtime.
        let ast = Parser::new(
            tokenize("fun f(): Int { return y } var y = 1; f()", "no file").unwrap(),
        )
        .parse()
        .unwrap();
        let mut input = "".as_bytes();
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut input, &mut output);
        let err = interpreter.interpret(&ast).unwrap_err();
        assert!(err.to_string().contains("\"y\" is not defined"), "{}", err);
    }

    #[test]
    fn test_recursion() {
        let source = "
        fun fib(n: Int): Int {
            if n <= 1 then { return n };
            return fib(n - 1) + fib(n - 2)
        }
        fib(10)
        ";
        assert_eq!(eval(source), Value::Int(55));
    }

    #[test]
    fn test_early_return_skips_the_rest() {
        let source = "
        fun sign(n: Int): Int {
            if n > 0 then { return 1 };
            if n < 0 then { return -1 };
            return 0
        }
        sign(-5)
        ";
        assert_eq!(eval(source), Value::Int(-1));
    }

    #[test]
    fn test_return_propagates_out_of_loops() {
        let source = "
        fun first_multiple(n: Int): Int {
            var candidate = n;
            while true do {
                if candidate % 7 == 0 then { return candidate };
                candidate = candidate + 1;
            }
            return 0
        }
        first_multiple(15)
        ";
        assert_eq!(eval(source), Value::Int(21));
    }

    #[test]
    fn test_run_prints_the_final_value_like_main() {
        let mut ast = Parser::new(tokenize("1 + 2 * 3", "no file").unwrap())
            .parse()
            .unwrap();
        typecheck(&mut ast).unwrap();
        let mut input = "".as_bytes();
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut input, &mut output);
        interpreter.run(&ast).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "7\n");
    }

    #[test]
    fn test_run_prints_nothing_for_unit() {
        let mut ast = Parser::new(tokenize("print_int(3);", "no file").unwrap())
            .parse()
            .unwrap();
        typecheck(&mut ast).unwrap();
        let mut input = "".as_bytes();
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut input, &mut output);
        interpreter.run(&ast).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "3\n");
    }
}
