//! Type checker for Vela.
//!
//! Walks the AST once, resolving a type for every node and writing it back
//! into the node's type slot. Built-in functions and the operators live in
//! the root scope as ordinary function-typed bindings; `==`, `!=` and `=`
//! are the only operators with special rules (their operand types must
//! match each other rather than a fixed signature).

use crate::ast::{Ast, Expr, ExprKind, FuncDef, Literal, Module, ModuleItem, TypeAnnotation};
use crate::error::CompileError;
use crate::symtab::SymTab;
use crate::types::Type;

/// Type-check `root` in place. Returns the type of the top-level expression
/// and the root scope, whose function-typed bindings (built-ins, operators,
/// user functions) seed the IR generator.
pub fn typecheck(root: &mut Ast) -> Result<(Type, SymTab<Type>), CompileError> {
    let mut checker = TypeChecker::new();
    let root_type = match root {
        Ast::Expression(expr) => {
            checker.table.push_scope();
            let ty = checker.check_expr(expr)?;
            checker.table.pop_scope();
            ty
        }
        Ast::Module(module) => checker.check_module(module)?,
    };
    Ok((root_type, checker.table))
}

struct TypeChecker {
    table: SymTab<Type>,
    /// Declared return type of the function being checked; None at top level.
    expected_return: Option<Type>,
}

impl TypeChecker {
    fn new() -> Self {
        let mut table = SymTab::new();
        table.bind("print_int", Type::function(vec![Type::Int], Type::Unit));
        table.bind("print_bool", Type::function(vec![Type::Bool], Type::Unit));
        table.bind("read_int", Type::function(vec![], Type::Int));
        for op in ["+", "-", "*", "/", "%"] {
            table.bind(op, Type::function(vec![Type::Int, Type::Int], Type::Int));
        }
        for op in ["<", "<=", ">", ">="] {
            table.bind(op, Type::function(vec![Type::Int, Type::Int], Type::Bool));
        }
        // `==` and `!=` accept any pair of equal operand types, so their
        // bindings carry no parameter list; the operand rule lives in the
        // BinaryOp case. The symbols must still be bound for lowering to
        // resolve them.
        for op in ["==", "!="] {
            table.bind(op, Type::function(vec![], Type::Bool));
        }
        table.bind("unary_-", Type::function(vec![Type::Int], Type::Int));
        table.bind("unary_not", Type::function(vec![Type::Bool], Type::Bool));
        for op in ["and", "or"] {
            table.bind(op, Type::function(vec![Type::Bool, Type::Bool], Type::Bool));
        }
        TypeChecker {
            table,
            expected_return: None,
        }
    }

    /// Modules are checked in two sweeps so functions can call each other
    /// regardless of definition order: first register every signature, then
    /// check every body. The trailing expression is checked last, in a child
    /// scope of the root.
    fn check_module(&mut self, module: &mut Module) -> Result<Type, CompileError> {
        for item in &mut module.body {
            if let ModuleItem::Func(func) = item {
                self.register_function(func)?;
            }
        }
        for item in &mut module.body {
            if let ModuleItem::Func(func) = item {
                self.check_function(func)?;
            }
        }
        let mut module_type = Type::Unit;
        for item in &mut module.body {
            if let ModuleItem::Expr(expr) = item {
                self.table.push_scope();
                module_type = self.check_expr(expr)?;
                self.table.pop_scope();
            }
        }
        Ok(module_type)
    }

    fn register_function(&mut self, func: &mut FuncDef) -> Result<(), CompileError> {
        if self.table.in_innermost(&func.name) {
            return Err(CompileError::name(
                func.location.clone(),
                format!("Function \"{}\" already declared", func.name),
            ));
        }
        let mut param_types = Vec::new();
        for param in &func.params {
            param_types.push(resolve_type_name(&param.annotation)?);
        }
        let return_type = match &func.return_annotation {
            Some(annotation) => resolve_type_name(annotation)?,
            None => Type::Unit,
        };
        func.ty = Type::function(param_types, return_type);
        self.table.bind(&func.name, func.ty.clone());
        Ok(())
    }

    fn check_function(&mut self, func: &mut FuncDef) -> Result<(), CompileError> {
        let Type::Function(fun_type) = func.ty.clone() else {
            return Err(CompileError::type_error(
                func.location.clone(),
                format!("function \"{}\" has no registered signature", func.name),
            ));
        };
        self.table.push_scope();
        for (param, ty) in func.params.iter().zip(fun_type.params) {
            self.table.bind(&param.name, ty);
        }
        self.expected_return = Some(*fun_type.return_type);
        let result = self.check_expr(&mut func.body);
        self.expected_return = None;
        self.table.pop_scope();
        result.map(|_| ())
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Result<Type, CompileError> {
        let ty = self.infer(expr)?;
        expr.ty = ty.clone();
        Ok(ty)
    }

    fn infer(&mut self, expr: &mut Expr) -> Result<Type, CompileError> {
        let location = expr.location.clone();
        match &mut expr.kind {
            ExprKind::Literal(Literal::Int(_)) => Ok(Type::Int),
            ExprKind::Literal(Literal::Bool(_)) => Ok(Type::Bool),
            ExprKind::Literal(Literal::Unit) => Ok(Type::Unit),

            ExprKind::Identifier { name } => {
                self.table.lookup(name).cloned().ok_or_else(|| {
                    CompileError::name(location, format!("Variable \"{}\" is not defined", name))
                })
            }

            ExprKind::BinaryOp { left, op, right } => {
                if op == "=" && !matches!(left.kind, ExprKind::Identifier { .. }) {
                    return Err(CompileError::syntax(
                        location,
                        "the left side of '=' must be a variable",
                    ));
                }
                let left_type = self.check_expr(left)?;
                let right_type = self.check_expr(right)?;

                if matches!(op.as_str(), "=" | "==" | "!=") {
                    if left_type != right_type {
                        return Err(CompileError::type_error(
                            location,
                            format!(
                                "operator \"{}\": {} is not {}",
                                op, left_type, right_type
                            ),
                        ));
                    }
                    return Ok(if op == "=" { right_type } else { Type::Bool });
                }

                let Some(Type::Function(op_type)) = self.table.lookup(op.as_str()).cloned()
                else {
                    return Err(CompileError::name(
                        location,
                        format!("Operator \"{}\" is not defined", op),
                    ));
                };
                if left_type != op_type.params[0] {
                    return Err(CompileError::type_error(
                        location,
                        format!(
                            "operator \"{}\" left side expected {}, got {}",
                            op, op_type.params[0], left_type
                        ),
                    ));
                }
                if right_type != op_type.params[1] {
                    return Err(CompileError::type_error(
                        location,
                        format!(
                            "operator \"{}\" right side expected {}, got {}",
                            op, op_type.params[1], right_type
                        ),
                    ));
                }
                Ok(*op_type.return_type)
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand_type = self.check_expr(operand)?;
                let Some(Type::Function(op_type)) =
                    self.table.lookup(&format!("unary_{}", op)).cloned()
                else {
                    return Err(CompileError::name(
                        location,
                        format!("Operator \"{}\" is not defined", op),
                    ));
                };
                if operand_type != op_type.params[0] {
                    return Err(CompileError::type_error(
                        location,
                        format!(
                            "operator \"{}\" expected {}, got {}",
                            op, op_type.params[0], operand_type
                        ),
                    ));
                }
                Ok(*op_type.return_type)
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_type = self.check_expr(condition)?;
                if condition_type != Type::Bool {
                    return Err(CompileError::type_error(
                        location,
                        format!("expected Bool, got {}", condition_type),
                    ));
                }
                let then_type = self.check_expr(then_branch)?;
                match else_branch {
                    // `if c then e` is Unit no matter what `e` is.
                    None => Ok(Type::Unit),
                    Some(else_expr) => {
                        let else_type = self.check_expr(else_expr)?;
                        if then_type != else_type {
                            return Err(CompileError::type_error(
                                location,
                                format!("expected {}, got {}", then_type, else_type),
                            ));
                        }
                        Ok(else_type)
                    }
                }
            }

            ExprKind::While { condition, body } => {
                let condition_type = self.check_expr(condition)?;
                if condition_type != Type::Bool {
                    return Err(CompileError::type_error(
                        location,
                        format!("while-loop condition should be a Bool, got {}", condition_type),
                    ));
                }
                self.check_expr(body)
            }

            // Loop placement is checked during lowering, where the loop
            // context is tracked.
            ExprKind::Break | ExprKind::Continue => Ok(Type::Unit),

            ExprKind::Block { body } => {
                self.table.push_scope();
                let mut block_type = Type::Unit;
                for statement in body {
                    block_type = self.check_expr(statement)?;
                }
                self.table.pop_scope();
                Ok(block_type)
            }

            ExprKind::Declaration {
                name,
                annotation,
                value,
            } => {
                let value_type = self.check_expr(value)?;
                if let Some(annotation) = annotation {
                    let annotated = resolve_type_name(annotation)?;
                    if value_type != annotated {
                        return Err(CompileError::type_error(
                            location,
                            format!("expected {}, got {}", annotated, value_type),
                        ));
                    }
                }
                if self.table.in_innermost(name) {
                    return Err(CompileError::name(
                        location,
                        format!("Variable \"{}\" already declared in this scope", name),
                    ));
                }
                self.table.bind(name, value_type);
                Ok(Type::Unit)
            }

            ExprKind::Call { callee, args } => {
                let Some(callee_type) = self.table.lookup(callee.as_str()).cloned() else {
                    return Err(CompileError::name(
                        location,
                        format!("Variable not found: \"{}\"", callee),
                    ));
                };
                let Type::Function(fun_type) = callee_type else {
                    return Err(CompileError::type_error(
                        location,
                        format!("\"{}\" is not a function", callee),
                    ));
                };
                if args.len() != fun_type.params.len() {
                    return Err(CompileError::type_error(
                        location,
                        format!(
                            "function \"{}\" expects {} argument(s), got {}",
                            callee,
                            fun_type.params.len(),
                            args.len()
                        ),
                    ));
                }
                for (i, (arg, expected)) in args.iter_mut().zip(&fun_type.params).enumerate() {
                    let got = self.check_expr(arg)?;
                    if got != *expected {
                        return Err(CompileError::type_error(
                            location,
                            format!(
                                "function parameter {} expected {}, got {}",
                                i + 1,
                                expected,
                                got
                            ),
                        ));
                    }
                }
                Ok(*fun_type.return_type)
            }

            ExprKind::Return { result } => {
                let Some(expected) = self.expected_return.clone() else {
                    return Err(CompileError::syntax(location, "\"return\" outside function"));
                };
                let result_type = match result {
                    Some(value) => self.check_expr(value)?,
                    None => Type::Unit,
                };
                if result_type != expected {
                    return Err(CompileError::type_error(
                        location,
                        format!("expected {}, got {}", expected, result_type),
                    ));
                }
                Ok(Type::Unit)
            }
        }
    }
}

/// Resolve a surface type name. The set of valid names is fixed; local
/// bindings never shadow a type name.
fn resolve_type_name(annotation: &TypeAnnotation) -> Result<Type, CompileError> {
    match annotation.name.as_str() {
        "Int" => Ok(Type::Int),
        "Bool" => Ok(Type::Bool),
        "Unit" => Ok(Type::Unit),
        _ => Err(CompileError::type_error(
            annotation.location.clone(),
            format!("Unknown type \"{}\"", annotation.name),
        )),
    }
}
