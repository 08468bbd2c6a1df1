//! Lowering from the typed AST to three-address IR.
//!
//! Produces one instruction list per function, keyed by name in definition
//! order. The top-level expression becomes `main`; a module with only
//! function definitions still gets an empty `main`. Temporaries and labels
//! are minted per function: `x1, x2, ...` for values (skipping any name a
//! parameter already took) and per-base counters for labels (`then`,
//! `then2`, ...).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::{Ast, Expr, ExprKind, Literal, ModuleItem};
use crate::error::CompileError;
use crate::ir::{IRVar, Instruction, Label};
use crate::symtab::SymTab;
use crate::tokenizer::Location;
use crate::types::Type;

/// Per-function IR lists in emission order.
pub type IrMap = IndexMap<String, Vec<Instruction>>;

/// Extract the IR generator's root environment from the checker's root
/// scope: every function-typed binding (built-in, operator, user function)
/// maps to its return type, which is what a `Call` of it produces.
pub fn root_types(table: &SymTab<Type>) -> HashMap<IRVar, Type> {
    table
        .root_bindings()
        .filter_map(|(name, ty)| match ty {
            Type::Function(fun) => Some((IRVar::new(name), (*fun.return_type).clone())),
            _ => None,
        })
        .collect()
}

/// Lower a typed AST into per-function IR.
pub fn generate_ir(
    root_types: &HashMap<IRVar, Type>,
    root: &Ast,
) -> Result<IrMap, CompileError> {
    let mut functions = IrMap::new();

    match root {
        Ast::Module(module) => {
            for item in &module.body {
                match item {
                    ModuleItem::Func(func) => {
                        let Type::Function(fun_type) = &func.ty else {
                            return Err(CompileError::type_error(
                                func.location.clone(),
                                format!("function \"{}\" has no resolved type", func.name),
                            ));
                        };
                        let mut types = root_types.clone();
                        let mut params = Vec::new();
                        for (param, ty) in func.params.iter().zip(&fun_type.params) {
                            let var = IRVar::new(&param.name);
                            types.insert(var.clone(), ty.clone());
                            params.push(var);
                        }
                        let head = Instruction::FunctionDef {
                            location: func.location.clone(),
                            name: func.name.clone(),
                            params,
                        };
                        let list = lower_function(head, types, &func.body, true)?;
                        functions.insert(func.name.clone(), list);
                    }
                    ModuleItem::Expr(expr) => {
                        functions.insert("main".to_string(), lower_main(root_types, expr)?);
                    }
                }
            }
            if !functions.contains_key("main") {
                let placeholder =
                    Expr::new(ExprKind::Literal(Literal::Unit), Location::none());
                functions.insert("main".to_string(), lower_main(root_types, &placeholder)?);
            }
        }
        Ast::Expression(expr) => {
            functions.insert("main".to_string(), lower_main(root_types, expr)?);
        }
    }

    Ok(functions)
}

fn lower_main(
    root_types: &HashMap<IRVar, Type>,
    expr: &Expr,
) -> Result<Vec<Instruction>, CompileError> {
    let head = Instruction::FunctionDef {
        location: expr.location.clone(),
        name: "main".to_string(),
        params: Vec::new(),
    };
    lower_function(head, root_types.clone(), expr, false)
}

/// Lower one function body. For a user function (`is_function`), a missing
/// final `Return` gets `Return(unit)` appended. For `main`, an Int- or
/// Bool-valued result is printed with the matching built-in before the
/// terminal `Return(unit)`.
fn lower_function(
    head: Instruction,
    types: HashMap<IRVar, Type>,
    body: &Expr,
    is_function: bool,
) -> Result<Vec<Instruction>, CompileError> {
    let root_location = body.location.clone();
    let mut generator = FunctionGenerator::new(types, root_location.clone());

    generator.instructions.push(head);
    let start = generator.new_label("start");
    generator.instructions.push(Instruction::Label(start));

    let final_var = generator.visit(body)?;

    if is_function {
        if !matches!(
            generator.instructions.last(),
            Some(Instruction::Return { .. })
        ) {
            generator.emit_return(root_location, generator.unit.clone());
        }
    } else {
        let final_type = generator.var_types.get(&final_var).cloned();
        match final_type {
            Some(Type::Int) => generator.emit_print("print_int", &final_var, &root_location)?,
            Some(Type::Bool) => generator.emit_print("print_bool", &final_var, &root_location)?,
            _ => {}
        }
        generator.emit_return(root_location, generator.unit.clone());
    }

    Ok(generator.instructions)
}

struct FunctionGenerator {
    instructions: Vec<Instruction>,
    var_types: HashMap<IRVar, Type>,
    table: SymTab<IRVar>,
    unit: IRVar,
    next_var: usize,
    label_counts: HashMap<String, usize>,
    /// Innermost loop last: (start label, end label) targets for
    /// continue/break.
    loop_labels: Vec<(Label, Label)>,
    root_location: Location,
}

impl FunctionGenerator {
    fn new(types: HashMap<IRVar, Type>, root_location: Location) -> Self {
        let mut table = SymTab::new();
        for var in types.keys() {
            table.bind(&var.name, var.clone());
        }
        let unit = IRVar::unit();
        let mut var_types = types;
        var_types.insert(unit.clone(), Type::Unit);
        FunctionGenerator {
            instructions: Vec::new(),
            var_types,
            table,
            unit,
            next_var: 1,
            label_counts: HashMap::new(),
            loop_labels: Vec::new(),
            root_location,
        }
    }

    /// Mint a fresh typed temporary, skipping names already taken (a
    /// parameter literally named `x1` is never reused).
    fn new_var(&mut self, ty: Type) -> IRVar {
        let mut var = IRVar::new(format!("x{}", self.next_var));
        self.next_var += 1;
        while self.var_types.contains_key(&var) {
            var = IRVar::new(format!("x{}", self.next_var));
            self.next_var += 1;
        }
        self.var_types.insert(var.clone(), ty);
        var
    }

    /// Mint a label unique within this function: the first use of a base
    /// name is bare, later uses get a numeric suffix starting at 2.
    fn new_label(&mut self, base: &str) -> Label {
        let count = self.label_counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            base.to_string()
        } else {
            format!("{}{}", base, count)
        };
        Label {
            location: self.root_location.clone(),
            name,
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn emit_return(&mut self, location: Location, result: IRVar) {
        self.emit(Instruction::Return { location, result });
    }

    fn emit_print(
        &mut self,
        name: &str,
        value: &IRVar,
        location: &Location,
    ) -> Result<(), CompileError> {
        let fun = self.require(name, location)?;
        let dest = self.new_var(Type::Unit);
        self.emit(Instruction::Call {
            location: location.clone(),
            fun,
            args: vec![value.clone()],
            dest,
        });
        Ok(())
    }

    fn require(&self, name: &str, location: &Location) -> Result<IRVar, CompileError> {
        self.table.lookup(name).cloned().ok_or_else(|| {
            CompileError::name(
                location.clone(),
                format!("Variable \"{}\" is not defined", name),
            )
        })
    }

    fn visit(&mut self, expr: &Expr) -> Result<IRVar, CompileError> {
        let loc = expr.location.clone();
        match &expr.kind {
            ExprKind::Literal(Literal::Int(value)) => {
                let var = self.new_var(Type::Int);
                self.emit(Instruction::LoadIntConst {
                    location: loc,
                    value: *value,
                    dest: var.clone(),
                });
                Ok(var)
            }
            ExprKind::Literal(Literal::Bool(value)) => {
                let var = self.new_var(Type::Bool);
                self.emit(Instruction::LoadBoolConst {
                    location: loc,
                    value: *value,
                    dest: var.clone(),
                });
                Ok(var)
            }
            ExprKind::Literal(Literal::Unit) => Ok(self.unit.clone()),

            ExprKind::Identifier { name } => self.require(name, &loc),

            ExprKind::BinaryOp { left, op, right } => self.visit_binary_op(left, op, right, expr, loc),

            ExprKind::UnaryOp { op, operand } => {
                let fun = self.require(&format!("unary_{}", op), &loc)?;
                let operand_var = self.visit(operand)?;
                let result = self.new_var(expr.ty.clone());
                self.emit(Instruction::Call {
                    location: loc,
                    fun,
                    args: vec![operand_var],
                    dest: result.clone(),
                });
                Ok(result)
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.visit_if(condition, then_branch, else_branch.as_deref(), expr, loc),

            ExprKind::While { condition, body } => {
                let l_start = self.new_label("while_start");
                let l_body = self.new_label("while_body");
                let l_end = self.new_label("while_end");

                self.emit(Instruction::Label(l_start.clone()));
                let cond_var = self.visit(condition)?;
                self.emit(Instruction::CondJump {
                    location: loc.clone(),
                    cond: cond_var,
                    then_label: l_body.clone(),
                    else_label: l_end.clone(),
                });

                self.emit(Instruction::Label(l_body));
                self.loop_labels.push((l_start.clone(), l_end.clone()));
                let body_result = self.visit(body);
                self.loop_labels.pop();
                body_result?;
                self.emit(Instruction::Jump {
                    location: loc,
                    label: l_start,
                });

                self.emit(Instruction::Label(l_end));
                Ok(self.unit.clone())
            }

            ExprKind::Break | ExprKind::Continue => {
                let is_break = matches!(expr.kind, ExprKind::Break);
                let Some((start, end)) = self.loop_labels.last().cloned() else {
                    let name = if is_break { "break" } else { "continue" };
                    return Err(CompileError::syntax(
                        loc,
                        format!("\"{}\" outside of loop", name),
                    ));
                };
                let target = if is_break { end } else { start };
                self.emit(Instruction::Jump {
                    location: loc,
                    label: target,
                });
                Ok(self.unit.clone())
            }

            ExprKind::Block { body } => {
                self.table.push_scope();
                let mut block_var = self.unit.clone();
                for statement in body {
                    match self.visit(statement) {
                        Ok(var) => block_var = var,
                        Err(e) => {
                            self.table.pop_scope();
                            return Err(e);
                        }
                    }
                }
                self.table.pop_scope();
                Ok(block_var)
            }

            ExprKind::Declaration { name, value, .. } => {
                let value_var = self.visit(value)?;
                let var = self.new_var(value.ty.clone());
                self.emit(Instruction::Copy {
                    location: loc,
                    source: value_var,
                    dest: var.clone(),
                });
                self.table.bind(name, var);
                Ok(self.unit.clone())
            }

            ExprKind::Call { callee, args } => {
                let mut arg_vars = Vec::new();
                for arg in args {
                    arg_vars.push(self.visit(arg)?);
                }
                let fun = self.require(callee, &loc)?;
                let return_type = self.var_types.get(&fun).cloned().ok_or_else(|| {
                    CompileError::name(
                        loc.clone(),
                        format!("Variable \"{}\" is not defined", callee),
                    )
                })?;
                let result = self.new_var(return_type);
                self.emit(Instruction::Call {
                    location: loc,
                    fun,
                    args: arg_vars,
                    dest: result.clone(),
                });
                Ok(result)
            }

            ExprKind::Return { result } => {
                let result_var = match result {
                    Some(value) => self.visit(value)?,
                    None => self.unit.clone(),
                };
                self.emit_return(loc, result_var);
                Ok(self.unit.clone())
            }
        }
    }

    fn visit_binary_op(
        &mut self,
        left: &Expr,
        op: &str,
        right: &Expr,
        expr: &Expr,
        loc: Location,
    ) -> Result<IRVar, CompileError> {
        let left_var = self.visit(left)?;

        if op == "=" {
            let right_var = self.visit(right)?;
            self.emit(Instruction::Copy {
                location: loc,
                source: right_var,
                dest: left_var.clone(),
            });
            return Ok(left_var);
        }

        if op == "and" || op == "or" {
            let l_right = self.new_label(&format!("{}_right", op));
            let l_skip = self.new_label(&format!("{}_skip", op));
            let l_end = self.new_label(&format!("{}_end", op));

            // `and` evaluates the right side only when the left is true,
            // `or` only when it is false.
            let (then_label, else_label) = if op == "and" {
                (l_right.clone(), l_skip.clone())
            } else {
                (l_skip.clone(), l_right.clone())
            };
            self.emit(Instruction::CondJump {
                location: loc.clone(),
                cond: left_var,
                then_label,
                else_label,
            });

            self.emit(Instruction::Label(l_right));
            let right_var = self.visit(right)?;
            let result = self.new_var(Type::Bool);
            self.emit(Instruction::Copy {
                location: loc.clone(),
                source: right_var,
                dest: result.clone(),
            });
            self.emit(Instruction::Jump {
                location: loc.clone(),
                label: l_end.clone(),
            });

            self.emit(Instruction::Label(l_skip));
            self.emit(Instruction::LoadBoolConst {
                location: loc.clone(),
                value: op == "or",
                dest: result.clone(),
            });
            self.emit(Instruction::Jump {
                location: loc,
                label: l_end.clone(),
            });

            self.emit(Instruction::Label(l_end));
            return Ok(result);
        }

        let fun = self.require(op, &loc)?;
        let right_var = self.visit(right)?;
        let result = self.new_var(expr.ty.clone());
        self.emit(Instruction::Call {
            location: loc,
            fun,
            args: vec![left_var, right_var],
            dest: result.clone(),
        });
        Ok(result)
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
        expr: &Expr,
        loc: Location,
    ) -> Result<IRVar, CompileError> {
        let l_then = self.new_label("then");
        let cond_var = self.visit(condition)?;

        match else_branch {
            None => {
                let l_end = self.new_label("if_end");
                self.emit(Instruction::CondJump {
                    location: loc,
                    cond: cond_var,
                    then_label: l_then.clone(),
                    else_label: l_end.clone(),
                });
                self.emit(Instruction::Label(l_then));
                self.visit(then_branch)?;
                self.emit(Instruction::Label(l_end));
                Ok(self.unit.clone())
            }
            Some(else_expr) => {
                let l_else = self.new_label("else");
                let l_end = self.new_label("if_end");
                self.emit(Instruction::CondJump {
                    location: loc.clone(),
                    cond: cond_var,
                    then_label: l_then.clone(),
                    else_label: l_else.clone(),
                });
                // Both branches converge into one result temporary typed by
                // the whole if; a branch yielding the unit sentinel is
                // copied as-is.
                let result = self.new_var(expr.ty.clone());

                self.emit(Instruction::Label(l_then));
                let then_var = self.visit(then_branch)?;
                self.emit(Instruction::Copy {
                    location: loc.clone(),
                    source: then_var,
                    dest: result.clone(),
                });
                self.emit(Instruction::Jump {
                    location: loc.clone(),
                    label: l_end.clone(),
                });

                self.emit(Instruction::Label(l_else));
                let else_var = self.visit(else_expr)?;
                self.emit(Instruction::Copy {
                    location: loc,
                    source: else_var,
                    dest: result.clone(),
                });

                self.emit(Instruction::Label(l_end));
                Ok(result)
            }
        }
    }
}
