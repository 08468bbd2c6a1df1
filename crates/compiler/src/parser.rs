//! Recursive-descent parser for Vela.
//!
//! Produces the AST from the tokenizer's output. The grammar is
//! expression-oriented: statements exist only as the elements of a block
//! body, and the top level of a file is an implicit block. Precedence from
//! lowest to highest: assignment (right-associative), `or`, `and`, equality,
//! relational, additive, multiplicative, unary, factor.

use crate::ast::{Ast, Expr, ExprKind, FuncDef, FuncParam, Literal, Module, ModuleItem, TypeAnnotation};
use crate::error::CompileError;
use crate::tokenizer::{Location, Token, TokenKind};
use crate::types::Type;

/// Left-associative binary operator levels, loosest first. Assignment and
/// the unary operators are handled separately.
const BINARY_OPERATORS: [&[&str]; 6] = [
    &["or"],
    &["and"],
    &["==", "!="],
    &["<", "<=", ">", ">="],
    &["+", "-"],
    &["*", "/", "%"],
];

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end_token: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end_location = tokens
            .last()
            .map(|t| t.location.clone())
            .unwrap_or_else(Location::none);
        let end_token = Token::new(TokenKind::End, "", end_location);
        Parser {
            tokens,
            pos: 0,
            end_token,
        }
    }

    /// Parse the whole token stream. The root is a bare expression unless the
    /// source contains at least one function definition, in which case it is
    /// a module whose trailing item holds the non-function statements.
    pub fn parse(&mut self) -> Result<Ast, CompileError> {
        if self.tokens.is_empty() {
            return Ok(Ast::Expression(Expr::new(
                ExprKind::Literal(Literal::Unit),
                Location::none(),
            )));
        }
        let first_location = self.tokens[0].location.clone();

        let (funcs, statements) = self.parse_top_level()?;

        let trailing = match statements.len() {
            0 => None,
            1 => statements.into_iter().next(),
            _ => {
                let location = statements[0].location.clone();
                Some(Expr::new(ExprKind::Block { body: statements }, location))
            }
        };

        if funcs.is_empty() {
            Ok(Ast::Expression(trailing.unwrap_or_else(|| {
                Expr::new(ExprKind::Literal(Literal::Unit), first_location)
            })))
        } else {
            let mut body: Vec<ModuleItem> = funcs.into_iter().map(ModuleItem::Func).collect();
            if let Some(expr) = trailing {
                body.push(ModuleItem::Expr(expr));
            }
            Ok(Ast::Module(Module { body }))
        }
    }

    // ---- token plumbing ----

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.end_token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, text: &str) -> bool {
        self.peek().text == text
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    /// Text of the most recently consumed token.
    fn previous_text(&self) -> Option<&str> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.text.as_str())
    }

    fn describe(token: &Token) -> String {
        if token.kind == TokenKind::End {
            "end of input".to_string()
        } else {
            format!("'{}'", token.text)
        }
    }

    fn consume(&mut self, expected: &str) -> Result<Token, CompileError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(CompileError::syntax(
                self.peek().location.clone(),
                format!("expected '{}', got {}", expected, Self::describe(self.peek())),
            ))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<Token, CompileError> {
        if self.peek().kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            Err(CompileError::syntax(
                self.peek().location.clone(),
                format!(
                    "expected an identifier {}, got {}",
                    context,
                    Self::describe(self.peek())
                ),
            ))
        }
    }

    // ---- statements and the top level ----

    /// Parse top-level items until the input runs out. Function definitions
    /// and plain statements may mix; the statements collect into one list
    /// with the same semicolon rules as a block body.
    fn parse_top_level(&mut self) -> Result<(Vec<FuncDef>, Vec<Expr>), CompileError> {
        let mut funcs = Vec::new();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.peek().kind == TokenKind::Function {
                funcs.push(self.parse_function_def()?);
                continue;
            }
            let statement = self.parse_expression()?;
            body.push(statement);
            if self.check(";") {
                let semi = self.advance();
                if self.at_end() {
                    body.push(Expr::new(ExprKind::Literal(Literal::Unit), semi.location));
                }
            } else if !self.at_end()
                && self.peek().kind != TokenKind::Function
                && self.previous_text() != Some("}")
            {
                return Err(CompileError::syntax(
                    self.peek().location.clone(),
                    format!("expected ';', got {}", Self::describe(self.peek())),
                ));
            }
        }
        Ok((funcs, body))
    }

    /// Parse the statements of a brace-enclosed block, stopping before `}`.
    /// A statement list ending in `;` gets a trailing unit literal; two
    /// adjacent statements are legal only when the first ends in `}`.
    fn parse_statements(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut body = Vec::new();
        while !self.check("}") {
            if self.at_end() {
                return Err(CompileError::syntax(
                    self.peek().location.clone(),
                    "expected '}', got end of input",
                ));
            }
            let statement = self.parse_expression()?;
            body.push(statement);
            if self.check(";") {
                let semi = self.advance();
                if self.check("}") {
                    body.push(Expr::new(ExprKind::Literal(Literal::Unit), semi.location));
                }
            } else if !self.check("}") && self.previous_text() != Some("}") {
                return Err(CompileError::syntax(
                    self.peek().location.clone(),
                    format!("expected ';', got {}", Self::describe(self.peek())),
                ));
            }
        }
        Ok(body)
    }

    fn parse_function_def(&mut self) -> Result<FuncDef, CompileError> {
        let fun_token = self.advance();
        let name = self.expect_identifier("after 'fun'")?;
        self.consume("(")?;
        let mut params = Vec::new();
        if !self.check(")") {
            loop {
                let param_name = self.expect_identifier("as a parameter name")?;
                self.consume(":")?;
                let annotation = self.parse_type_annotation()?;
                params.push(FuncParam {
                    name: param_name.text,
                    annotation,
                    location: param_name.location,
                });
                if self.check(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(")")?;
        let return_annotation = if self.check(":") {
            self.advance();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        if !self.check("{") {
            return Err(CompileError::syntax(
                self.peek().location.clone(),
                format!(
                    "expected a function body block, got {}",
                    Self::describe(self.peek())
                ),
            ));
        }
        let body = self.parse_block()?;
        Ok(FuncDef {
            name: name.text,
            params,
            return_annotation,
            body,
            location: fun_token.location,
            ty: Type::Unit,
        })
    }

    fn parse_type_annotation(&mut self) -> Result<TypeAnnotation, CompileError> {
        let token = self.expect_identifier("as a type name")?;
        Ok(TypeAnnotation {
            name: token.text,
            location: token.location,
        })
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        let left = self.parse_binary(0)?;
        if self.check("=") {
            let op = self.advance();
            let right = self.parse_expression()?;
            return Ok(Expr::new(
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op: op.text,
                    right: Box::new(right),
                },
                op.location,
            ));
        }
        Ok(left)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, CompileError> {
        if level == BINARY_OPERATORS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while BINARY_OPERATORS[level].contains(&self.peek().text.as_str()) {
            let op = self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::new(
                ExprKind::BinaryOp {
                    left: Box::new(left),
                    op: op.text,
                    right: Box::new(right),
                },
                op.location,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if (self.check("-") || self.check("not")) && self.peek().kind == TokenKind::Operator {
            let op = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: op.text,
                    operand: Box::new(operand),
                },
                op.location,
            ));
        }
        self.parse_factor()
    }

    fn parse_factor(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Punctuation if token.text == "(" => self.parse_parenthesized(),
            TokenKind::Punctuation if token.text == "{" => self.parse_block(),
            TokenKind::Declaration => self.parse_var_declaration(),
            TokenKind::Conditional if token.text == "if" => self.parse_if(),
            TokenKind::WhileLoop if token.text == "while" => self.parse_while(),
            TokenKind::BreakContinue => {
                let token = self.advance();
                let kind = if token.text == "break" {
                    ExprKind::Break
                } else {
                    ExprKind::Continue
                };
                Ok(Expr::new(kind, token.location))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::IntLiteral => self.parse_int_literal(),
            TokenKind::BoolLiteral => {
                let token = self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Bool(token.text == "true")),
                    token.location,
                ))
            }
            TokenKind::Identifier => self.parse_identifier_or_call(),
            _ => Err(CompileError::syntax(
                token.location.clone(),
                format!("expected an expression, got {}", Self::describe(&token)),
            )),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, CompileError> {
        self.consume("(")?;
        let expression = self.parse_expression()?;
        self.consume(")")?;
        Ok(expression)
    }

    fn parse_block(&mut self) -> Result<Expr, CompileError> {
        let open = self.consume("{")?;
        let body = self.parse_statements()?;
        self.consume("}")?;
        Ok(Expr::new(ExprKind::Block { body }, open.location))
    }

    fn parse_var_declaration(&mut self) -> Result<Expr, CompileError> {
        // Declarations are statements: legal at the start of input or right
        // after '{', '}' or ';'. This rejects `if c then var x = 1`.
        let legal = self.pos == 0
            || matches!(
                self.tokens[self.pos - 1].text.as_str(),
                "{" | "}" | ";"
            );
        let var_token = self.advance();
        if !legal {
            return Err(CompileError::syntax(
                var_token.location,
                "a variable declaration is only allowed at the start of a block or after ';'",
            ));
        }
        let name = self.expect_identifier("after 'var'")?;
        let annotation = if self.check(":") {
            self.advance();
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        self.consume("=")?;
        let value = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::Declaration {
                name: name.text,
                annotation,
                value: Box::new(value),
            },
            var_token.location,
        ))
    }

    fn parse_if(&mut self) -> Result<Expr, CompileError> {
        let if_token = self.advance();
        let condition = self.parse_expression()?;
        self.consume("then")?;
        let then_branch = self.parse_expression()?;
        let else_branch = if self.check("else") {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            if_token.location,
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, CompileError> {
        let while_token = self.advance();
        let condition = self.parse_expression()?;
        self.consume("do")?;
        let body = self.parse_expression()?;
        Ok(Expr::new(
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            while_token.location,
        ))
    }

    fn parse_return(&mut self) -> Result<Expr, CompileError> {
        let return_token = self.advance();
        // A bare `return` must be followed by ';', '}' or the end of input.
        let result = if self.check(";") || self.check("}") || self.at_end() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        Ok(Expr::new(ExprKind::Return { result }, return_token.location))
    }

    fn parse_int_literal(&mut self) -> Result<Expr, CompileError> {
        let token = self.advance();
        let value: i64 = token.text.parse().map_err(|_| {
            CompileError::syntax(
                token.location.clone(),
                format!("integer literal out of range: {}", token.text),
            )
        })?;
        Ok(Expr::new(
            ExprKind::Literal(Literal::Int(value)),
            token.location,
        ))
    }

    fn parse_identifier_or_call(&mut self) -> Result<Expr, CompileError> {
        let token = self.advance();
        if self.check("(") {
            self.advance();
            let mut args = Vec::new();
            if !self.check(")") {
                loop {
                    args.push(self.parse_expression()?);
                    if self.check(",") {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.consume(")")?;
            Ok(Expr::new(
                ExprKind::Call {
                    callee: token.text,
                    args,
                },
                token.location,
            ))
        } else {
            Ok(Expr::new(
                ExprKind::Identifier { name: token.text },
                token.location,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_str(source: &str) -> Ast {
        Parser::new(tokenize(source, "no file").unwrap())
            .parse()
            .unwrap()
    }

    fn parse_err(source: &str) -> String {
        Parser::new(tokenize(source, "no file").unwrap())
            .parse()
            .unwrap_err()
            .to_string()
    }

    fn expr(source: &str) -> Expr {
        match parse_str(source) {
            Ast::Expression(e) => e,
            Ast::Module(_) => panic!("expected a bare expression root"),
        }
    }

    /// Compact structural rendering for shape assertions.
    fn sexpr(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Literal(Literal::Int(v)) => v.to_string(),
            ExprKind::Literal(Literal::Bool(v)) => v.to_string(),
            ExprKind::Literal(Literal::Unit) => "unit".to_string(),
            ExprKind::Identifier { name } => name.clone(),
            ExprKind::BinaryOp { left, op, right } => {
                format!("({} {} {})", op, sexpr(left), sexpr(right))
            }
            ExprKind::UnaryOp { op, operand } => format!("(unary_{} {})", op, sexpr(operand)),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(e) => format!(
                    "(if {} {} {})",
                    sexpr(condition),
                    sexpr(then_branch),
                    sexpr(e)
                ),
                None => format!("(if {} {})", sexpr(condition), sexpr(then_branch)),
            },
            ExprKind::While { condition, body } => {
                format!("(while {} {})", sexpr(condition), sexpr(body))
            }
            ExprKind::Break => "break".to_string(),
            ExprKind::Continue => "continue".to_string(),
            ExprKind::Declaration {
                name,
                annotation,
                value,
            } => match annotation {
                Some(a) => format!("(var {} : {} {})", name, a.name, sexpr(value)),
                None => format!("(var {} {})", name, sexpr(value)),
            },
            ExprKind::Block { body } => {
                let inner: Vec<String> = body.iter().map(sexpr).collect();
                format!("(block {})", inner.join(" "))
            }
            ExprKind::Call { callee, args } => {
                let inner: Vec<String> = args.iter().map(sexpr).collect();
                if inner.is_empty() {
                    format!("(call {})", callee)
                } else {
                    format!("(call {} {})", callee, inner.join(" "))
                }
            }
            ExprKind::Return { result } => match result {
                Some(e) => format!("(return {})", sexpr(e)),
                None => "(return)".to_string(),
            },
        }
    }

    fn shape(source: &str) -> String {
        sexpr(&expr(source))
    }

    #[test]
    fn test_parse_simple_binary_summation() {
        assert_eq!(shape("3 + 2"), "(+ 3 2)");
    }

    #[test]
    fn test_parse_binary_left_associativity() {
        assert_eq!(shape("2 - variable + 3 + x"), "(+ (+ (- 2 variable) 3) x)");
    }

    #[test]
    fn test_parse_multiplication_binds_tighter() {
        assert_eq!(shape("2 - variable * 3 + x"), "(+ (- 2 (* variable 3)) x)");
    }

    #[test]
    fn test_parse_parenthesized() {
        assert_eq!(shape("2 - (variable + (3 + x))"), "(- 2 (+ variable (+ 3 x)))");
    }

    #[test]
    fn test_parse_remainder() {
        assert_eq!(shape("a + 3 % 2"), "(+ a (% 3 2))");
    }

    #[test]
    fn test_parse_relational_and_equality() {
        assert_eq!(shape("2 > 3 + x != 2 * 3"), "(!= (> 2 (+ 3 x)) (* 2 3))");
    }

    #[test]
    fn test_parse_equality_chain() {
        assert_eq!(shape("2 == x != 3"), "(!= (== 2 x) 3)");
    }

    #[test]
    fn test_parse_and_or_chain() {
        assert_eq!(shape("x and 2 or 3 or 5"), "(or (or (and x 2) 3) 5)");
    }

    #[test]
    fn test_parse_and_or_with_parentheses() {
        assert_eq!(shape("(3 + 3 and x) * 3 or x"), "(or (* (and (+ 3 3) x) 3) x)");
    }

    #[test]
    fn test_parse_bool_literals() {
        assert_eq!(shape("true == false"), "(== true false)");
    }

    #[test]
    fn test_parse_unary_chain() {
        assert_eq!(
            shape("not not - - not - x"),
            "(unary_not (unary_not (unary_- (unary_- (unary_not (unary_- x))))))"
        );
    }

    #[test]
    fn test_parse_binary_minus_mixed_with_unary_minus() {
        assert_eq!(shape("3---3"), "(- 3 (unary_- (unary_- 3)))");
    }

    #[test]
    fn test_parse_unary_minus_of_parenthesized() {
        assert_eq!(shape("- (1 + x * 3)"), "(unary_- (+ 1 (* x 3)))");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(shape("x = 2"), "(= x 2)");
    }

    #[test]
    fn test_parse_assignment_is_right_associative() {
        assert_eq!(shape("x = y = 2"), "(= x (= y 2))");
    }

    #[test]
    fn test_parse_assignment_binds_loosest() {
        assert_eq!(shape("x = 1 + 2 or y"), "(= x (or (+ 1 2) y))");
    }

    #[test]
    fn test_parse_if_then_else() {
        assert_eq!(shape("if a then b + 1 else c"), "(if a (+ b 1) c)");
    }

    #[test]
    fn test_parse_if_without_else() {
        assert_eq!(shape("if a then b"), "(if a b)");
    }

    #[test]
    fn test_parse_if_as_subexpression() {
        assert_eq!(shape("1 + if true then 2 else 3"), "(+ 1 (if true 2 3))");
    }

    #[test]
    fn test_parse_while() {
        assert_eq!(shape("while x < 10 do x = x + 1"), "(while (< x 10) (= x (+ x 1)))");
    }

    #[test]
    fn test_parse_function_call() {
        assert_eq!(shape("f(x, y + z)"), "(call f x (+ y z))");
        assert_eq!(shape("read_int()"), "(call read_int)");
    }

    #[test]
    fn test_parse_empty_block() {
        assert_eq!(shape("{ }"), "(block )");
    }

    #[test]
    fn test_parse_block_statements() {
        assert_eq!(shape("{ a; b }"), "(block a b)");
    }

    #[test]
    fn test_parse_block_trailing_semicolon_appends_unit() {
        assert_eq!(shape("{ a; b; }"), "(block a b unit)");
    }

    #[test]
    fn test_parse_adjacent_blocks_need_no_semicolon() {
        assert_eq!(shape("{ { a } { b } }"), "(block (block a) (block b))");
    }

    #[test]
    fn test_parse_block_ending_statement_allows_following_expression() {
        assert_eq!(
            shape("{ if true then { a } b }"),
            "(block (if true (block a)) b)"
        );
    }

    #[test]
    fn test_parse_missing_semicolon_is_an_error() {
        let message = parse_err("{ a b }");
        assert!(message.contains("expected ';'"), "{}", message);
    }

    #[test]
    fn test_parse_top_level_is_an_implicit_block() {
        assert_eq!(shape("a; b; c"), "(block a b c)");
    }

    #[test]
    fn test_parse_top_level_trailing_semicolon_appends_unit() {
        assert_eq!(shape("1 + 2;"), "(block (+ 1 2) unit)");
    }

    #[test]
    fn test_parse_declaration() {
        assert_eq!(shape("var x = 1 + 2"), "(var x (+ 1 2))");
    }

    #[test]
    fn test_parse_declaration_with_annotation() {
        assert_eq!(shape("{ var x: Int = 3; x }"), "(block (var x : Int 3) x)");
    }

    #[test]
    fn test_parse_declaration_only_in_statement_position() {
        let message = parse_err("if true then var x = 1");
        assert!(message.contains("declaration"), "{}", message);
    }

    #[test]
    fn test_parse_declaration_after_block_is_allowed() {
        assert_eq!(shape("{ a } var x = 1"), "(block (block a) (var x 1))");
    }

    #[test]
    fn test_parse_return_with_value() {
        assert_eq!(shape("return x + 1"), "(return (+ x 1))");
    }

    #[test]
    fn test_parse_bare_return() {
        assert_eq!(shape("{ return; }"), "(block (return) unit)");
        assert_eq!(shape("return"), "(return)");
    }

    #[test]
    fn test_parse_break_and_continue() {
        assert_eq!(
            shape("while true do { break; continue }"),
            "(while true (block break continue))"
        );
    }

    #[test]
    fn test_parse_function_definition() {
        let ast = parse_str("fun f(x: Int): Int { return x + 1 } f(41)");
        let Ast::Module(module) = ast else {
            panic!("expected a module root");
        };
        assert_eq!(module.body.len(), 2);
        let ModuleItem::Func(func) = &module.body[0] else {
            panic!("expected a function definition");
        };
        assert_eq!(func.name, "f");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "x");
        assert_eq!(func.params[0].annotation.name, "Int");
        assert_eq!(func.return_annotation.as_ref().unwrap().name, "Int");
        assert_eq!(sexpr(&func.body), "(block (return (+ x 1)))");
        let ModuleItem::Expr(trailing) = &module.body[1] else {
            panic!("expected a trailing expression");
        };
        assert_eq!(sexpr(trailing), "(call f 41)");
    }

    #[test]
    fn test_parse_function_without_params_or_return_type() {
        let ast = parse_str("fun noop() { }");
        let Ast::Module(module) = ast else {
            panic!("expected a module root");
        };
        assert_eq!(module.body.len(), 1);
        let ModuleItem::Func(func) = &module.body[0] else {
            panic!("expected a function definition");
        };
        assert!(func.params.is_empty());
        assert!(func.return_annotation.is_none());
    }

    #[test]
    fn test_parse_function_requires_block_body() {
        let message = parse_err("fun f(): Int return 1");
        assert!(message.contains("function body"), "{}", message);
    }

    #[test]
    fn test_parse_empty_input_is_a_unit_literal() {
        let e = expr("");
        assert_eq!(e.kind, ExprKind::Literal(Literal::Unit));
    }

    #[test]
    fn test_parse_leftover_tokens_are_an_error() {
        let message = parse_err("1 + 2 8");
        assert!(message.contains("expected ';'"), "{}", message);
    }

    #[test]
    fn test_parse_unclosed_parenthesis() {
        let message = parse_err("(1 + 2");
        assert!(message.contains("expected ')'"), "{}", message);
    }

    #[test]
    fn test_parse_stray_else_is_an_error() {
        let message = parse_err("else 3");
        assert!(message.contains("expected an expression"), "{}", message);
    }

    #[test]
    fn test_parse_int_literal_out_of_range() {
        let message = parse_err("99999999999999999999999");
        assert!(message.contains("out of range"), "{}", message);
    }

    #[test]
    fn test_locations_point_at_tokens() {
        let e = expr("1 + 2");
        // The binary node carries the operator's location.
        assert_eq!(e.location, Location::new("no file", 1, 3));
        let ExprKind::BinaryOp { left, .. } = &e.kind else {
            panic!("expected a binary operation");
        };
        assert_eq!(left.location, Location::new("no file", 1, 1));
    }
}
