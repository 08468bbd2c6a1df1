//! Tokenizer for Vela source text.
//!
//! Greedy, position-by-position scanning: skip patterns (whitespace, `//` and
//! `#` line comments, non-nesting `/* ... */` block comments) run first, then
//! one token is matched. Word-shaped tokens are scanned maximally and then
//! classified, which gives keywords their word-boundary behavior (`iffy` is an
//! identifier, not `if` followed by `fy`).

use crate::error::CompileError;

/// A position in a source file. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }

    /// Placeholder location for synthesized nodes (the empty-input
    /// expression, the synthesized `main` of a function-only module).
    pub fn none() -> Self {
        Location::new("no file", 1, 1)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntLiteral,
    BoolLiteral,
    Operator,
    Punctuation,
    /// `if`, `then`, `else`
    Conditional,
    /// `while`, `do`
    WhileLoop,
    /// `break`, `continue`
    BreakContinue,
    /// `var`
    Declaration,
    /// `fun`
    Function,
    /// `return`
    Return,
    /// Synthetic token minted by the parser when input runs out.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: Location) -> Self {
        Token {
            kind,
            text: text.into(),
            location,
        }
    }
}

fn classify_word(text: &str) -> TokenKind {
    match text {
        "while" | "do" => TokenKind::WhileLoop,
        "if" | "then" | "else" => TokenKind::Conditional,
        "var" => TokenKind::Declaration,
        "fun" => TokenKind::Function,
        "return" => TokenKind::Return,
        "break" | "continue" => TokenKind::BreakContinue,
        "true" | "false" => TokenKind::BoolLiteral,
        "and" | "or" | "not" => TokenKind::Operator,
        _ => TokenKind::Identifier,
    }
}

/// Length of the block comment starting at `start` (which must point at
/// `/*`), including the closing `*/`. None when the comment never closes; the
/// opener is then not a comment at all and `/` lexes as an operator.
fn block_comment_len(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return Some(i + 2 - start);
        }
        i += 1;
    }
    None
}

/// Split `source_code` into tokens, tracking line and column positions.
/// Fails with a syntax error on the first character no pattern matches.
pub fn tokenize(source_code: &str, file_name: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = source_code.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut column = 1;

    while pos < chars.len() {
        let c = chars[pos];

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            pos += 1;
            continue;
        }

        // Line comments: `// ...` and `# ...`
        if c == '#' || (c == '/' && chars.get(pos + 1) == Some(&'/')) {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
                column += 1;
            }
            continue;
        }

        // Block comments: `/* ... */`, non-nesting
        if c == '/' && chars.get(pos + 1) == Some(&'*') {
            if let Some(len) = block_comment_len(&chars, pos) {
                for _ in 0..len {
                    if chars[pos] == '\n' {
                        line += 1;
                        column = 1;
                    } else {
                        column += 1;
                    }
                    pos += 1;
                }
                continue;
            }
        }

        let location = Location::new(file_name, line, column);

        // Keywords, bool literals, word operators, identifiers
        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            column += pos - start;
            tokens.push(Token::new(classify_word(&text), text, location));
            continue;
        }

        // Integer literals
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            column += pos - start;
            tokens.push(Token::new(TokenKind::IntLiteral, text, location));
            continue;
        }

        // Two-character operators
        if let Some(&next) = chars.get(pos + 1) {
            let pair: String = [c, next].iter().collect();
            if matches!(pair.as_str(), "==" | "!=" | "<=" | ">=") {
                pos += 2;
                column += 2;
                tokens.push(Token::new(TokenKind::Operator, pair, location));
                continue;
            }
        }

        // Single-character operators
        if "+-*/%=<>".contains(c) {
            pos += 1;
            column += 1;
            tokens.push(Token::new(TokenKind::Operator, c.to_string(), location));
            continue;
        }

        // Punctuation
        if "(){},;:".contains(c) {
            pos += 1;
            column += 1;
            tokens.push(Token::new(TokenKind::Punctuation, c.to_string(), location));
            continue;
        }

        return Err(CompileError::syntax(
            location,
            format!("Unrecognized character: {}", c),
        ));
    }

    Ok(tokens)
}
