// =============================================================================
// PARSER.RS — JoScript tokenizer and block parser
//
// Scripts are line oriented. Each physical line holds one or more statements:
//
//   (hp<max)(alive) increment(hp)       guarded call
//   -(moving)?                          open a block (guard true => if-branch)
//   :                                   else separator
//   ;                                   close the innermost block
//   >> anything                         comment
//
// A `;` written directly after a call's `)` only terminates that call, so
// `(a)? (b)? c(); : d(); ;` is a valid one-line script.
// =============================================================================

use thiserror::Error;

// ── AST ──────────────────────────────────────────────────────────────────────

/// A single comparison inside `( … )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// `(a)`: true when `a` resolves to a non-zero value.
    Truthy(String),
    Less(String, String),
    Greater(String, String),
    Equal(String, String),
}

/// One guard term, optionally negated with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub negated: bool,
    pub test: Test,
}

/// `name(arg, arg, …)`. Arguments are kept as raw tokens; the callee decides
/// which are variable names and which are value expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Call {
        line: usize,
        guard: Vec<Condition>,
        call: Call,
    },
    Block {
        line: usize,
        guard: Vec<Condition>,
        then: Vec<Statement>,
        otherwise: Vec<Statement>,
    },
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unrecognised statement '{0}'")]
    Malformed(String),
    #[error("condition is missing its closing ')'")]
    UnclosedCondition,
    #[error("empty operand in condition")]
    EmptyOperand,
    #[error("call argument list is missing its closing ')'")]
    UnclosedArguments,
    #[error("illegal argument '{0}'")]
    IllegalArgument(String),
    #[error("';' outside of any block")]
    StrayClose,
    #[error("':' outside of any block")]
    StrayElse,
    #[error("improper second else")]
    SecondElse,
}

// ── Tokenizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Open(Vec<Condition>),
    Else,
    Close,
    Call(Vec<Condition>, Call),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    line: usize,
    kind: TokenKind,
}

type ParseResult<T> = Result<T, (usize, ParseErrorKind)>;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn check_operand(raw: &str) -> Result<String, ParseErrorKind> {
    let op = raw.trim();
    if op.is_empty() {
        return Err(ParseErrorKind::EmptyOperand);
    }
    if !op.chars().all(is_token_char) {
        return Err(ParseErrorKind::Malformed(op.to_string()));
    }
    Ok(op.to_string())
}

fn parse_test(inner: &str) -> Result<Test, ParseErrorKind> {
    if let Some((a, b)) = inner.split_once('<') {
        return Ok(Test::Less(check_operand(a)?, check_operand(b)?));
    }
    if let Some((a, b)) = inner.split_once('>') {
        return Ok(Test::Greater(check_operand(a)?, check_operand(b)?));
    }
    if let Some((a, b)) = inner.split_once('=') {
        return Ok(Test::Equal(check_operand(a)?, check_operand(b)?));
    }
    Ok(Test::Truthy(check_operand(inner)?))
}

/// Cursor over the remainder of one physical line.
struct LineCursor<'a> {
    line: usize,
    rest: &'a str,
}

impl<'a> LineCursor<'a> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(r) => {
                self.rest = r;
                true
            }
            None => false,
        }
    }

    fn error(&self, kind: ParseErrorKind) -> (usize, ParseErrorKind) {
        (self.line, kind)
    }

    fn guard(&mut self) -> ParseResult<Vec<Condition>> {
        let mut guard = Vec::new();
        loop {
            self.skip_ws();
            let negated = self.rest.starts_with("-(");
            if !(negated || self.rest.starts_with('(')) {
                return Ok(guard);
            }
            self.eat("-");
            self.eat("(");
            let Some(end) = self.rest.find(')') else {
                return Err(self.error(ParseErrorKind::UnclosedCondition));
            };
            let test = parse_test(&self.rest[..end]).map_err(|k| self.error(k))?;
            self.rest = &self.rest[end + 1..];
            guard.push(Condition { negated, test });
        }
    }

    fn call(&mut self) -> ParseResult<Call> {
        let name_len = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        let name = &self.rest[..name_len];
        let starts_ok = name.chars().next().is_some_and(|c| !c.is_ascii_digit());
        if !starts_ok || !self.rest[name_len..].starts_with('(') {
            let snippet = self.rest.split_whitespace().next().unwrap_or(self.rest);
            return Err(self.error(ParseErrorKind::Malformed(snippet.to_string())));
        }
        let name = name.to_string();
        self.rest = &self.rest[name_len + 1..];

        let Some(end) = self.rest.find(')') else {
            return Err(self.error(ParseErrorKind::UnclosedArguments));
        };
        let inner = self.rest[..end].trim();
        self.rest = &self.rest[end + 1..];

        let mut args = Vec::new();
        if !inner.is_empty() {
            for raw in inner.split(',') {
                let arg = raw.trim();
                if arg.is_empty() || !arg.chars().all(is_token_char) {
                    return Err(self.error(ParseErrorKind::IllegalArgument(arg.to_string())));
                }
                args.push(arg.to_string());
            }
        }
        // Optional terminator glued to the call.
        self.eat(";");
        Ok(Call { name, args })
    }
}

fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for (idx, text) in source.lines().enumerate() {
        let mut cur = LineCursor { line: idx + 1, rest: text };
        loop {
            cur.skip_ws();
            if cur.rest.is_empty() || cur.rest.starts_with(">>") {
                break;
            }
            let kind = if cur.eat(";") {
                TokenKind::Close
            } else if cur.eat(":") {
                TokenKind::Else
            } else {
                let guard = cur.guard()?;
                cur.skip_ws();
                if cur.eat("?") {
                    TokenKind::Open(guard)
                } else {
                    let call = cur.call()?;
                    TokenKind::Call(guard, call)
                }
            };
            tokens.push(Token { line: cur.line, kind });
        }
    }
    Ok(tokens)
}

// ── Block parser ─────────────────────────────────────────────────────────────

/// How a block body ended.
enum End {
    Eof,
    Else(usize),
    Close,
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    /// Parse statements until the body at `depth` ends.  `depth == 0` is the
    /// top level, where `:` and `;` have nothing to attach to.
    fn body(&mut self, depth: usize) -> ParseResult<(Vec<Statement>, End)> {
        let mut out = Vec::new();
        while let Some(Token { line, kind }) = self.tokens.next() {
            match kind {
                TokenKind::Call(guard, call) => out.push(Statement::Call { line, guard, call }),
                TokenKind::Open(guard) => {
                    let (then, end) = self.body(depth + 1)?;
                    let otherwise = match end {
                        End::Else(_) => match self.body(depth + 1)? {
                            (_, End::Else(second)) => {
                                return Err((second, ParseErrorKind::SecondElse));
                            }
                            (otherwise, _) => otherwise,
                        },
                        _ => Vec::new(),
                    };
                    out.push(Statement::Block { line, guard, then, otherwise });
                }
                TokenKind::Else if depth == 0 => return Err((line, ParseErrorKind::StrayElse)),
                TokenKind::Else => return Ok((out, End::Else(line))),
                TokenKind::Close if depth == 0 => return Err((line, ParseErrorKind::StrayClose)),
                TokenKind::Close => return Ok((out, End::Close)),
            }
        }
        // Blocks still open at the end of the script close implicitly.
        Ok((out, End::Eof))
    }
}

/// Parse `source` into an executable statement list.
///
/// Errors carry the 1-based line number of the offending statement.
pub fn parse(source: &str) -> Result<Vec<Statement>, (usize, ParseErrorKind)> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: tokens.into_iter() };
    let (statements, _) = parser.body(0)?;
    Ok(statements)
}
