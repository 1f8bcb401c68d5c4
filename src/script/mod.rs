//! JoScript: the tiny line-oriented language characters are scripted in.
//!
//! A script runs against a [`Scope`], which is at minimum a [`DataObject`]
//! and may add host methods (movement, input pseudo-variables) on top of the
//! built-in verbs `declare`, `get`, `set`, `increment`, `mod_increment` and
//! `void`.

pub mod data;
pub mod parser;

use thiserror::Error;

pub use data::{DataError, DataObject, Value};
pub use parser::{Call, Condition, ParseErrorKind, Statement, Test};

// ── ScriptError ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("error on line {line}: {source}")]
    Runtime { line: usize, source: DataError },
}

impl ScriptError {
    /// 1-based line the error was raised on.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Parse { line, .. } | ScriptError::Runtime { line, .. } => *line,
        }
    }
}

// ── Scope ────────────────────────────────────────────────────────────────────

/// Everything a running script can see.
pub trait Scope {
    /// Read a variable or read-only pseudo-variable.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// The backing store the built-in verbs mutate.
    fn data_mut(&mut self) -> &mut DataObject;

    /// Host methods layered over the built-ins. Return `None` when `name` is
    /// not one of them so dispatch falls through to the built-in verbs.
    fn call_host(&mut self, _name: &str, _args: &[String]) -> Option<Result<Option<Value>, DataError>> {
        None
    }
}

/// Value resolution: a number literal, `-name` (negated variable), or the
/// current value of a declared name.
pub fn resolve<S: Scope + ?Sized>(scope: &S, token: &str) -> Result<Value, DataError> {
    if let Ok(n) = token.parse::<Value>() {
        return Ok(n);
    }
    if let Some(v) = token.strip_prefix('-').and_then(|name| scope.lookup(name)) {
        return Ok(v.wrapping_neg());
    }
    scope
        .lookup(token)
        .ok_or_else(|| DataError::Unresolvable(token.to_string()))
}

fn arity(name: &str, args: &[String], min: usize, max: usize, expected: &'static str) -> Result<(), DataError> {
    if args.len() < min || args.len() > max {
        return Err(DataError::Arity { name: name.to_string(), expected, actual: args.len() });
    }
    Ok(())
}

fn resolve_optional<S: Scope + ?Sized>(scope: &S, args: &[String], index: usize) -> Result<Option<Value>, DataError> {
    args.get(index).map(|t| resolve(scope, t)).transpose()
}

/// Dispatch `name(args…)` against `scope`: host methods first, then the
/// data-object verbs.  Value arguments are resolved through the whole scope
/// before the store is touched.
pub fn invoke<S: Scope + ?Sized>(scope: &mut S, name: &str, args: &[String]) -> Result<Option<Value>, DataError> {
    if let Some(result) = scope.call_host(name, args) {
        return result;
    }
    match name {
        "declare" => {
            arity(name, args, 1, 1, "1")?;
            scope.data_mut().declare(&args[0])?;
            Ok(None)
        }
        "get" => {
            arity(name, args, 1, 1, "1")?;
            resolve(&*scope, &args[0]).map(Some)
        }
        "set" => {
            arity(name, args, 2, 2, "2")?;
            let value = resolve(&*scope, &args[1])?;
            scope.data_mut().set(&args[0], value)?;
            Ok(None)
        }
        "increment" => {
            arity(name, args, 1, 2, "1 or 2")?;
            let by = resolve_optional(&*scope, args, 1)?;
            scope.data_mut().increment(&args[0], by)
        }
        "mod_increment" => {
            arity(name, args, 2, 3, "2 or 3")?;
            let modulus = resolve(&*scope, &args[1])?;
            let by = resolve_optional(&*scope, args, 2)?;
            scope.data_mut().mod_increment(&args[0], modulus, by).map(Some)
        }
        "void" => {
            arity(name, args, 1, 1, "1")?;
            scope.data_mut().void(&args[0])?;
            Ok(None)
        }
        _ => Err(DataError::UnknownCall(name.to_string())),
    }
}

// ── Execution ────────────────────────────────────────────────────────────────

impl Condition {
    pub fn holds<S: Scope + ?Sized>(&self, scope: &S) -> Result<bool, DataError> {
        let v = |t: &str| resolve(scope, t);
        let result = match &self.test {
            Test::Truthy(a) => v(a)? != 0,
            Test::Less(a, b) => v(a)? < v(b)?,
            Test::Greater(a, b) => v(a)? > v(b)?,
            Test::Equal(a, b) => v(a)? == v(b)?,
        };
        Ok(result != self.negated)
    }
}

/// Evaluation stops at the first false condition.
fn guard_holds<S: Scope + ?Sized>(guard: &[Condition], scope: &S) -> Result<bool, DataError> {
    for cond in guard {
        if !cond.holds(scope)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn run_statements<S: Scope + ?Sized>(statements: &[Statement], scope: &mut S) -> Result<(), ScriptError> {
    for statement in statements {
        match statement {
            Statement::Call { line, guard, call } => {
                let at = |source| ScriptError::Runtime { line: *line, source };
                if guard_holds(guard, scope).map_err(at)? {
                    invoke(scope, &call.name, &call.args).map_err(at)?;
                }
            }
            Statement::Block { line, guard, then, otherwise } => {
                let taken = guard_holds(guard, scope)
                    .map_err(|source| ScriptError::Runtime { line: *line, source })?;
                run_statements(if taken { then } else { otherwise }, scope)?;
            }
        }
    }
    Ok(())
}

// ── Script ───────────────────────────────────────────────────────────────────

/// Script text together with its parsed statement list.
///
/// Parsing happens once at construction; running a `Script` is equivalent to
/// calling [`execute`] on its source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    source: String,
    statements: Vec<Statement>,
}

impl Script {
    pub fn parse(source: impl Into<String>) -> Result<Self, ScriptError> {
        let source = source.into();
        let statements =
            parser::parse(&source).map_err(|(line, kind)| ScriptError::Parse { line, kind })?;
        Ok(Self { source, statements })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Run every statement against `scope`.  The first error aborts the run;
    /// mutations made before it are kept.
    pub fn run<S: Scope + ?Sized>(&self, scope: &mut S) -> Result<(), ScriptError> {
        run_statements(&self.statements, scope)
    }
}

/// Parse and run `source` against `scope` in one go.
pub fn execute<S: Scope + ?Sized>(source: &str, scope: &mut S) -> Result<(), ScriptError> {
    Script::parse(source)?.run(scope)
}
