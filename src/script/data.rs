use indexmap::IndexMap;
use thiserror::Error;

/// Every script variable holds a signed integer.
pub type Value = i64;

// ── DataError ────────────────────────────────────────────────────────────────

/// Failures raised by data-object verbs and value resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("variable '{0}' was never declared")]
    Undeclared(String),
    #[error("variable '{0}' is already declared")]
    AlreadyDeclared(String),
    #[error("'{0}' is not a legal variable name")]
    IllegalName(String),
    #[error("cannot resolve '{0}' to a value")]
    Unresolvable(String),
    #[error("no method named '{0}'")]
    UnknownCall(String),
    #[error("'{name}' takes {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: &'static str,
        actual: usize,
    },
    #[error("'{0}' was reduced modulo zero")]
    ZeroModulus(String),
    /// A failure reported by a host-provided method (e.g. a movement query).
    #[error("{0}")]
    Host(String),
}

/// Returns true if `name` may be declared as a variable.
///
/// Names must be non-empty, must not contain `-` (reserved for negation in
/// value tokens) and must not themselves read as a number literal.
pub fn is_legal_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('-')
        && name.parse::<Value>().is_err()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── DataObject ───────────────────────────────────────────────────────────────

/// An ordered, declare-before-use store of integer variables.
///
/// This is the only mutable state a script can reach. Declaration order is
/// preserved so inspectors and debug dumps list variables the way they were
/// introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataObject {
    vars: IndexMap<String, Value>,
}

impl DataObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with an initial value of zero.
    pub fn declare(&mut self, name: &str) -> Result<(), DataError> {
        self.declare_with(name, 0)
    }

    /// Declare `name` with an explicit initial value.
    pub fn declare_with(&mut self, name: &str, value: Value) -> Result<(), DataError> {
        if !is_legal_name(name) {
            return Err(DataError::IllegalName(name.to_string()));
        }
        if self.vars.contains_key(name) {
            return Err(DataError::AlreadyDeclared(name.to_string()));
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Raw lookup of a declared variable.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.vars.get(name).copied()
    }

    /// Resolve a value token: a number literal, `-name`, or a declared name.
    pub fn get(&self, token: &str) -> Result<Value, DataError> {
        crate::script::resolve(self, token)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), DataError> {
        *self.slot(name)? = value;
        Ok(())
    }

    /// Without `by`, post-increments by one and returns the old value.
    /// With `by`, adds it and returns nothing.
    pub fn increment(&mut self, name: &str, by: Option<Value>) -> Result<Option<Value>, DataError> {
        let slot = self.slot(name)?;
        match by {
            None => {
                let old = *slot;
                *slot = old.wrapping_add(1);
                Ok(Some(old))
            }
            Some(by) => {
                *slot = slot.wrapping_add(by);
                Ok(None)
            }
        }
    }

    /// Increment as [`DataObject::increment`], then reduce modulo `modulus`.
    /// Returns the reduced value. The remainder takes the sign of the
    /// dividend, like the native `%` operator.
    pub fn mod_increment(
        &mut self,
        name: &str,
        modulus: Value,
        by: Option<Value>,
    ) -> Result<Value, DataError> {
        if modulus == 0 {
            return Err(DataError::ZeroModulus(name.to_string()));
        }
        self.increment(name, by)?;
        let slot = self.slot(name)?;
        *slot %= modulus;
        Ok(*slot)
    }

    /// Reset `name` to zero.
    pub fn void(&mut self, name: &str) -> Result<(), DataError> {
        self.set(name, 0)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn slot(&mut self, name: &str) -> Result<&mut Value, DataError> {
        self.vars
            .get_mut(name)
            .ok_or_else(|| DataError::Undeclared(name.to_string()))
    }
}

impl crate::script::Scope for DataObject {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.value(name)
    }

    fn data_mut(&mut self) -> &mut DataObject {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_names() {
        assert!(is_legal_name("hp"));
        assert!(is_legal_name("key_up"));
        assert!(is_legal_name("x2"));
        assert!(!is_legal_name(""));
        assert!(!is_legal_name("a-b"));
        assert!(!is_legal_name("42"));
        assert!(!is_legal_name("a b"));
    }

    #[test]
    fn iteration_keeps_declaration_order() {
        let mut data = DataObject::new();
        data.declare("zeta").unwrap();
        data.declare("alpha").unwrap();
        let names: Vec<_> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }
}
