//! Named operations and variable storage used during evaluation

use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

/// A named operation callable from expressions.
///
/// Receives the evaluation context and the already evaluated arguments.
/// Errors are plain messages; the evaluator wraps them with the operation name.
pub type Operation<C> = Box<dyn Fn(&mut C, &[Value]) -> Result<Value, String>>;

/// Anything expressions can be evaluated against
pub trait Context {
    fn scope(&mut self) -> &mut Scope;
}

/// Variable bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind `name`, returning the previous value if there was one
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

impl Context for Scope {
    fn scope(&mut self) -> &mut Scope {
        self
    }
}

/// Name -> operation table
pub struct Registry<C> {
    operations: HashMap<String, Operation<C>>,
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Register `operation` under `name`, replacing any earlier one
    pub fn register<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: Fn(&mut C, &[Value]) -> Result<Value, String> + 'static,
    {
        self.operations.insert(name.into(), Box::new(operation));
    }

    pub fn get(&self, name: &str) -> Option<&Operation<C>> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operations", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_set_get_remove() {
        let mut scope = Scope::new();
        assert!(scope.set("x", Value::Int(1)).is_none());
        assert_eq!(scope.set("x", Value::Int(2)), Some(Value::Int(1)));
        assert_eq!(scope.get("x"), Some(&Value::Int(2)));
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.remove("x"), Some(Value::Int(2)));
        assert!(scope.is_empty());
    }

    #[test]
    fn test_registry_register_and_call() {
        let mut registry: Registry<Scope> = Registry::new();
        registry.register("answer", |_, _| Ok(Value::Int(42)));
        registry.register("store", |scope: &mut Scope, args: &[Value]| {
            scope.set("stored", args.first().cloned().unwrap_or_default());
            Ok(Value::Null)
        });

        assert!(registry.contains("answer"));
        assert_eq!(registry.names(), vec!["answer", "store"]);

        let mut scope = Scope::new();
        let answer = registry.get("answer").unwrap();
        assert_eq!(answer(&mut scope, &[]), Ok(Value::Int(42)));

        let store = registry.get("store").unwrap();
        store(&mut scope, &[Value::from("x")]).unwrap();
        assert_eq!(scope.get("stored"), Some(&Value::from("x")));
    }

    #[test]
    fn test_registry_replace() {
        let mut registry: Registry<Scope> = Registry::default();
        registry.register("f", |_, _| Ok(Value::Int(1)));
        registry.register("f", |_, _| Ok(Value::Int(2)));
        assert_eq!(registry.len(), 1);
        let f = registry.get("f").unwrap();
        assert_eq!(f(&mut Scope::new(), &[]), Ok(Value::Int(2)));
    }
}
