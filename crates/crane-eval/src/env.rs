//! Lexically scoped variable environments.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

struct Scope {
    bindings: BTreeMap<String, Value>,
    enclosing: Option<Environment>,
}

/// A shared handle to one scope and, through `enclosing`, every scope
/// around it.
///
/// Lookups walk outward until a binding is found. `define` always writes
/// to this scope, so a function's locals shadow the globals it can read.
/// Functions keep a clone of the handle they were defined in.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// A root scope with nothing around it.
    pub fn new() -> Self {
        Self::with_enclosing(None)
    }

    /// A fresh scope nested inside this one.
    pub fn enclosed(&self) -> Self {
        Self::with_enclosing(Some(self.clone()))
    }

    fn with_enclosing(enclosing: Option<Environment>) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            bindings: BTreeMap::new(),
            enclosing,
        })))
    }

    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().bindings.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.enclosing.as_ref().and_then(|env| env.get(name)),
        }
    }

    /// Names bound directly in this scope, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().bindings.keys().cloned().collect()
    }

    /// Drop every binding in this scope. Functions hold their defining
    /// scope, which holds them; clearing breaks that cycle.
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut self.0.borrow_mut().bindings);
        drop(bindings);
    }

    /// Clear this scope if nothing outside it can still reach it: the only
    /// other handles are held by functions defined here that are bound
    /// nowhere else. Returns whether the scope was cleared.
    pub fn release_if_unreachable(&self) -> bool {
        let mut own_functions = 0;
        for value in self.0.borrow().bindings.values() {
            if let Value::Function(function) = value {
                if function.closure.ptr_eq(self) {
                    if Rc::strong_count(function) > 1 {
                        return false;
                    }
                    own_functions += 1;
                }
            }
        }
        if own_functions == 0 || Rc::strong_count(&self.0) != own_functions + 1 {
            return false;
        }
        self.clear();
        true
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.names())
            .field("enclosed", &self.0.borrow().enclosing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Function;
    use crane_types::ast::{Block, FunctionDecl, Ident};
    use crane_types::Span;

    #[test]
    fn test_lookup_walks_outward() {
        let global = Environment::new();
        global.define("x", Value::Number(1.0));
        let local = global.enclosed();
        assert_eq!(local.get("x").and_then(|v| v.as_number()), Some(1.0));
        assert!(local.get("y").is_none());
    }

    #[test]
    fn test_define_shadows() {
        let global = Environment::new();
        global.define("x", Value::Number(1.0));
        let local = global.enclosed();
        local.define("x", Value::Number(2.0));
        assert_eq!(local.get("x").and_then(|v| v.as_number()), Some(2.0));
        assert_eq!(global.get("x").and_then(|v| v.as_number()), Some(1.0));
    }

    #[test]
    fn test_shared_handles_see_updates() {
        let global = Environment::new();
        let alias = global.clone();
        global.define("n", Value::Number(5.0));
        assert!(alias.get("n").is_some());
        alias.clear();
        assert!(global.get("n").is_none());
    }

    fn function_in(env: &Environment) -> Value {
        let decl = FunctionDecl {
            name: Ident::new("inner", Span::default()),
            params: Vec::new(),
            body: Block {
                stmts: Vec::new(),
                span: Span::default(),
            },
            span: Span::default(),
        };
        Value::Function(Rc::new(Function {
            decl: Rc::new(decl),
            closure: env.clone(),
        }))
    }

    #[test]
    fn test_release_breaks_local_function_cycle() {
        let local = Environment::new().enclosed();
        local.define("inner", function_in(&local));
        let weak = Rc::downgrade(&local.0);
        assert!(local.release_if_unreachable());
        drop(local);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_release_keeps_escaped_function() {
        let local = Environment::new().enclosed();
        let inner = function_in(&local);
        local.define("inner", inner.clone());
        assert!(!local.release_if_unreachable());
        assert!(local.get("inner").is_some());

        let local = Environment::new().enclosed();
        local.define("inner", function_in(&local));
        let nested = local.enclosed();
        assert!(!local.release_if_unreachable(), "a nested scope still reaches it");
        drop(nested);
        assert!(local.release_if_unreachable());
        drop(inner);
    }
}
