//! Lexical scope stack for the type checker.
//!
//! Shadowing is a per-name stack of types; each block frame remembers
//! the names it declared so they can be popped (and checked for
//! same-block redeclaration) without scanning.

use std::collections::{HashMap, HashSet};

use latc_parser::Type;

#[derive(Debug, Default)]
pub struct ScopeStack {
    vars: HashMap<String, Vec<Type>>,
    frames: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashSet::new());
    }

    pub fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        for name in frame {
            if let Some(stack) = self.vars.get_mut(&name) {
                stack.pop();
                if stack.is_empty() {
                    self.vars.remove(&name);
                }
            }
        }
    }

    /// Was `name` already declared in the innermost frame?
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.frames
            .last()
            .map(|f| f.contains(name))
            .unwrap_or(false)
    }

    /// Bind `name` in the innermost frame, shadowing outer bindings.
    pub fn declare(&mut self, name: &str, ty: Type) {
        self.vars.entry(name.to_string()).or_default().push(ty);
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string());
        }
    }

    /// Innermost binding of `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.vars.get(name).and_then(|stack| stack.last())
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_pop() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        scopes.declare("x", Type::Int);
        scopes.push_frame();
        scopes.declare("x", Type::Str);
        assert_eq!(scopes.lookup("x"), Some(&Type::Str));
        scopes.pop_frame();
        assert_eq!(scopes.lookup("x"), Some(&Type::Int));
        scopes.pop_frame();
        assert_eq!(scopes.lookup("x"), None);
    }

    #[test]
    fn test_same_block_redeclaration() {
        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        scopes.declare("x", Type::Int);
        assert!(scopes.declared_in_current("x"));
        scopes.push_frame();
        assert!(!scopes.declared_in_current("x"));
        assert_eq!(scopes.lookup("x"), Some(&Type::Int));
    }
}
