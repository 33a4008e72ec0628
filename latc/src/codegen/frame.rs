//! Stack bookkeeping during function emission.
//!
//! There is no frame pointer: every value a function pushes is tracked
//! here, and local/parameter addresses are computed relative to `rsp`
//! from the current push depth.

use std::collections::HashMap;

use latc_parser::Param;

#[derive(Debug)]
pub(crate) struct Frame {
    /// Pushed slots in order; anonymous pushes carry an empty name
    names: Vec<String>,
    /// Name → stack of indices into `names`, innermost shadow last
    ids: HashMap<String, Vec<usize>>,
    /// Tracked pushes per open block
    blocks: Vec<usize>,
    /// Formal parameters, in declaration order
    params: Vec<Param>,
}

impl Frame {
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            names: Vec::new(),
            ids: HashMap::new(),
            blocks: Vec::new(),
            params,
        }
    }

    /// Total tracked pushes, i.e. the callee's current stack depth in
    /// slots.
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn push_block(&mut self) {
        self.blocks.push(0);
    }

    /// Close the current block; returns how many slots it still holds.
    pub fn pop_block(&mut self) -> usize {
        let count = self.blocks.pop().unwrap_or(0);
        for _ in 0..count {
            self.unwind_one();
        }
        count
    }

    /// Track an anonymous push (intermediate value or call argument).
    pub fn push_anon(&mut self) {
        if let Some(count) = self.blocks.last_mut() {
            *count += 1;
        }
        self.names.push(String::new());
    }

    /// Track a named push (a local coming into scope).
    pub fn push_named(&mut self, name: &str) {
        if let Some(count) = self.blocks.last_mut() {
            *count += 1;
        }
        self.ids
            .entry(name.to_string())
            .or_default()
            .push(self.names.len());
        self.names.push(name.to_string());
    }

    /// Untrack the most recent push.
    pub fn pop_value(&mut self) {
        if let Some(count) = self.blocks.last_mut() {
            *count = count.saturating_sub(1);
        }
        self.unwind_one();
    }

    fn unwind_one(&mut self) {
        let Some(name) = self.names.pop() else {
            return;
        };
        if name.is_empty() {
            return;
        }
        if let Some(stack) = self.ids.get_mut(&name) {
            stack.pop();
            if stack.is_empty() {
                self.ids.remove(&name);
            }
        }
    }

    /// `rsp`-relative byte offset of a local, if `name` is bound.
    pub fn local_offset(&self, name: &str) -> Option<usize> {
        let id = *self.ids.get(name)?.last()?;
        Some((self.names.len() - id - 1) * 8)
    }

    /// `rsp`-relative byte offset of a formal parameter. Parameters sit
    /// above the return address, pushed by the caller in source order.
    pub fn param_offset(&self, name: &str) -> Option<usize> {
        let i = self.params.iter().position(|p| p.name == name)?;
        Some((self.names.len() + self.params.len() - i) * 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latc_parser::Type;

    fn params(names: &[&str]) -> Vec<Param> {
        names
            .iter()
            .map(|n| Param {
                ty: Type::Int,
                name: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_local_offsets_follow_push_order() {
        let mut frame = Frame::new(Vec::new());
        frame.push_block();
        frame.push_named("a");
        frame.push_named("b");
        assert_eq!(frame.local_offset("a"), Some(8));
        assert_eq!(frame.local_offset("b"), Some(0));
        frame.push_anon();
        assert_eq!(frame.local_offset("a"), Some(16));
        frame.pop_value();
        assert_eq!(frame.pop_block(), 2);
        assert_eq!(frame.local_offset("a"), None);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut frame = Frame::new(Vec::new());
        frame.push_block();
        frame.push_named("x");
        frame.push_block();
        frame.push_named("x");
        assert_eq!(frame.local_offset("x"), Some(0));
        frame.pop_block();
        assert_eq!(frame.local_offset("x"), Some(0));
        frame.pop_block();
        assert_eq!(frame.local_offset("x"), None);
    }

    #[test]
    fn test_param_offsets_account_for_depth() {
        let mut frame = Frame::new(params(&["p", "q"]));
        frame.push_block();
        // No locals: first param is two slots above the return address.
        assert_eq!(frame.param_offset("p"), Some(16));
        assert_eq!(frame.param_offset("q"), Some(8));
        frame.push_named("a");
        assert_eq!(frame.param_offset("p"), Some(24));
        assert_eq!(frame.param_offset("missing"), None);
    }
}
