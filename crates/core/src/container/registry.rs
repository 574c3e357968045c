use crate::container::descriptor::Binding;
use crate::container::tokens::Token;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Binding table of a single container
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: HashMap<Token, Arc<Binding>>,
}

impl BindingRegistry {
    /// Create a new binding registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of bindings into the table
    ///
    /// The batch is walked back to front and only the first occurrence of each
    /// token is kept, so the last entry for a token wins. Entries already in the
    /// table are overridden. Returns the tokens whose previous binding was
    /// replaced.
    pub fn merge(&mut self, bindings: Vec<Binding>) -> Vec<Token> {
        let mut seen = HashSet::new();
        let mut replaced = Vec::new();

        for binding in bindings.into_iter().rev() {
            if !seen.insert(binding.token.clone()) {
                continue;
            }
            let token = binding.token.clone();
            if self.bindings.insert(token.clone(), Arc::new(binding)).is_some() {
                replaced.push(token);
            }
        }

        replaced
    }

    /// Insert a binding unless the token is already bound
    pub fn insert_if_absent(&mut self, binding: Binding) -> bool {
        if self.bindings.contains_key(&binding.token) {
            return false;
        }
        self.bindings.insert(binding.token.clone(), Arc::new(binding));
        true
    }

    pub fn get(&self, token: &Token) -> Option<Arc<Binding>> {
        self.bindings.get(token).cloned()
    }

    /// Check if a token is bound
    pub fn contains(&self, token: &Token) -> bool {
        self.bindings.contains_key(token)
    }

    /// Get the number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Get all bound tokens
    pub fn tokens(&self) -> Vec<Token> {
        self.bindings.keys().cloned().collect()
    }
}
