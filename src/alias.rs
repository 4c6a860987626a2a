//! The alias table and leading-token expansion.

use std::collections::BTreeMap;

use crate::lexer::{self, LexError};

/// User-defined aliases, enumerable in name-sorted order.
///
/// Bindings are created or overwritten by the `alias` builtin, removed
/// by `unalias`, and live for the duration of the session.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Remove a binding. Removing an unknown name is a no-op.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over bindings sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Expand a leading alias in one stage's token sequence.
///
/// If the first token exactly names an alias, its value is re-tokenized
/// and spliced in place of that token, followed by the remaining
/// original tokens unchanged. Expansion is single-level: the spliced
/// tokens are never checked against the table again, so an alias whose
/// value starts with another alias name does not recurse. An alias with
/// an empty value leaves exactly the remaining original tokens.
pub fn expand_leading(tokens: &[String], aliases: &AliasTable) -> Result<Vec<String>, LexError> {
    let Some(value) = tokens.first().and_then(|first| aliases.get(first)) else {
        return Ok(tokens.to_vec());
    };
    let mut expanded = lexer::tokenize(value)?;
    expanded.extend(tokens[1..].iter().cloned());
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expands_leading_token_and_keeps_arguments() {
        let mut aliases = AliasTable::new();
        aliases.set("ll", "ls -la");
        let out = expand_leading(&words(&["ll", "src"]), &aliases).unwrap();
        assert_eq!(out, words(&["ls", "-la", "src"]));
    }

    #[test]
    fn expansion_is_single_level() {
        let mut aliases = AliasTable::new();
        aliases.set("a", "b 1");
        aliases.set("b", "c");
        // `a` becomes `b 1`, and the new leading `b` is not re-expanded.
        let out = expand_leading(&words(&["a", "2"]), &aliases).unwrap();
        assert_eq!(out, words(&["b", "1", "2"]));
    }

    #[test]
    fn empty_value_leaves_remaining_arguments() {
        let mut aliases = AliasTable::new();
        aliases.set("nothing", "");
        let out = expand_leading(&words(&["nothing", "echo", "hi"]), &aliases).unwrap();
        assert_eq!(out, words(&["echo", "hi"]));

        let out = expand_leading(&words(&["nothing"]), &aliases).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn non_leading_tokens_are_not_expanded() {
        let mut aliases = AliasTable::new();
        aliases.set("ll", "ls -la");
        let out = expand_leading(&words(&["echo", "ll"]), &aliases).unwrap();
        assert_eq!(out, words(&["echo", "ll"]));
    }

    #[test]
    fn unknown_name_passes_through() {
        let aliases = AliasTable::new();
        let tokens = words(&["echo", "hi"]);
        assert_eq!(expand_leading(&tokens, &aliases).unwrap(), tokens);
    }

    #[test]
    fn iteration_is_name_sorted() {
        let mut aliases = AliasTable::new();
        aliases.set("zz", "1");
        aliases.set("aa", "2");
        aliases.set("mm", "3");
        let names: Vec<&str> = aliases.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["aa", "mm", "zz"]);
    }

    #[test]
    fn overwrite_and_remove() {
        let mut aliases = AliasTable::new();
        aliases.set("x", "old");
        aliases.set("x", "new");
        assert_eq!(aliases.get("x"), Some("new"));
        aliases.remove("x");
        assert_eq!(aliases.get("x"), None);
        aliases.remove("x"); // absent: not an error
    }
}
