// Flat variable table scraped from a ninja graph
// Handles ${name} expansion without evaluating ninja scoping rules

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Upper bound on expansion passes for a single line
const MAX_EXPANSION_PASSES: usize = 16;

/// One `name = value` assignment as it appeared in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: String,
    pub value: String,
}

/// Ordered list of bindings with first-match lookup
///
/// Duplicate names are kept in insertion order, but only the first binding
/// for a name is ever returned.
#[derive(Debug, Clone)]
pub struct VariableTable {
    bindings: Vec<VariableBinding>,
    /// Index of the first binding per name
    first: HashMap<String, usize>,
    reference: Regex,
}

impl VariableTable {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            first: HashMap::new(),
            reference: Regex::new(r"\$\{([\w+.-]+)\}").unwrap(),
        }
    }

    /// Append a binding; an existing name keeps its first value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let index = self.bindings.len();
        self.first.entry(name.clone()).or_insert(index);
        self.bindings.push(VariableBinding {
            name,
            value: value.into(),
        });
    }

    /// First stored value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.first
            .get(name)
            .map(|&index| self.bindings[index].value.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Expand every `${name}` reference in `line`
    ///
    /// Unknown names expand to the empty string. Passes repeat while
    /// references remain, stopping early once a pass leaves the line
    /// unchanged, and never running more than [`MAX_EXPANSION_PASSES`].
    pub fn expand(&self, line: &str) -> String {
        let mut result = line.to_string();

        for _ in 0..MAX_EXPANSION_PASSES {
            if !self.reference.is_match(&result) {
                return result;
            }

            let expanded = self.expand_once(&result);
            if expanded == result {
                // A self-referencing value reproduces itself
                return result;
            }
            result = expanded;
        }

        if self.reference.is_match(&result) {
            warn!(
                "Variable expansion stopped after {} passes: {}",
                MAX_EXPANSION_PASSES, line
            );
        }
        result
    }

    fn expand_once(&self, line: &str) -> String {
        self.reference
            .replace_all(line, |caps: &regex::Captures| {
                let name = &caps[1];
                match self.get(name) {
                    Some(value) => value.to_string(),
                    None => {
                        debug!("ignore VAR_REF {}", &caps[0]);
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_simple_expansion() {
        let mut table = VariableTable::new();
        table.insert("FOO", "hello");
        table.insert("BAR", "${FOO} world");

        assert_eq!(table.expand("${FOO}"), "hello");
        assert_eq!(table.expand("say ${BAR}!"), "say hello world!");
    }

    #[test]
    fn test_nested_expansion() {
        let mut table = VariableTable::new();
        table.insert("g.cc.a", "value_a");
        table.insert("g.cc.b", "${g.cc.a}");
        table.insert("g.cc.c", "${g.cc.b}_suffix");

        assert_eq!(table.expand("${g.cc.c}"), "value_a_suffix");
    }

    #[test]
    fn test_first_binding_wins() {
        let mut table = VariableTable::new();
        table.insert("cFlags", "-O2");
        table.insert("cFlags", "-O0");

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("cFlags"), Some("-O2"));
        assert_eq!(table.expand("${cFlags}"), "-O2");
    }

    #[test]
    fn test_line_without_references_is_unchanged() {
        let mut table = VariableTable::new();
        table.insert("FOO", "bar");

        let line = "    ccCmd = prebuilts/clang/bin/clang $ -c";
        assert_eq!(table.expand(line), line);
        assert_eq!(table.expand(&table.expand(line)), line);
    }

    #[traced_test]
    #[test]
    fn test_unresolved_reference_is_dropped() {
        let table = VariableTable::new();

        assert_eq!(table.expand("a ${missing} b"), "a  b");
        assert!(logs_contain("ignore VAR_REF ${missing}"));
    }

    #[test]
    fn test_deep_chain_terminates() {
        let mut table = VariableTable::new();
        for depth in 0..10 {
            table.insert(format!("v{depth}"), format!("${{v{}}}", depth + 1));
        }
        table.insert("v10", "end");

        assert_eq!(table.expand("${v0}"), "end");
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut table = VariableTable::new();
        table.insert("loop", "${loop}");
        table.insert("grow", "x${grow}");

        assert_eq!(table.expand("${loop}"), "${loop}");

        let grown = table.expand("${grow}");
        assert!(grown.starts_with("xxxx"));
        assert!(grown.ends_with("${grow}"));
    }
}
