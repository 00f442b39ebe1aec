//! # Environment accessor
//!
//! The process environment cannot be changed on behalf of the parent shell, and
//! this crate never writes to its own (`std::env::set_var` is `unsafe` in the
//! 2024 edition). Instead, every invocation works on an `Environment`: a
//! snapshot taken at start that acts as the in-process mirror.
//!
//! Two consumers see each mutation:
//! - the mirror (this type), so later statements and nested modules observe it;
//! - the shell backend, which stages a command for the real shell to apply.
//!
//! Unsets are deferred: `schedule_unset` keeps the value readable until the
//! backend flushes and calls `apply_deferred_unsets`.

use crate::constants::PATH_LIST_SEPARATOR;
use std::collections::HashMap;

/// In-process mirror of the environment for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
    pending_unsets: Vec<String>,
}

impl Environment {
    /// Snapshots the current process environment. Non-UTF-8 entries are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(vars)
    }

    /// Builds an environment from explicit pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            pending_unsets: Vec::new(),
        }
    }

    /// The current value of `name`, including values awaiting a deferred unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Like `get`, but treats an empty value as unset.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Sets `name` in the mirror. Cancels a pending unset of the same variable.
    pub fn set(&mut self, name: &str, value: &str) {
        self.cancel_unset(name);
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Marks `name` for removal at the next flush.
    pub fn schedule_unset(&mut self, name: &str) {
        if !self.pending_unsets.iter().any(|n| n == name) {
            self.pending_unsets.push(name.to_string());
        }
    }

    /// Drops a pending unset, if any.
    pub fn cancel_unset(&mut self, name: &str) {
        self.pending_unsets.retain(|n| n != name);
    }

    /// Variables awaiting removal, in scheduling order.
    pub fn pending_unsets(&self) -> &[String] {
        &self.pending_unsets
    }

    /// Removes every variable scheduled with `schedule_unset`.
    pub fn apply_deferred_unsets(&mut self) {
        for name in std::mem::take(&mut self.pending_unsets) {
            log::trace!("Applying deferred unset of '{}'", name);
            self.vars.remove(&name);
        }
    }

    /// Expands `$VAR` and `${VAR}` references against the mirror.
    /// Undefined references are left as they are.
    pub fn expand(&self, value: &str) -> String {
        shellexpand::env_with_context_no_errors(value, |name: &str| self.vars.get(name))
            .into_owned()
    }

    /// The entries of a path-list variable; empty when unset or empty.
    pub fn split_list(&self, name: &str) -> Vec<String> {
        match self.get_non_empty(name) {
            Some(value) => value
                .split(PATH_LIST_SEPARATOR)
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The value `name` would have with `segment` prepended.
    pub fn prepend_segment(&self, name: &str, segment: &str) -> String {
        match self.get_non_empty(name) {
            Some(current) => format!("{}{}{}", segment, PATH_LIST_SEPARATOR, current),
            None => segment.to_string(),
        }
    }

    /// The value `name` would have with the first occurrence of `segment` removed.
    /// Other occurrences are kept; a missing segment leaves the value unchanged.
    pub fn remove_segment(&self, name: &str, segment: &str) -> String {
        let mut entries = self.split_list(name);
        if let Some(pos) = entries.iter().position(|e| e == segment) {
            entries.remove(pos);
        }
        entries.join(&PATH_LIST_SEPARATOR.to_string())
    }

    /// All variables, for handing the converged environment to a child process.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep() -> String {
        PATH_LIST_SEPARATOR.to_string()
    }

    #[test]
    fn test_expand_known_and_unknown_references() {
        let env = Environment::from_vars([("ROOT", "/opt/gcc")]);
        assert_eq!(env.expand("$ROOT/bin"), "/opt/gcc/bin");
        assert_eq!(env.expand("${ROOT}/lib"), "/opt/gcc/lib");
        assert_eq!(env.expand("$MISSING/x"), "$MISSING/x");
    }

    #[test]
    fn test_prepend_to_unset_and_existing() {
        let env = Environment::from_vars([("P", "/usr/bin"), ("EMPTY", "")]);
        assert_eq!(env.prepend_segment("NOPE", "/a"), "/a");
        assert_eq!(env.prepend_segment("EMPTY", "/a"), "/a");
        assert_eq!(env.prepend_segment("P", "/a"), format!("/a{}/usr/bin", sep()));
    }

    #[test]
    fn test_remove_only_first_occurrence() {
        let value = ["/a", "/b", "/a"].join(&sep());
        let env = Environment::from_vars([("P", value)]);
        assert_eq!(env.remove_segment("P", "/a"), ["/b", "/a"].join(&sep()));
        assert_eq!(env.remove_segment("P", "/zzz"), ["/a", "/b", "/a"].join(&sep()));
        assert_eq!(env.remove_segment("UNSET", "/a"), "");
    }

    #[test]
    fn test_prepend_then_remove_round_trips() {
        let original = ["/usr/bin", "/bin"].join(&sep());
        let mut env = Environment::from_vars([("PATH", original.clone())]);
        let merged = env.prepend_segment("PATH", "/opt/x/bin");
        env.set("PATH", &merged);
        assert_eq!(env.remove_segment("PATH", "/opt/x/bin"), original);
    }

    #[test]
    fn test_deferred_unset_keeps_value_until_applied() {
        let mut env = Environment::from_vars([("GCC_ROOT", "/opt/gcc")]);
        env.schedule_unset("GCC_ROOT");
        assert_eq!(env.get("GCC_ROOT"), Some("/opt/gcc"));
        env.apply_deferred_unsets();
        assert_eq!(env.get("GCC_ROOT"), None);
        assert!(env.pending_unsets().is_empty());
    }

    #[test]
    fn test_set_cancels_pending_unset() {
        let mut env = Environment::from_vars([("GCC_ROOT", "/opt/gcc/4.8")]);
        env.schedule_unset("GCC_ROOT");
        env.set("GCC_ROOT", "/opt/gcc/5.0");
        env.apply_deferred_unsets();
        assert_eq!(env.get("GCC_ROOT"), Some("/opt/gcc/5.0"));
    }
}
