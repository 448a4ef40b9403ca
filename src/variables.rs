//! Variable substitution for manifest strings
//!
//! Manifest values (tags, build args, paths, product versions) may contain
//! `$(...)` placeholders:
//!
//! - `$(System:TimeStamp)` - the run timestamp from [`RunContext`]
//! - `$(Repo:<id>)` - the name of the repo declared with that id
//! - `$(name)` - a user variable, taken from caller overrides first and then
//!   from the manifest's `variables`
//!
//! User variable values may contain placeholders themselves; those are
//! resolved recursively and cyclic definitions are rejected.
//!
//! ```
//! use std::collections::BTreeMap;
//! use image_builder::context::RunContext;
//! use image_builder::variables::VariableResolver;
//!
//! let context = RunContext::new();
//! let mut vars = BTreeMap::new();
//! vars.insert("base-url".to_string(), "mcr.example.com".to_string());
//! let resolver = VariableResolver::new(&context, vars, BTreeMap::new());
//! assert_eq!(
//!     resolver.substitute("$(base-url)/runtime").unwrap(),
//!     "mcr.example.com/runtime"
//! );
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::RunContext;
use crate::error::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(([^()]*)\)").expect("placeholder regex is valid"));

/// Built-in variable namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// `System:<name>`
    System,
    /// `Repo:<id>`
    Repo,
}

type BuiltinHandler = fn(&VariableResolver, &str) -> Option<String>;

/// Dispatch table for built-in namespaces
const BUILTINS: &[(&str, VariableType, BuiltinHandler)] = &[
    ("System", VariableType::System, resolve_system),
    ("Repo", VariableType::Repo, resolve_repo),
];

/// A parsed placeholder expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable<'a> {
    /// A `type:name` placeholder in a built-in namespace
    Builtin(VariableType, &'a str),
    /// A bare user variable name
    User(&'a str),
}

impl<'a> Variable<'a> {
    /// Parse the text between `$(` and `)`
    ///
    /// Returns `None` for a `type:` prefix that is not a built-in namespace.
    pub fn parse(expression: &'a str) -> Option<Self> {
        match expression.split_once(':') {
            Some((prefix, name)) => BUILTINS
                .iter()
                .find(|(key, _, _)| *key == prefix)
                .map(|(_, kind, _)| Variable::Builtin(*kind, name)),
            None => Some(Variable::User(expression)),
        }
    }
}

fn handler(kind: VariableType) -> BuiltinHandler {
    BUILTINS
        .iter()
        .find(|(_, candidate, _)| *candidate == kind)
        .map(|(_, _, handler)| *handler)
        .unwrap_or(resolve_nothing)
}

fn resolve_nothing(_: &VariableResolver, _: &str) -> Option<String> {
    None
}

fn resolve_system(resolver: &VariableResolver, name: &str) -> Option<String> {
    match name {
        "TimeStamp" => Some(resolver.timestamp.clone()),
        _ => None,
    }
}

fn resolve_repo(resolver: &VariableResolver, id: &str) -> Option<String> {
    resolver.repo_names.get(id).cloned()
}

/// Resolves `$(...)` placeholders against built-ins, overrides and manifest
/// variables.
#[derive(Debug, Clone)]
pub struct VariableResolver {
    timestamp: String,
    overrides: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
    repo_names: BTreeMap<String, String>,
}

impl VariableResolver {
    /// Create a resolver from manifest-declared variables and caller overrides
    pub fn new(
        context: &RunContext,
        variables: BTreeMap<String, String>,
        overrides: BTreeMap<String, String>,
    ) -> Self {
        Self {
            timestamp: context.timestamp().to_string(),
            overrides,
            variables,
            repo_names: BTreeMap::new(),
        }
    }

    /// Register the repos addressable through `$(Repo:<id>)`
    pub fn with_repo_names(mut self, repo_names: BTreeMap<String, String>) -> Self {
        self.repo_names = repo_names;
        self
    }

    /// Replace every placeholder in `input`
    pub fn substitute(&self, input: &str) -> Result<String> {
        self.substitute_with_chain(input, &mut Vec::new())
    }

    /// Substitute an optional value
    pub fn substitute_opt(&self, input: Option<&str>) -> Result<Option<String>> {
        input.map(|value| self.substitute(value)).transpose()
    }

    fn substitute_with_chain(&self, input: &str, chain: &mut Vec<String>) -> Result<String> {
        if !input.contains("$(") {
            return Ok(input.to_string());
        }

        let mut failure = None;
        let output = PLACEHOLDER.replace_all(input, |caps: &Captures| {
            if failure.is_some() {
                return String::new();
            }
            match self.resolve(&caps[0], &caps[1], chain) {
                Ok(value) => value,
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(output.into_owned()),
        }
    }

    fn resolve(&self, placeholder: &str, expression: &str, chain: &mut Vec<String>) -> Result<String> {
        let unresolved = |chain: &[String]| Error::UnresolvedVariable {
            placeholder: placeholder.to_string(),
            chain: (!chain.is_empty()).then(|| chain.join(" -> ")),
        };

        match Variable::parse(expression) {
            Some(Variable::Builtin(kind, name)) => {
                handler(kind)(self, name).ok_or_else(|| unresolved(chain))
            }
            Some(Variable::User(name)) => {
                if chain.iter().any(|seen| seen == name) {
                    chain.push(name.to_string());
                    let error = unresolved(chain);
                    chain.pop();
                    return Err(error);
                }
                let raw = self
                    .overrides
                    .get(name)
                    .or_else(|| self.variables.get(name))
                    .ok_or_else(|| unresolved(chain))?;

                chain.push(name.to_string());
                let resolved = self.substitute_with_chain(raw, chain);
                chain.pop();
                resolved
            }
            None => Err(unresolved(chain)),
        }
    }
}
