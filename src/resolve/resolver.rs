//! Recursive `{name}` substitution with cycle detection.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Context key bound to the generation response while resolving an output template.
pub const RESPONSE: &str = "RESPONSE";

/// Names that only ever resolve from a [`Context`] and can never name a variable.
pub const RESERVED_NAMES: &[&str] = &[RESPONSE];

/// Run-time values for a single resolution. Substituted literally.
pub type Context = HashMap<String, String>;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Invalid placeholder regex"));

/// Error type for resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A variable referenced itself, directly or through other variables.
    ///
    /// `chain` runs from the first revisited name to the point of detection
    /// and ends with the revisited name, e.g. `A -> B -> A`.
    #[error("circular variable reference: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// Expansion went deeper than the number of known names.
    #[error("variable reference too deep: {}", .chain.join(" -> "))]
    ExcessiveDepth { chain: Vec<String> },
}

impl ResolveError {
    /// The names involved in the failed expansion.
    pub fn chain(&self) -> &[String] {
        match self {
            ResolveError::CircularReference { chain } | ResolveError::ExcessiveDepth { chain } => {
                chain
            }
        }
    }
}

/// Returns true if `name` is reserved for run-time context values.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Build the context used for output templates.
pub fn response_context(response: impl Into<String>) -> Context {
    let mut ctx = Context::new();
    ctx.insert(RESPONSE.to_string(), response.into());
    ctx
}

/// List the placeholder names referenced in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Resolves placeholders against a snapshot of the variable store.
///
/// The snapshot is taken once in [`Resolver::new`]; later edits to the
/// caller's variables do not affect this resolver.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    variables: HashMap<String, String>,
}

impl Resolver {
    /// Snapshot a set of `(name, value)` pairs.
    ///
    /// Pairs whose name is reserved are dropped: reserved names only ever
    /// resolve from a context.
    pub fn new<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let variables = variables
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !is_reserved(k))
            .collect();
        Self { variables }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolve `text` against variables only.
    pub fn resolve(&self, text: &str) -> Result<String, ResolveError> {
        self.resolve_with_context(text, &Context::new())
    }

    /// Resolve `text` with run-time context values taking precedence over variables.
    pub fn resolve_with_context(
        &self,
        text: &str,
        context: &Context,
    ) -> Result<String, ResolveError> {
        let limit = self.distinct_names(context);
        self.expand(text, context, &[], limit)
    }

    fn distinct_names(&self, context: &Context) -> usize {
        self.variables.len()
            + context
                .keys()
                .filter(|k| !self.variables.contains_key(*k))
                .count()
    }

    /// One expansion frame. `chain` holds the variables currently being
    /// expanded by the enclosing frames; each frame extends its own copy.
    pub(super) fn expand(
        &self,
        text: &str,
        context: &Context,
        chain: &[String],
        limit: usize,
    ) -> Result<String, ResolveError> {
        if chain.len() > limit {
            return Err(ResolveError::ExcessiveDepth {
                chain: chain.to_vec(),
            });
        }

        let matches: Vec<_> = PLACEHOLDER_REGEX.captures_iter(text).collect();
        let mut resolved = text.to_string();

        // Right to left so earlier match ranges stay valid after splicing.
        for caps in matches.iter().rev() {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();

            let replacement = if let Some(value) = context.get(name) {
                value.clone()
            } else if let Some(raw) = self.variables.get(name) {
                if let Some(pos) = chain.iter().position(|n| n == name) {
                    let mut cycle = chain[pos..].to_vec();
                    cycle.push(name.to_string());
                    return Err(ResolveError::CircularReference { chain: cycle });
                }
                let mut next = chain.to_vec();
                next.push(name.to_string());
                self.expand(raw, context, &next, limit)?
            } else {
                continue;
            };

            resolved.replace_range(whole.range(), &replacement);
        }

        Ok(resolved)
    }
}
