//! Per-tool classification rules read from the environment
//!
//! Two variables configure a tool, both keyed by [`tool_key`]:
//!
//! - `CC_LOGGER_OUTPUT_ARG_<KEY>`: its presence enables custom classification
//!   for the tool, its value says how the output is named. Either a
//!   colon-separated list of flag prefixes (`-o:--output`) or a positional
//!   specifier `$N` (`$1` = first source, `$-1` = last source).
//! - `CC_LOGGER_OPTION_ARG_<KEY>`: colon-separated list of flags whose next
//!   token is an opaque value (`-I:-D:-include`).
//!
//! The output variable doubles as the on/off switch. Deployed build setups
//! export only that one variable per tool, so the two roles stay merged.

use crate::tool_key::tool_key;

/// Prefix of the variable that enables a tool and names its output flags
pub const OUTPUT_ENV_PREFIX: &str = "CC_LOGGER_OUTPUT_ARG_";

/// Prefix of the variable listing flags followed by an opaque value
pub const OPTION_ENV_PREFIX: &str = "CC_LOGGER_OPTION_ARG_";

const LIST_SEPARATOR: char = ':';

/// How a token relates to a prefix list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatch {
    /// Token is exactly one of the prefixes (`-o`)
    Exact,
    /// Token is a prefix followed by `=` (`--output=a.out`); `prefix_len` is
    /// the byte length of the matched prefix
    Inline { prefix_len: usize },
    /// Token starts with a prefix but continues with something else (`-ofoo`)
    Attached,
}

/// Ordered list of literal flag prefixes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixList {
    prefixes: Vec<String>,
}

impl PrefixList {
    /// Parse a colon-separated list; empty entries are skipped
    pub fn parse(spec: &str) -> Self {
        let prefixes = spec
            .split(LIST_SEPARATOR)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        Self { prefixes }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    /// Match a token against the list.
    ///
    /// An exact or `=` match on any prefix wins over an attached match on an
    /// earlier one, so `-o:-output` still recognizes `-output` as exact.
    pub fn match_token(&self, token: &str) -> Option<PrefixMatch> {
        let mut attached = false;
        for prefix in &self.prefixes {
            let Some(rest) = token.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if rest.is_empty() {
                return Some(PrefixMatch::Exact);
            }
            if rest.starts_with('=') {
                return Some(PrefixMatch::Inline {
                    prefix_len: prefix.len(),
                });
            }
            attached = true;
        }
        attached.then_some(PrefixMatch::Attached)
    }
}

/// Where the output of an invocation is found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRule {
    /// Output follows (or is `=`-attached to) one of these flags
    Prefixes(PrefixList),
    /// Output is the Nth source (1-based), or counted from the end when
    /// negative. Zero disables the rule.
    Positional(i64),
}

impl OutputRule {
    /// Parse an output specifier.
    ///
    /// A value starting with `$` is positional; when the rest is not an
    /// integer the rule is disabled instead of rejected.
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('$') {
            Some(index) => Self::Positional(index.trim().parse().unwrap_or(0)),
            None => Self::Prefixes(PrefixList::parse(spec)),
        }
    }

    /// Prefix list to match tokens against, if this is the prefix form
    pub fn prefixes(&self) -> Option<&PrefixList> {
        match self {
            Self::Prefixes(list) => Some(list),
            Self::Positional(_) => None,
        }
    }

    /// Positional index, if this is the `$N` form with a usable `N`
    pub fn position(&self) -> Option<i64> {
        match self {
            Self::Positional(n) if *n != 0 => Some(*n),
            _ => None,
        }
    }
}

/// Classification rules for one tool, fixed for the duration of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Normalized key the rules were read under
    pub key: String,
    /// How the output is identified
    pub output: OutputRule,
    /// Flags whose next token is passed through unexamined
    pub options: PrefixList,
}

impl ToolConfig {
    /// Build a config directly from spec strings
    pub fn new(tool_name: &str, output_spec: &str, option_spec: Option<&str>) -> Self {
        Self {
            key: tool_key(tool_name),
            output: OutputRule::parse(output_spec),
            options: option_spec.map(PrefixList::parse).unwrap_or_default(),
        }
    }

    /// Resolve the rules for `tool_name` through a variable lookup.
    ///
    /// Returns `None` when the output variable is absent: the tool is not
    /// subject to custom classification.
    pub fn resolve<F>(tool_name: &str, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let output_spec = lookup(&output_var(tool_name))?;
        let option_spec = lookup(&option_var(tool_name));
        Some(Self::new(tool_name, &output_spec, option_spec.as_deref()))
    }

    /// Resolve the rules for `tool_name` from the process environment
    pub fn from_env(tool_name: &str) -> Option<Self> {
        Self::resolve(tool_name, |name| {
            std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
        })
    }
}

/// Name of the variable enabling `tool_name` and carrying its output spec
pub fn output_var(tool_name: &str) -> String {
    format!("{}{}", OUTPUT_ENV_PREFIX, tool_key(tool_name))
}

/// Name of the variable carrying the opaque-value flags of `tool_name`
pub fn option_var(tool_name: &str) -> String {
    format!("{}{}", OPTION_ENV_PREFIX, tool_key(tool_name))
}
