//! Build action record and its builder
//!
//! An [`Action`] describes one tool invocation: which executable ran, the
//! normalized argument list, the files it read and the file it produced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One classified tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Logical tool name (what the configuration was looked up by)
    pub tool_name: String,
    /// Best-effort absolute path of the executable
    pub executable: String,
    /// Full argument list, `arguments[0]` is the executable
    pub arguments: Vec<String>,
    /// Input files, in first-seen order, without duplicates
    pub sources: Vec<String>,
    /// Produced file, if one was identified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Action {
    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.tool_name, self.executable)?;
        for source in &self.sources {
            writeln!(f, "  < {}", source)?;
        }
        if let Some(output) = &self.output {
            writeln!(f, "  > {}", output)?;
        }
        write!(f, "  $ {}", self.arguments.join(" "))
    }
}

/// Accumulates classification results for one invocation
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    action: Action,
}

impl ActionBuilder {
    /// Start an action; the executable becomes the first argument
    pub fn new(tool_name: &str, executable: String) -> Self {
        Self {
            action: Action {
                tool_name: tool_name.to_string(),
                arguments: vec![executable.clone()],
                executable,
                sources: Vec::new(),
                output: None,
            },
        }
    }

    pub fn push_argument(&mut self, argument: String) {
        self.action.arguments.push(argument);
    }

    /// Add a source unless an identical path is already present.
    ///
    /// Returns the 1-based number of sources after insertion when the path is
    /// new, `None` for a duplicate.
    pub fn add_source(&mut self, path: &str) -> Option<usize> {
        if self.action.sources.iter().any(|s| s == path) {
            return None;
        }
        self.action.sources.push(path.to_string());
        Some(self.action.sources.len())
    }

    /// Record the output; a later call replaces an earlier one
    pub fn set_output(&mut self, path: &str) {
        self.action.output = Some(path.to_string());
    }

    pub fn sources(&self) -> &[String] {
        &self.action.sources
    }

    pub fn output(&self) -> Option<&str> {
        self.action.output.as_deref()
    }

    /// Reconcile and hand out the action.
    ///
    /// The output is dropped from the sources (flags like `-MT out.o` make the
    /// output look like an input too). An action without sources carries no
    /// build information and yields `None`.
    pub fn finish(mut self) -> Option<Action> {
        if let Some(output) = &self.action.output {
            if let Some(index) = self.action.sources.iter().position(|s| s == output) {
                self.action.sources.remove(index);
            }
        }

        if self.action.sources.is_empty() {
            tracing::debug!(
                tool = %self.action.tool_name,
                "no sources after reconciliation, dropping action"
            );
            return None;
        }
        Some(self.action)
    }
}
