//! Tool rules loaded from a TOML file
//!
//! A rules file is a convenient way to seed the `CC_LOGGER_*` variables for a
//! whole toolchain at once. Rules are exported into the process environment,
//! which stays the only place classification reads its configuration from.
//!
//! # Example TOML
//! ```toml
//! [[tool]]
//! name = "arm-none-eabi-gcc"
//! output = "-o"
//! options = "-I:-D:-include"
//!
//! [[tool]]
//! name = "ar"
//! output = "$1"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::{option_var, output_var};
use crate::error::{Error, Result};
use crate::tool_key::tool_key;

/// Rules for one tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolRule {
    /// Tool name as it will be looked up
    pub name: String,
    /// Output spec: `-o:--output` or `$N`
    pub output: String,
    /// Opaque-value flags, colon-separated
    #[serde(default)]
    pub options: Option<String>,
}

/// All rules of a rules file
#[derive(Debug, Clone, Default)]
pub struct ToolRules {
    tools: Vec<ToolRule>,
}

impl ToolRules {
    /// Load rules from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse rules from TOML text.
    ///
    /// # Errors
    /// Invalid TOML, an empty tool name or output spec, or two tools that map
    /// to the same configuration key.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct RulesFile {
            #[serde(default)]
            tool: Vec<ToolRule>,
        }

        let file: RulesFile = toml::from_str(content)?;

        let mut seen: HashMap<String, String> = HashMap::new();
        for rule in &file.tool {
            if rule.name.is_empty() {
                return Err(Error::InvalidRules("tool with empty name".to_string()));
            }
            if rule.output.is_empty() {
                return Err(Error::InvalidRules(format!(
                    "tool '{}' has an empty output spec",
                    rule.name
                )));
            }
            if let Some(existing) = seen.insert(tool_key(&rule.name), rule.name.clone()) {
                return Err(Error::InvalidRules(format!(
                    "tools '{}' and '{}' share configuration key {}",
                    existing,
                    rule.name,
                    tool_key(&rule.name)
                )));
            }
        }

        Ok(Self { tools: file.tool })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Rule for a tool name, compared by configuration key
    pub fn get(&self, tool_name: &str) -> Option<&ToolRule> {
        let key = tool_key(tool_name);
        self.tools.iter().find(|rule| tool_key(&rule.name) == key)
    }

    /// Variables a rule translates into
    pub fn env_vars(rule: &ToolRule) -> Vec<(String, String)> {
        let mut vars = vec![(output_var(&rule.name), rule.output.clone())];
        if let Some(options) = &rule.options {
            vars.push((option_var(&rule.name), options.clone()));
        }
        vars
    }

    /// Export the rules into the process environment.
    ///
    /// Tools already enabled in the environment keep their settings entirely;
    /// returns how many tools were exported.
    pub fn export_env(&self) -> usize {
        let mut exported = 0;
        for rule in &self.tools {
            if std::env::var_os(output_var(&rule.name)).is_some() {
                tracing::debug!(tool = %rule.name, "already configured in environment, keeping it");
                continue;
            }
            for (name, value) in Self::env_vars(rule) {
                std::env::set_var(name, value);
            }
            exported += 1;
        }
        exported
    }
}
