//! Buildtap - configurable classifier for intercepted build tool invocations
//!
//! This library turns one invocation of an arbitrary build tool into an
//! [`Action`]: the resolved executable, the normalized argument list, the
//! files it read and the file it produced. The argument grammar of each tool
//! comes from `CC_LOGGER_*` environment variables, see [`config`].

pub mod action;
pub mod action_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod path_resolver;
pub mod rules;
pub mod tool_key;

pub use action::{Action, ActionBuilder};
pub use classifier::{classify, Invocation};
pub use config::ToolConfig;
pub use error::{Error, Result};

/// Classify one invocation using the process environment and working
/// directory.
///
/// Returns `true` when the tool has custom rules configured, whether or not an
/// action came out of it; zero or one action is pushed onto `actions`. On
/// `false` nothing is touched and the caller should use another classifier.
pub fn collect_actions(
    program: &str,
    tool_name: &str,
    argv: &[String],
    actions: &mut Vec<Action>,
) -> bool {
    let Some(config) = ToolConfig::from_env(tool_name) else {
        tracing::debug!(tool_name, "no custom rules configured");
        return false;
    };
    let invocation = Invocation::in_current_dir(program, tool_name, argv);
    collect_with_config(&invocation, &config, actions);
    true
}

/// Classify one invocation, reading configuration through `lookup`.
///
/// The program is resolved against `invocation.cwd` and searched for in
/// `invocation.search_path` rather than the process working directory.
pub fn collect_actions_with<F>(
    invocation: &Invocation<'_>,
    lookup: F,
    actions: &mut Vec<Action>,
) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match ToolConfig::resolve(invocation.tool_name, lookup) {
        Some(config) => {
            collect_with_config(invocation, &config, actions);
            true
        }
        None => false,
    }
}

fn collect_with_config(
    invocation: &Invocation<'_>,
    config: &ToolConfig,
    actions: &mut Vec<Action>,
) {
    if let Some(action) = classify(invocation, config).finish() {
        actions.push(action);
    }
}
