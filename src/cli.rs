//! CLI argument parsing for Buildtap

use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Output format for classified actions printed to stdout
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "buildtap")]
#[command(version)]
#[command(about = "Classify a build tool invocation into sources, output and arguments", long_about = None)]
pub struct Cli {
    /// Logical tool name used for rule lookup (defaults to the program's file name)
    #[arg(long = "tool", value_name = "NAME")]
    pub tool: Option<String>,

    /// Append actions to this compilation-database style log instead of printing them
    #[arg(short = 'l', long = "log", value_name = "FILE", env = "CC_LOGGER_FILE")]
    pub log: Option<PathBuf>,

    /// Output format (text or json) when no log is given
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with [[tool]] rules exported as CC_LOGGER_* variables
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Run the command after classifying it and exit with its status
    #[arg(short = 'x', long = "exec")]
    pub exec: bool,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Command to classify (everything after --)
    #[arg(last = true)]
    pub command: Option<Vec<OsString>>,
}

impl Cli {
    /// Tool name for rule lookup: `--tool`, else the program's file name
    pub fn tool_name(&self) -> Option<String> {
        if let Some(tool) = &self.tool {
            return Some(tool.clone());
        }
        let program = self.command.as_ref()?.first()?;
        let name = Path::new(program).file_name().unwrap_or(program.as_os_str());
        Some(name.to_string_lossy().into_owned())
    }

    /// The command as UTF-8 strings for classification; invalid sequences
    /// become U+FFFD
    pub fn command_lossy(&self) -> Vec<String> {
        self.command
            .iter()
            .flatten()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}
