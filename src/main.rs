use anyhow::{Context, Result};
use buildtap::action_log::ActionLog;
use buildtap::cli::{Cli, OutputFormat};
use buildtap::config::output_var;
use buildtap::rules::ToolRules;
use buildtap::Action;
use clap::Parser;
use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Write classified actions to the log, or print them
fn report(args: &Cli, actions: &[Action]) -> Result<()> {
    if let Some(path) = &args.log {
        let cwd = std::env::current_dir().context("Failed to read working directory")?;
        ActionLog::open(path)
            .append(actions, &cwd)
            .with_context(|| format!("Failed to append to action log {}", path.display()))?;
        return Ok(());
    }

    for action in actions {
        match args.format {
            OutputFormat::Text => println!("{}", action),
            OutputFormat::Json => println!("{}", action.to_json()?),
        }
    }
    Ok(())
}

/// Run the classified command, returning its exit code
fn run_command(program: &OsString, args: &[OsString]) -> Result<i32> {
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to exec {}", program.to_string_lossy()))?;
    Ok(status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0)))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let command = args.command.as_deref().unwrap_or_default();
    let (Some((program, program_args)), Some(tool_name)) =
        (command.split_first(), args.tool_name())
    else {
        anyhow::bail!("Must specify a command. Usage: buildtap [OPTIONS] -- PROGRAM [ARGS...]");
    };
    let argv = args.command_lossy();

    // Rules only fill in tools the environment does not configure yet
    if let Some(path) = &args.rules {
        let rules = ToolRules::from_file(path)
            .with_context(|| format!("Failed to load rules file {}", path.display()))?;
        let exported = rules.export_env();
        tracing::debug!(exported, total = rules.len(), "exported tool rules");
    }

    let mut actions = Vec::new();
    if buildtap::collect_actions(&argv[0], &tool_name, &argv, &mut actions) {
        if let Err(e) = report(&args, &actions) {
            if !args.exec {
                return Err(e);
            }
            // Log failures never block the wrapped command
            tracing::warn!("action not logged: {:#}", e);
            eprintln!("[buildtap: action not logged: {:#}]", e);
        }
    } else {
        eprintln!(
            "[buildtap: no rules for '{}' (set {}), nothing classified]",
            tool_name,
            output_var(&tool_name)
        );
    }

    if args.exec {
        let code = run_command(program, program_args)?;
        std::process::exit(code);
    }

    Ok(())
}
