//! Argument classification state machine
//!
//! Walks an invocation's argument list once, tagging each token as a source,
//! an output, a flag, or the opaque value of a flag, and feeds the results
//! into an [`ActionBuilder`].
//!
//! ```text
//!            option flag              output flag
//! InOptionArg <────────── Normal ──────────> InOutputArg
//!      │                  ▲  ▲                    │
//!      └── any token ─────┘  └───── any token ────┘
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::action::ActionBuilder;
use crate::config::{PrefixMatch, ToolConfig};
use crate::path_resolver::{make_absolute, resolve_executable};

/// Longest token kept, in bytes (`PATH_MAX` on Linux). Longer tokens are cut
/// at the last character boundary that fits.
pub const MAX_TOKEN_LEN: usize = 4096;

/// Leading character of a flag
pub const FLAG_PREFIX: char = '-';

/// Scanner state between two tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgState {
    #[default]
    Normal,
    /// Previous token was an output flag; this token names the output
    InOutputArg,
    /// Previous token was an opaque-value flag; this token is its value
    InOptionArg,
}

/// What a single token turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Flag whose next token is an opaque value (`-I`)
    OptionFlag,
    /// Flag whose next token is the output (`-o`)
    OutputFlag,
    /// Output flag with attached value (`--output=a.out`)
    InlineOutput { prefix_len: usize },
    /// Value following an output flag
    OutputValue,
    /// Input file candidate
    Source,
    /// Anything kept verbatim without further meaning
    Passthrough,
}

/// One intercepted invocation
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// Program path as it was invoked (`argv[0]` or the exec path)
    pub program: &'a str,
    /// Logical tool name the configuration is keyed by
    pub tool_name: &'a str,
    /// Full argument vector; position 0 is the program itself
    pub argv: &'a [String],
    /// Directory the program and relative path tokens are resolved against
    pub cwd: PathBuf,
    /// `PATH`-style list searched when the program cannot be canonicalized
    pub search_path: Option<OsString>,
}

impl<'a> Invocation<'a> {
    /// Invocation searching the process `PATH` for its executable
    pub fn new(program: &'a str, tool_name: &'a str, argv: &'a [String], cwd: PathBuf) -> Self {
        Self {
            program,
            tool_name,
            argv,
            cwd,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Replace the executable search path; `None` disables the search
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Invocation running in the current working directory.
    ///
    /// If the working directory cannot be read, relative tokens stay relative.
    pub fn in_current_dir(program: &'a str, tool_name: &'a str, argv: &'a [String]) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!("cannot read working directory: {}", e);
            PathBuf::new()
        });
        Self::new(program, tool_name, argv, cwd)
    }
}

/// Transition function: classify `token` in `state`.
///
/// Opaque-value flags are checked before output flags, so a token listed in
/// both behaves as an opaque-value flag.
pub fn step(state: ArgState, token: &str, config: &ToolConfig) -> (TokenClass, ArgState) {
    match state {
        ArgState::InOptionArg => (TokenClass::Passthrough, ArgState::Normal),
        ArgState::InOutputArg => (TokenClass::OutputValue, ArgState::Normal),
        ArgState::Normal => step_normal(token, config),
    }
}

fn step_normal(token: &str, config: &ToolConfig) -> (TokenClass, ArgState) {
    if config.options.match_token(token) == Some(PrefixMatch::Exact) {
        return (TokenClass::OptionFlag, ArgState::InOptionArg);
    }

    if let Some(prefixes) = config.output.prefixes() {
        match prefixes.match_token(token) {
            Some(PrefixMatch::Exact) => return (TokenClass::OutputFlag, ArgState::InOutputArg),
            Some(PrefixMatch::Inline { prefix_len }) => {
                return (TokenClass::InlineOutput { prefix_len }, ArgState::Normal)
            }
            Some(PrefixMatch::Attached) => return (TokenClass::Passthrough, ArgState::Normal),
            None => {}
        }
    }

    if token.starts_with(FLAG_PREFIX) {
        (TokenClass::Passthrough, ArgState::Normal)
    } else {
        (TokenClass::Source, ArgState::Normal)
    }
}

/// Cut a token to [`MAX_TOKEN_LEN`] bytes without splitting a character
pub fn truncate_token(token: &str) -> &str {
    if token.len() <= MAX_TOKEN_LEN {
        return token;
    }
    let mut end = MAX_TOKEN_LEN;
    while !token.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(
        len = token.len(),
        kept = end,
        "argument longer than {} bytes truncated",
        MAX_TOKEN_LEN
    );
    &token[..end]
}

/// Scan an invocation with the given rules.
///
/// Returns the builder before reconciliation; call
/// [`ActionBuilder::finish`] to obtain the action.
pub fn classify(invocation: &Invocation<'_>, config: &ToolConfig) -> ActionBuilder {
    let executable = resolve_executable(
        invocation.program,
        invocation.tool_name,
        &invocation.cwd,
        invocation.search_path.as_deref(),
    );
    let mut builder = ActionBuilder::new(invocation.tool_name, executable);
    let position = config.output.position();
    let mut state = ArgState::Normal;

    for raw in invocation.argv.iter().skip(1) {
        let token = truncate_token(raw);
        let (class, next) = step(state, token, config);
        tracing::trace!(token, ?state, ?class, "classified argument");
        apply(&mut builder, class, token, &invocation.cwd, position);
        state = next;
    }

    if let Some(n) = position.filter(|n| *n < 0) {
        select_output_from_end(&mut builder, n);
    }

    tracing::debug!(
        tool = invocation.tool_name,
        sources = builder.sources().len(),
        output = ?builder.output(),
        "scanned invocation"
    );
    builder
}

fn apply(
    builder: &mut ActionBuilder,
    class: TokenClass,
    token: &str,
    cwd: &Path,
    position: Option<i64>,
) {
    match class {
        TokenClass::OptionFlag | TokenClass::OutputFlag | TokenClass::Passthrough => {
            if !token.is_empty() {
                builder.push_argument(token.to_string());
            }
        }
        TokenClass::InlineOutput { prefix_len } => {
            // Keep the flag and its `=`, swap the value for its absolute form
            let (flag, value) = token.split_at(prefix_len + 1);
            match make_absolute(value, cwd) {
                Some(path) => {
                    builder.set_output(&path);
                    builder.push_argument(format!("{}{}", flag, path));
                }
                None => builder.push_argument(token.to_string()),
            }
        }
        TokenClass::OutputValue => {
            if let Some(path) = make_absolute(token, cwd) {
                builder.set_output(&path);
                builder.push_argument(path);
            }
        }
        TokenClass::Source => {
            if let Some(path) = make_absolute(token, cwd) {
                if let Some(count) = builder.add_source(&path) {
                    if position == Some(count as i64) {
                        builder.set_output(&path);
                    }
                }
                builder.push_argument(path);
            }
        }
    }
}

/// `$-N`: the output is the Nth source counted from the end
fn select_output_from_end(builder: &mut ActionBuilder, n: i64) {
    let pos = n + builder.sources().len() as i64;
    if pos < 0 {
        return;
    }
    if let Some(path) = builder.sources().get(pos as usize).cloned() {
        builder.set_output(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(output: &str, options: Option<&str>) -> ToolConfig {
        ToolConfig::new("tool", output, options)
    }

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn scan(config: &ToolConfig, args: &[&str]) -> ActionBuilder {
        let argv = argv(args);
        let invocation = Invocation::new("/no/such/tool", "tool", &argv, PathBuf::from("/work"))
            .with_search_path(None);
        classify(&invocation, config)
    }

    #[test]
    fn test_step_pending_states_return_to_normal() {
        let config = cfg("-o", Some("-I"));
        assert_eq!(
            step(ArgState::InOptionArg, "-o", &config),
            (TokenClass::Passthrough, ArgState::Normal)
        );
        assert_eq!(
            step(ArgState::InOutputArg, "-I", &config),
            (TokenClass::OutputValue, ArgState::Normal)
        );
    }

    #[test]
    fn test_step_normal_transitions() {
        let config = cfg("-o:--output", Some("-I"));
        let normal = ArgState::Normal;
        assert_eq!(
            step(normal, "-I", &config),
            (TokenClass::OptionFlag, ArgState::InOptionArg)
        );
        assert_eq!(
            step(normal, "-o", &config),
            (TokenClass::OutputFlag, ArgState::InOutputArg)
        );
        assert_eq!(
            step(normal, "--output=a", &config),
            (TokenClass::InlineOutput { prefix_len: 8 }, ArgState::Normal)
        );
        assert_eq!(step(normal, "main.c", &config), (TokenClass::Source, normal));
        assert_eq!(step(normal, "-c", &config), (TokenClass::Passthrough, normal));
        assert_eq!(step(normal, "-ofoo", &config), (TokenClass::Passthrough, normal));
    }

    #[test]
    fn test_option_flag_wins_over_output_flag() {
        let config = cfg("-x", Some("-x"));
        assert_eq!(
            step(ArgState::Normal, "-x", &config),
            (TokenClass::OptionFlag, ArgState::InOptionArg)
        );
    }

    #[test]
    fn test_positional_spec_never_prefix_matches() {
        let config = cfg("$1", None);
        assert_eq!(
            step(ArgState::Normal, "$1", &config),
            (TokenClass::Source, ArgState::Normal)
        );
    }

    #[test]
    fn test_separate_output_flag() {
        let b = scan(&cfg("-o", None), &["cc", "-c", "a.c", "-o", "out/a.o"]);
        assert_eq!(b.output(), Some("/work/out/a.o"));
        assert_eq!(b.sources(), ["/work/a.c"]);
    }

    #[test]
    fn test_inline_output_rewrites_value() {
        let b = scan(&cfg("--output", None), &["tool", "--output=a.bin", "in.txt"]);
        let action = b.finish().unwrap();
        assert_eq!(action.output.as_deref(), Some("/work/a.bin"));
        assert_eq!(action.arguments[1], "--output=/work/a.bin");
        assert_eq!(action.arguments[2], "/work/in.txt");
    }

    #[test]
    fn test_inline_output_with_empty_value_is_kept_verbatim() {
        let b = scan(&cfg("--output", None), &["tool", "--output=", "in.txt"]);
        assert_eq!(b.output(), None);
        let action = b.finish().unwrap();
        assert_eq!(action.arguments[1], "--output=");
    }

    #[test]
    fn test_option_value_is_never_a_source() {
        let b = scan(
            &cfg("-o", Some("-I:-include")),
            &["cc", "-I", "inc", "-include", "pre.h", "main.c"],
        );
        assert_eq!(b.sources(), ["/work/main.c"]);
        let action = b.finish().unwrap();
        assert_eq!(
            action.arguments,
            vec![
                action.executable.as_str(),
                "-I",
                "inc",
                "-include",
                "pre.h",
                "/work/main.c",
            ]
        );
    }

    #[test]
    fn test_positional_output_from_front() {
        let b = scan(&cfg("$2", None), &["ar", "a.o", "lib.a", "b.o"]);
        let action = b.finish().unwrap();
        assert_eq!(action.output.as_deref(), Some("/work/lib.a"));
        assert_eq!(action.sources, vec!["/work/a.o", "/work/b.o"]);
    }

    #[test]
    fn test_positional_output_counts_unique_sources() {
        let b = scan(&cfg("$2", None), &["tool", "a", "a", "b"]);
        assert_eq!(b.output(), Some("/work/b"));
    }

    #[test]
    fn test_negative_position_out_of_range_leaves_output_unset() {
        let b = scan(&cfg("$-3", None), &["tool", "a", "b"]);
        assert_eq!(b.output(), None);
        assert_eq!(b.sources().len(), 2);
    }

    #[test]
    fn test_positional_beyond_source_count_leaves_output_unset() {
        let b = scan(&cfg("$5", None), &["tool", "a", "b"]);
        assert_eq!(b.output(), None);
    }

    #[test]
    fn test_malformed_position_disables_rule() {
        let b = scan(&cfg("$abc", None), &["tool", "a", "b"]);
        assert_eq!(b.output(), None);
        assert_eq!(b.sources().len(), 2);
    }

    #[test]
    fn test_trailing_output_flag_without_value() {
        let b = scan(&cfg("-o", None), &["cc", "a.c", "-o"]);
        assert_eq!(b.output(), None);
        assert_eq!(b.sources(), ["/work/a.c"]);
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        let b = scan(&cfg("-o", None), &["cc", "", "a.c"]);
        let action = b.finish().unwrap();
        assert_eq!(action.arguments.len(), 2);
        assert_eq!(action.sources, vec!["/work/a.c"]);
    }

    #[test]
    fn test_relative_program_resolves_in_invocation_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mycc"), b"").unwrap();
        let expected = std::fs::canonicalize(dir.path().join("mycc")).unwrap();

        let argv = argv(&["./mycc", "a.c"]);
        let invocation = Invocation::new("./mycc", "mycc", &argv, dir.path().to_path_buf());
        let action = classify(&invocation, &cfg("-o", None)).finish().unwrap();
        assert_eq!(action.executable, expected.to_string_lossy());
        assert_eq!(action.arguments[0], action.executable);
    }

    #[test]
    fn test_search_path_comes_from_invocation() {
        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("mycc"), b"").unwrap();

        let argv = argv(&["mycc", "a.c"]);
        let invocation = Invocation::new("mycc", "mycc", &argv, PathBuf::from("/no/such/dir"))
            .with_search_path(Some(bin.path().as_os_str().to_os_string()));
        let builder = classify(&invocation, &cfg("-o", None));
        let action = builder.finish().unwrap();
        assert_eq!(action.executable, bin.path().join("mycc").to_string_lossy());
    }

    #[test]
    fn test_truncate_token_respects_char_boundary() {
        let short = "a.c";
        assert_eq!(truncate_token(short), short);

        let long = format!("{}é", "x".repeat(MAX_TOKEN_LEN - 1));
        let cut = truncate_token(&long);
        assert_eq!(cut.len(), MAX_TOKEN_LEN - 1);
        assert!(cut.chars().all(|c| c == 'x'));
    }

    #[test]
    fn test_overlong_source_is_truncated_not_dropped() {
        let name = "s".repeat(MAX_TOKEN_LEN * 2);
        let b = scan(&cfg("-o", None), &["cc", &name]);
        assert_eq!(b.sources().len(), 1);
        assert_eq!(b.sources()[0], format!("/work/{}", "s".repeat(MAX_TOKEN_LEN)));
    }
}
