#![no_main]

use buildtap::config::ToolConfig;
use buildtap::{classify, Invocation};
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;

fuzz_target!(|data: &[u8]| {
    // First line: output spec, second line: option spec, rest: one token per line
    if let Ok(input) = std::str::from_utf8(data) {
        let mut lines = input.split('\n');
        let output_spec = lines.next().unwrap_or("");
        let option_spec = lines.next();
        let mut argv = vec!["tool".to_string()];
        argv.extend(lines.map(str::to_string));

        let config = ToolConfig::new("tool", output_spec, option_spec);
        let invocation = Invocation::new("tool", "tool", &argv, PathBuf::from("/fuzz"));
        // Must never panic, and a finished action never lists its output as a source
        if let Some(action) = classify(&invocation, &config).finish() {
            if let Some(output) = &action.output {
                assert!(!action.sources.contains(output));
            }
        }
    }
});
